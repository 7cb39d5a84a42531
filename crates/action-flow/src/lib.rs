//! Plan matching, action execution and run orchestration.
//!
//! [`AgentRunner`] validates a [`RunRequest`], captures the page through a
//! [`BrowserPort`], labels it, and drives the task's plan through the
//! [`PlanExecutor`] state machine. Everything after validation ends in a
//! structured [`RunResult`].

pub mod errors;
pub mod executor;
pub mod matcher;
pub mod metrics;
pub mod ports;
pub mod runner;
pub mod types;

pub use errors::{BrowserError, FlowError};
pub use executor::{error_screenshot_name, ExecutionOptions, Phase, PlanExecutor};
pub use matcher::{best_match, is_usable, usable_labels};
pub use ports::BrowserPort;
pub use runner::AgentRunner;
pub use types::{
    FailureReason, FallbackUi, OverlayMark, RunOutcome, RunRequest, RunResult, INTENT_NOT_FOUND,
    OTHER_OVERLAY_COLOR, RECOVERY_HINT,
};
