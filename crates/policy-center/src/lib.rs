pub mod api;
pub mod defaults;
pub mod errors;
pub mod loader;
pub mod model;
pub mod plans;
pub mod risk;

pub use api::PolicyHandle;
pub use defaults::default_snapshot;
pub use errors::PolicyError;
pub use loader::{apply_cli_overrides, load_snapshot, load_snapshot_with_options, LoadOptions};
pub use model::{
    ConfidenceThresholds, FilterPolicy, IntentRule, PolicySnapshot, PolicySource, RunDefaults,
    TokenBudget,
};
pub use plans::ActionPlanRegistry;
pub use risk::RiskPolicy;
