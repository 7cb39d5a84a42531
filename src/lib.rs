//! LabelPilot command-line application.
//!
//! Exposes the CLI, configuration and the snapshot browser for integration
//! testing.

pub mod cli;
pub mod config;
pub mod snapshot_browser;

pub use config::AppConfig;
pub use snapshot_browser::SnapshotBrowser;
