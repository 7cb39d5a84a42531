pub mod app;
pub mod commands;
pub mod context;
pub mod counters;
pub mod dispatch;
pub mod env;
pub mod label;
pub mod output;
pub mod plans;
pub mod policy;
pub mod run;
pub mod runtime;

pub use app::run;
