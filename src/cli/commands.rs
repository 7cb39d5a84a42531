use clap::Subcommand;

use super::label::LabelArgs;
use super::plans::PlansArgs;
use super::policy::PolicyArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Label a page snapshot and execute a task plan against it
    Run(RunArgs),

    /// Run the labeling pipeline only and print the validated labels
    Label(LabelArgs),

    /// Show the task plan catalogue
    Plans(PlansArgs),

    /// Inspect the effective labeling policy
    Policy(PolicyArgs),
}
