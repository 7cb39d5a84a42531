use anyhow::Result;

use super::commands::Commands;
use super::context::CliContext;
use super::env::CliArgs;
use super::label::cmd_label;
use super::plans::cmd_plans;
use super::policy::cmd_policy;
use super::run::cmd_run;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, ctx, cli.output).await,
        Commands::Label(args) => cmd_label(args, ctx, cli.output).await,
        Commands::Plans(args) => cmd_plans(args, ctx, cli.output),
        Commands::Policy(args) => cmd_policy(args, ctx, cli.output),
    }
}
