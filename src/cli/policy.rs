use std::collections::BTreeMap;

use anyhow::Result;
use clap::{Args, Subcommand};
use labelpilot_policy_center::PolicySource;

use super::context::CliContext;
use super::output::{emit, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct PolicyArgs {
    #[command(subcommand)]
    pub command: PolicyCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum PolicyCommand {
    /// Print the effective policy snapshot
    Show,
    /// List which layer last set each value
    Provenance,
}

pub fn cmd_policy(args: PolicyArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let snapshot = ctx.policy().snapshot();
    match args.command {
        PolicyCommand::Show => emit(output, &*snapshot, || {
            println!("Policy Revision: {}", snapshot.rev);
            println!("Config: {}", ctx.config_path().display());
            let c = &snapshot.confidence;
            println!(
                "Confidence → high={:.2} medium={:.2} low={:.2}",
                c.high, c.medium, c.low
            );
            let f = &snapshot.filter;
            println!(
                "Filter → max_depth={} max_children={} text={}..{}",
                f.max_depth, f.max_children, f.min_text_length, f.max_text_length
            );
            println!("Filter → exclude_tags={}", f.exclude_tags.join(","));
            println!(
                "Tokens → max_per_call={} safety_margin={} batch_budget={}",
                snapshot.tokens.max_tokens_per_call,
                snapshot.tokens.safety_margin,
                snapshot.tokens.batch_budget()
            );
            let r = &snapshot.run;
            println!(
                "Run → timeout_ms={} retry_if_missing={} screenshot_on_error={} log_actions={}",
                r.timeout_ms, r.retry_if_missing, r.screenshot_on_error, r.log_actions
            );
            println!("Risk table:");
            for (intent, rule) in &snapshot.risk {
                println!("  {:<24} {:<6} ≥ {:.2}", intent, rule.tier.as_str(), rule.min_confidence);
            }
        }),
        PolicyCommand::Provenance => {
            let sources: BTreeMap<&str, PolicySource> = snapshot
                .provenance
                .values()
                .map(|entry| (entry.path.as_str(), entry.source))
                .collect();
            emit(output, &sources, || {
                for (path, source) in &sources {
                    println!("{path:<36} {source:?}");
                }
            })
        }
    }
}
