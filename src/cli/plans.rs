use anyhow::{bail, Result};
use clap::Args;
use labelpilot_core_types::{PlanStep, RiskTier, TaskType};
use labelpilot_policy_center::ActionPlanRegistry;
use serde::Serialize;

use super::context::CliContext;
use super::output::{emit, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct PlansArgs {
    /// Show a single task instead of the whole catalogue
    pub task: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanView {
    task_type: String,
    steps: Vec<StepView>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StepView {
    #[serde(flatten)]
    step: PlanStep,
    risk: Option<RiskTier>,
    min_confidence: Option<f64>,
}

pub fn cmd_plans(args: PlansArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let registry = ActionPlanRegistry::builtin();
    let views: Vec<PlanView> = match args.task {
        Some(task) => {
            let Some(steps) = registry.get(&TaskType::new(task.as_str())) else {
                bail!(
                    "unknown task '{task}'; known tasks: {}",
                    registry.task_types().collect::<Vec<_>>().join(", ")
                );
            };
            vec![view(ctx, &task, steps)]
        }
        None => registry
            .iter()
            .map(|(task, steps)| view(ctx, task, steps))
            .collect(),
    };

    emit(output, &views, || {
        for plan in &views {
            println!("{}", plan.task_type);
            for step in &plan.steps {
                let flag = if step.step.required { "required" } else { "optional" };
                let risk = step.risk.map_or("-", |tier| tier.as_str());
                println!("  {:<32} {:<8} {}", step.step.describe(), flag, risk);
            }
        }
    })
}

fn view(ctx: &CliContext, task: &str, steps: &[PlanStep]) -> PlanView {
    let risk = ctx.policy().risk();
    PlanView {
        task_type: task.to_string(),
        steps: steps
            .iter()
            .map(|step| {
                let rule = risk.rule(&step.intent);
                StepView {
                    step: step.clone(),
                    risk: rule.map(|r| r.tier),
                    min_confidence: rule.map(|r| r.min_confidence),
                }
            })
            .collect(),
    }
}
