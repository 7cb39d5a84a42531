//! Static task catalogue.

use std::collections::BTreeMap;

use labelpilot_core_types::{PlanStep, TaskType};
use once_cell::sync::Lazy;

static BUILTIN: Lazy<ActionPlanRegistry> = Lazy::new(ActionPlanRegistry::catalogue);

#[derive(Clone, Debug, Default)]
pub struct ActionPlanRegistry {
    plans: BTreeMap<String, Vec<PlanStep>>,
}

impl ActionPlanRegistry {
    pub fn builtin() -> &'static ActionPlanRegistry {
        &BUILTIN
    }

    pub fn get(&self, task: &TaskType) -> Option<&[PlanStep]> {
        self.plans.get(task.as_str()).map(Vec::as_slice)
    }

    pub fn contains(&self, task: &TaskType) -> bool {
        self.plans.contains_key(task.as_str())
    }

    pub fn task_types(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PlanStep])> {
        self.plans
            .iter()
            .map(|(task, steps)| (task.as_str(), steps.as_slice()))
    }

    pub fn register(&mut self, task: impl Into<String>, steps: Vec<PlanStep>) {
        self.plans.insert(task.into(), steps);
    }

    fn catalogue() -> Self {
        let mut registry = Self::default();
        registry.register(
            "login",
            vec![
                PlanStep::type_text("input-username"),
                PlanStep::type_text("input-password"),
                PlanStep::click("login-button"),
            ],
        );
        registry.register(
            "signup",
            vec![
                PlanStep::type_text("input-username"),
                PlanStep::type_text("input-email"),
                PlanStep::type_text("input-password"),
                PlanStep::type_text("input-confirm-password"),
                PlanStep::click("submit-form"),
            ],
        );
        registry.register(
            "deleteAccount",
            vec![
                PlanStep::click("delete-account"),
                PlanStep::click("confirm-transaction"),
            ],
        );
        registry.register(
            "resetPassword",
            vec![
                PlanStep::type_text("input-email"),
                PlanStep::click("submit-form"),
            ],
        );
        registry.register(
            "payment",
            vec![
                PlanStep::type_text("input-card-number"),
                PlanStep::type_text("input-expiry"),
                PlanStep::type_text("input-cvv"),
                PlanStep::click("submit-payment"),
            ],
        );
        registry.register(
            "purchase",
            vec![
                PlanStep::click("submit-payment"),
                PlanStep::click("confirm-transaction"),
            ],
        );
        registry.register(
            "cartManagement",
            vec![
                PlanStep::type_text("input-quantity").optional(),
                PlanStep::click("update-cart").optional(),
                PlanStep::click("checkout-button"),
            ],
        );
        registry.register(
            "search",
            vec![
                PlanStep::type_text("search-box"),
                PlanStep::click("submit-form").optional(),
            ],
        );
        registry.register("navigation", vec![PlanStep::click("nav-link")]);
        registry.register(
            "formSubmission",
            vec![
                PlanStep::type_text("input-text").optional(),
                PlanStep::type_text("input-email").optional(),
                PlanStep::type_text("input-textarea").optional(),
                PlanStep::click("submit-form"),
            ],
        );
        registry.register(
            "messaging",
            vec![
                PlanStep::type_text("input-textarea"),
                PlanStep::click("send-message"),
            ],
        );
        registry.register("modalInteraction", vec![PlanStep::click("close-modal")]);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskPolicy;
    use labelpilot_core_types::ActionKind;

    #[test]
    fn catalogue_has_twelve_tasks() {
        let registry = ActionPlanRegistry::builtin();
        assert_eq!(registry.task_types().count(), 12);
        assert!(registry.contains(&TaskType::new("modalInteraction")));
        assert!(registry.get(&TaskType::new("unknown")).is_none());
    }

    #[test]
    fn login_plan_order() {
        let registry = ActionPlanRegistry::builtin();
        let steps = registry.get(&TaskType::new("login")).expect("login plan");
        let described: Vec<_> = steps.iter().map(PlanStep::describe).collect();
        assert_eq!(
            described,
            vec!["type input-username", "type input-password", "click login-button"]
        );
        assert!(steps.iter().all(|step| step.required));
    }

    #[test]
    fn optional_steps_are_marked() {
        let registry = ActionPlanRegistry::builtin();
        let steps = registry.get(&TaskType::new("search")).expect("search plan");
        assert_eq!(steps[0].action, ActionKind::Type);
        assert!(steps[0].required);
        assert!(!steps[1].required);
    }

    #[test]
    fn every_plan_intent_is_in_risk_table() {
        let risk = RiskPolicy::builtin();
        for (task, steps) in ActionPlanRegistry::builtin().iter() {
            for step in steps {
                assert!(
                    risk.rule(&step.intent).is_some(),
                    "{task} uses unknown intent {}",
                    step.intent
                );
            }
        }
    }
}
