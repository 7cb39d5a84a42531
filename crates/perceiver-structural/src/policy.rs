use std::collections::HashSet;

use labelpilot_policy_center::{FilterPolicy, PolicySnapshot, TokenBudget};
use serde::{Deserialize, Serialize};

/// Tree filter limits with the tag and pattern lists lowered once up front.
#[derive(Clone, Debug)]
pub struct FilterOptions {
    pub max_depth: usize,
    pub max_children: usize,
    pub max_text_length: usize,
    pub min_text_length: usize,
    exclude_tags: HashSet<String>,
    exclude_patterns: Vec<String>,
    important_tags: HashSet<String>,
}

impl FilterOptions {
    pub fn from_policy(policy: &FilterPolicy) -> Self {
        let lower = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .map(|item| item.trim().to_ascii_lowercase())
                .filter(|item| !item.is_empty())
                .collect()
        };
        Self {
            max_depth: policy.max_depth,
            max_children: policy.max_children,
            max_text_length: policy.max_text_length,
            min_text_length: policy.min_text_length,
            exclude_tags: lower(&policy.exclude_tags).into_iter().collect(),
            exclude_patterns: lower(&policy.exclude_patterns),
            important_tags: lower(&policy.important_tags).into_iter().collect(),
        }
    }

    pub fn is_excluded_tag(&self, tag: &str) -> bool {
        self.exclude_tags.contains(&tag.to_ascii_lowercase())
    }

    /// Matches `class + " " + id` against the exclusion substrings.
    pub fn matches_excluded_pattern(&self, class: Option<&str>, id: Option<&str>) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        let haystack = format!("{} {}", class.unwrap_or(""), id.unwrap_or("")).to_ascii_lowercase();
        self.exclude_patterns
            .iter()
            .any(|pattern| haystack.contains(pattern.as_str()))
    }

    pub fn is_important_tag(&self, tag: &str) -> bool {
        self.important_tags.contains(&tag.to_ascii_lowercase())
    }
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self::from_policy(&labelpilot_policy_center::default_snapshot().filter)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Ceiling for one logical chunk before it is sealed.
    pub max_tokens_per_call: usize,
    /// Ceiling for one labeler batch.
    pub batch_budget: usize,
}

impl ChunkOptions {
    pub fn from_budget(budget: &TokenBudget) -> Self {
        Self {
            max_tokens_per_call: budget.max_tokens_per_call,
            batch_budget: budget.batch_budget(),
        }
    }
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self::from_budget(&labelpilot_policy_center::default_snapshot().tokens)
    }
}

#[derive(Clone, Debug, Default)]
pub struct StructuralPolicyView {
    pub filter: FilterOptions,
    pub chunk: ChunkOptions,
}

impl StructuralPolicyView {
    pub fn from_snapshot(snapshot: &PolicySnapshot) -> Self {
        Self {
            filter: FilterOptions::from_policy(&snapshot.filter),
            chunk: ChunkOptions::from_budget(&snapshot.tokens),
        }
    }
}
