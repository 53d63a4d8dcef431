//! Action-contradiction detection.
//!
//! Rules are grouped by normalized pattern. A group that both blocks and
//! allows the same content is a contradiction; `flag` only means "needs
//! review" and never contradicts either.

use crate::core::conflict::{Conflict, ConflictType};
use crate::core::similarity::normalize_pattern;
use crate::rule::{Rule, RuleAction, RuleSet};

use std::collections::BTreeMap;

/// Confidence assigned to every contradiction.
pub const CONTRADICTION_CONFIDENCE: f64 = 0.9;

/// Emit one conflict per pattern group containing both `block` and `allow`.
pub fn detect(rules: &RuleSet) -> Vec<Conflict> {
    let mut groups: BTreeMap<String, Vec<&Rule>> = BTreeMap::new();
    for rule in rules.sorted_by_id() {
        if let Some(pattern) = rule.pattern_text() {
            groups.entry(normalize_pattern(pattern)).or_default().push(rule);
        }
    }

    groups
        .into_iter()
        .filter(|(_, group)| group.len() >= 2)
        .filter(|(_, group)| {
            group.iter().any(|r| r.action == RuleAction::Block)
                && group.iter().any(|r| r.action == RuleAction::Allow)
        })
        .map(|(pattern, group)| contradiction_conflict(&pattern, &group))
        .collect()
}

fn contradiction_conflict(pattern: &str, group: &[&Rule]) -> Conflict {
    let members = group
        .iter()
        .map(|r| format!("{} ({})", r.id, r.action))
        .collect::<Vec<_>>()
        .join(", ");

    Conflict::new(
        ConflictType::ContradictoryActions,
        group.iter().map(|r| r.id.as_str()),
        format!(
            "Rules {} match equivalent content ('{}') but prescribe contradictory actions",
            members, pattern
        ),
    )
    .with_impact(
        "The same content is both blocked and allowed; the effective outcome depends on host resolution order",
    )
    .with_suggestion("Decide on a single action for this content and remove or change the other rules")
    .with_suggestion("If an exception is intended, narrow the allow rule's scope with endpoints or applies_to")
    .with_confidence(CONTRADICTION_CONFIDENCE)
}
