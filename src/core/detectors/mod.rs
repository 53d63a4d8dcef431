//! Conflict detectors.
//!
//! Five independent passes over a rule set. Each is a free function over
//! borrowed rules; [`detect_conflicts`] runs them in a fixed order and removes
//! duplicate findings.

pub mod contradiction;
pub mod overlap;
pub mod precedence;
pub mod redundancy;
pub mod scope;

use super::backend::SimilarityBackend;
use super::conflict::{Conflict, ConflictSet};
use crate::config::AnalysisConfig;
use crate::rule::RuleSet;

use tracing::debug;

/// Run every detector and return the combined findings.
///
/// The result depends only on the rule set and configuration: pairwise passes
/// iterate in rule-id order and the precedence pass in rule-set order.
pub fn detect_conflicts(
    rules: &RuleSet,
    backend: &dyn SimilarityBackend,
    config: &AnalysisConfig,
) -> Vec<Conflict> {
    let mut conflicts = ConflictSet::new();

    let found = overlap::detect(rules, config.overlap_threshold);
    debug!(count = found.len(), "overlapping_patterns pass");
    conflicts.extend(found);

    let found = contradiction::detect(rules);
    debug!(count = found.len(), "contradictory_actions pass");
    conflicts.extend(found);

    let found = scope::detect(rules);
    debug!(count = found.len(), "scope_conflicts pass");
    conflicts.extend(found);

    let found = redundancy::detect(rules, backend, config.redundancy_similarity_threshold);
    debug!(count = found.len(), "redundant_rules pass");
    conflicts.extend(found);

    let found = precedence::detect(rules, config.overlap_threshold);
    debug!(count = found.len(), "precedence_issues pass");
    conflicts.extend(found);

    conflicts.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::ExactOnlyBackend;
    use crate::core::ConflictType;
    use crate::rule::{Rule, RuleAction};
    use proptest::prelude::*;

    #[test]
    fn test_empty_rule_set() {
        let conflicts =
            detect_conflicts(&RuleSet::new(), &ExactOnlyBackend, &AnalysisConfig::default());
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_detection_is_repeatable() {
        let rules = RuleSet::from_rules(vec![
            Rule::new("r3", RuleAction::Allow).with_pattern("api[_-]?key=..."),
            Rule::new("r1", RuleAction::Block).with_pattern("api[_-]?key=..."),
            Rule::new("r2", RuleAction::Block).with_pattern("api[_-]?key=..."),
            Rule::new("r4", RuleAction::Allow)
                .with_pattern("apikey")
                .with_endpoints(["/api/*"]),
            Rule::new("r5", RuleAction::Block).with_endpoints(["/api/keys"]),
        ]);
        let config = AnalysisConfig::default();
        let first = detect_conflicts(&rules, &ExactOnlyBackend, &config);
        let second = detect_conflicts(&rules, &ExactOnlyBackend, &config);

        let key = |c: &Conflict| (c.conflict_id.clone(), c.confidence_score.to_bits());
        assert_eq!(
            first.iter().map(key).collect::<Vec<_>>(),
            second.iter().map(key).collect::<Vec<_>>()
        );
        assert!(first.iter().any(|c| c.conflict_type == ConflictType::ScopeConflicts));
        assert!(first.iter().any(|c| c.conflict_type == ConflictType::ContradictoryActions));
    }

    fn arb_rule(index: usize) -> impl Strategy<Value = Rule> {
        (
            prop::sample::select(vec!["secret", "token=\\w+", "password", "api_key", "x", ""]),
            prop::sample::select(vec![RuleAction::Block, RuleAction::Flag, RuleAction::Allow]),
            prop::option::of(prop::sample::select(vec!["/api/*", "/api/users", "/health"])),
            prop::option::of(1u32..4),
        )
            .prop_map(move |(pattern, action, endpoint, min_count)| {
                let mut rule = Rule::new(format!("r{}", index), action).with_pattern(pattern);
                rule.endpoints.extend(endpoint.map(String::from));
                rule.min_count = min_count;
                rule
            })
    }

    fn arb_rules() -> impl Strategy<Value = RuleSet> {
        (0usize..8).prop_flat_map(|n| {
            (0..n)
                .map(arb_rule)
                .collect::<Vec<_>>()
                .prop_map(|rules| RuleSet::from_rules(rules))
        })
    }

    proptest! {
        #[test]
        fn prop_confidence_is_bounded(rules in arb_rules()) {
            let conflicts = detect_conflicts(&rules, &ExactOnlyBackend, &AnalysisConfig::default());
            for conflict in conflicts {
                prop_assert!((0.0..=1.0).contains(&conflict.confidence_score));
                prop_assert!(conflict.rule_ids.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
