//! Redundant rule detection.
//!
//! The exact pass always runs. The fuzzy pass runs only when the similarity
//! backend provides a similarity matrix; otherwise it is skipped silently.

use crate::core::backend::SimilarityBackend;
use crate::core::conflict::{Conflict, ConflictSet, ConflictType};
use crate::rule::{Rule, RuleSet};

use tracing::debug;

/// Confidence assigned to exact duplicates.
pub const EXACT_CONFIDENCE: f64 = 1.0;

/// Run both passes and return their union, exact findings first.
pub fn detect(rules: &RuleSet, backend: &dyn SimilarityBackend, threshold: f64) -> Vec<Conflict> {
    let sorted = rules.sorted_by_id();
    let mut conflicts = ConflictSet::new();
    conflicts.extend(exact_pass(&sorted));
    conflicts.extend(fuzzy_pass(&sorted, backend, threshold));
    conflicts.into_vec()
}

fn exact_pass(rules: &[&Rule]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, a) in rules.iter().enumerate() {
        let Some(a_pattern) = a.pattern_text() else {
            continue;
        };
        for b in &rules[i + 1..] {
            if b.pattern_text() == Some(a_pattern) && a.action == b.action {
                conflicts.push(
                    redundancy_conflict(a, b, "identical patterns and actions")
                        .with_confidence(EXACT_CONFIDENCE),
                );
            }
        }
    }
    conflicts
}

fn fuzzy_pass(rules: &[&Rule], backend: &dyn SimilarityBackend, threshold: f64) -> Vec<Conflict> {
    let documents: Vec<String> = rules.iter().map(|r| feature_text(r)).collect();
    let Some(matrix) = backend.similarity_matrix(&documents) else {
        debug!(backend = backend.name(), "Fuzzy redundancy pass unavailable, skipping");
        return Vec::new();
    };

    let mut conflicts = Vec::new();
    for i in 0..rules.len() {
        for j in i + 1..rules.len() {
            let similarity = matrix.get(i, j);
            if similarity > threshold && rules[i].action == rules[j].action {
                conflicts.push(
                    redundancy_conflict(
                        rules[i],
                        rules[j],
                        &format!("textual similarity {:.2}", similarity),
                    )
                    .with_confidence(similarity),
                );
            }
        }
    }
    conflicts
}

/// Text used to compare rules: pattern, title and content locations.
pub fn feature_text(rule: &Rule) -> String {
    let locations = rule.applies_to.iter().cloned().collect::<Vec<_>>().join(" ");
    [rule.pattern.as_deref().unwrap_or(""), rule.title.as_str(), locations.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn redundancy_conflict(a: &Rule, b: &Rule, reason: &str) -> Conflict {
    Conflict::new(
        ConflictType::RedundantRules,
        [a.id.as_str(), b.id.as_str()],
        format!(
            "Rules '{}' and '{}' are redundant ({}, action {})",
            a.id, b.id, reason, a.action
        ),
    )
    .with_impact("Every match is evaluated and reported twice, adding noise and maintenance cost")
    .with_suggestion(format!("Remove '{}' and keep '{}'", b.id, a.id))
    .with_suggestion("Merge any differing metadata (title, severity, scope) into the kept rule")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::ExactOnlyBackend;
    use crate::rule::RuleAction;

    fn rule(id: &str, pattern: &str, action: RuleAction) -> Rule {
        Rule::new(id, action).with_pattern(pattern)
    }

    #[test]
    fn test_exact_duplicates() {
        let rules = RuleSet::from_rules(vec![
            rule("r2", "api[_-]?key=...", RuleAction::Block),
            rule("r1", "api[_-]?key=...", RuleAction::Block),
        ]);
        let conflicts = detect(&rules, &ExactOnlyBackend, 0.8);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].rule_ids, vec!["r1", "r2"]);
        assert_eq!(conflicts[0].confidence_score, 1.0);
    }

    #[test]
    fn test_different_actions_not_redundant() {
        let rules = RuleSet::from_rules(vec![
            rule("r1", "secret", RuleAction::Block),
            rule("r2", "secret", RuleAction::Flag),
        ]);
        assert!(detect(&rules, &ExactOnlyBackend, 0.8).is_empty());
    }

    #[test]
    fn test_feature_text() {
        let rule = Rule::new("r1", RuleAction::Block)
            .with_pattern("ssn")
            .with_title("Social security numbers")
            .with_applies_to(["response", "request"]);
        assert_eq!(feature_text(&rule), "ssn Social security numbers request response");
        assert_eq!(feature_text(&Rule::new("r2", RuleAction::Block)), "");
    }

    #[cfg(feature = "vector-similarity")]
    #[test]
    fn test_fuzzy_pass_finds_near_duplicates() {
        use crate::core::backend::VectorBackend;

        let rules = RuleSet::from_rules(vec![
            rule("r1", "password leak", RuleAction::Block).with_title("password leak"),
            rule("r2", "password  leak", RuleAction::Block).with_title("password leak"),
            rule("r3", "credit card", RuleAction::Block).with_title("card numbers"),
        ]);
        let conflicts = detect(&rules, &VectorBackend::new(), 0.8);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].rule_ids, vec!["r1", "r2"]);
        assert!(conflicts[0].confidence_score > 0.8);
        assert!(conflicts[0].confidence_score <= 1.0);
    }

    #[cfg(feature = "vector-similarity")]
    #[test]
    fn test_exact_finding_wins_over_fuzzy() {
        use crate::core::backend::VectorBackend;

        let rules = RuleSet::from_rules(vec![
            rule("r1", "token secret", RuleAction::Allow),
            rule("r2", "token secret", RuleAction::Allow),
        ]);
        let conflicts = detect(&rules, &VectorBackend::new(), 0.8);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].confidence_score, 1.0);
        assert!(conflicts[0].description.contains("identical"));
    }
}
