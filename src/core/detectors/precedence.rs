//! Precedence hazard detection.
//!
//! Advisory only. Hosts that evaluate every matching rule and resolve by action
//! severity are unaffected by rule order; the finding is a readability hint that
//! a more specific rule sits behind a more general, overlapping one.

use crate::core::conflict::{Conflict, ConflictType};
use crate::core::similarity::pattern_overlap;
use crate::rule::{Rule, RuleSet};

/// Confidence assigned to every precedence finding.
pub const PRECEDENCE_CONFIDENCE: f64 = 0.7;

/// How narrowly a rule is scoped. Compared lexicographically: number of
/// populated discriminating attributes, then pattern length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    /// Populated discriminating attributes
    pub attributes: u8,
    /// Pattern length in characters
    pub pattern_len: usize,
}

impl Specificity {
    /// Compute the specificity of a rule.
    pub fn of(rule: &Rule) -> Self {
        let attributes = [
            rule.pattern_text().is_some(),
            rule.min_count.map_or(false, |c| c > 1),
            rule.max_chars.is_some(),
            !rule.endpoints.is_empty(),
            !rule.applies_to.is_empty(),
        ]
        .iter()
        .filter(|populated| **populated)
        .count() as u8;

        Self {
            attributes,
            pattern_len: rule.pattern_text().map_or(0, |p| p.chars().count()),
        }
    }
}

/// Flag every (earlier, later) pair in rule-set order where the later rule is
/// more specific and the patterns overlap above `threshold`.
pub fn detect(rules: &RuleSet, threshold: f64) -> Vec<Conflict> {
    let ordered = rules.rules();
    let mut conflicts = Vec::new();

    for (i, earlier) in ordered.iter().enumerate() {
        let Some(earlier_pattern) = earlier.pattern_text() else {
            continue;
        };
        let earlier_specificity = Specificity::of(earlier);

        for later in &ordered[i + 1..] {
            let Some(later_pattern) = later.pattern_text() else {
                continue;
            };
            if earlier_specificity >= Specificity::of(later) {
                continue;
            }
            let overlap = pattern_overlap(earlier_pattern, later_pattern);
            if overlap > threshold {
                conflicts.push(precedence_conflict(earlier, later, overlap));
            }
        }
    }
    conflicts
}

fn precedence_conflict(earlier: &Rule, later: &Rule, overlap: f64) -> Conflict {
    Conflict::new(
        ConflictType::PrecedenceIssues,
        [earlier.id.as_str(), later.id.as_str()],
        format!(
            "More specific rule '{}' follows more general rule '{}' and their patterns overlap (similarity {:.2}); it may be shadowed if the host stops at the first match",
            later.id, earlier.id, overlap
        ),
    )
    .with_impact(
        "Maintainability hint: with severity-based resolution both rules still apply, but the ordering obscures which rule is authoritative",
    )
    .with_suggestion(format!("Move '{}' before '{}'", later.id, earlier.id))
    .with_suggestion(format!(
        "Narrow '{}' so it no longer overlaps the specific case",
        earlier.id
    ))
    .with_confidence(PRECEDENCE_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleAction;

    #[test]
    fn test_specificity_counts_attributes() {
        let general = Rule::new("g", RuleAction::Flag).with_pattern("token");
        let specific = Rule::builder("s")
            .pattern("token=\\w{32}")
            .action(RuleAction::Block)
            .min_count(2)
            .max_chars(4096)
            .endpoint("/api/*")
            .applies_to("request")
            .build()
            .unwrap();

        assert_eq!(Specificity::of(&general).attributes, 1);
        assert_eq!(Specificity::of(&specific).attributes, 5);
        assert!(Specificity::of(&general) < Specificity::of(&specific));
    }

    #[test]
    fn test_min_count_of_one_is_not_specific() {
        let mut rule = Rule::new("r", RuleAction::Flag);
        rule.min_count = Some(1);
        assert_eq!(Specificity::of(&rule).attributes, 0);
    }

    #[test]
    fn test_pattern_length_breaks_ties() {
        let short = Rule::new("a", RuleAction::Flag).with_pattern("token");
        let long = Rule::new("b", RuleAction::Flag).with_pattern("token=abc");
        assert!(Specificity::of(&short) < Specificity::of(&long));
    }

    #[test]
    fn test_general_before_specific_is_flagged() {
        let rules = RuleSet::from_rules(vec![
            Rule::new("general", RuleAction::Flag).with_pattern("password"),
            Rule::new("specific", RuleAction::Block)
                .with_pattern("password=\\S+")
                .with_endpoints(["/login"]),
        ]);
        let conflicts = detect(&rules, 0.3);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].rule_ids, vec!["general", "specific"]);
        assert_eq!(conflicts[0].confidence_score, 0.7);
    }

    #[test]
    fn test_specific_before_general_is_fine() {
        let rules = RuleSet::from_rules(vec![
            Rule::new("specific", RuleAction::Block)
                .with_pattern("password=\\S+")
                .with_endpoints(["/login"]),
            Rule::new("general", RuleAction::Flag).with_pattern("password"),
        ]);
        assert!(detect(&rules, 0.3).is_empty());
    }

    #[test]
    fn test_equal_specificity_is_fine() {
        let rules = RuleSet::from_rules(vec![
            Rule::new("a", RuleAction::Flag).with_pattern("secret"),
            Rule::new("b", RuleAction::Flag).with_pattern("secret"),
        ]);
        assert!(detect(&rules, 0.3).is_empty());
    }
}
