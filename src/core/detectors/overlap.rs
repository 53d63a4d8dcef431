//! Pattern-overlap detection.

use crate::core::conflict::{Conflict, ConflictType};
use crate::core::similarity::pattern_overlap;
use crate::rule::{Rule, RuleSet};

use tracing::debug;

/// Flag every rule pair whose pattern overlap exceeds `threshold`.
/// Confidence equals the overlap score.
pub fn detect(rules: &RuleSet, threshold: f64) -> Vec<Conflict> {
    let candidates: Vec<(&Rule, &str)> = rules
        .sorted_by_id()
        .into_iter()
        .filter_map(|rule| rule.pattern_text().map(|p| (rule, p)))
        .collect();

    let mut conflicts = Vec::new();
    for (i, (a, a_pattern)) in candidates.iter().enumerate() {
        for (b, b_pattern) in &candidates[i + 1..] {
            let score = pattern_overlap(a_pattern, b_pattern);
            if score <= threshold {
                continue;
            }
            debug!(rule_a = %a.id, rule_b = %b.id, score, "Pattern overlap");
            conflicts.push(overlap_conflict(a, b, score));
        }
    }
    conflicts
}

fn overlap_conflict(a: &Rule, b: &Rule, score: f64) -> Conflict {
    let impact = if a.action == b.action {
        format!(
            "Both rules {} the same content, so matching work is duplicated and findings are reported twice",
            a.action
        )
    } else {
        format!(
            "Overlapping content receives different actions ({} vs {}); the outcome depends on how the host resolves multiple matches",
            a.action, b.action
        )
    };

    Conflict::new(
        ConflictType::OverlappingPatterns,
        [a.id.as_str(), b.id.as_str()],
        format!(
            "Rules '{}' and '{}' have overlapping detection patterns (similarity {:.2})",
            a.id, b.id, score
        ),
    )
    .with_impact(impact)
    .with_suggestion("Merge the rules into a single pattern if they target the same data")
    .with_suggestion("Add contextual anchors to one pattern so the match sets separate")
    .with_suggestion("Document the intended division of responsibility between the rules")
    .with_confidence(score)
}
