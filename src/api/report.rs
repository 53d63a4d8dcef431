//! Report aggregation.

use crate::core::{Conflict, ConflictType};
use crate::gaps::CoverageGap;
use crate::recommend::{Priority, Recommendation};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Conflicts above this confidence count as critical issues.
pub const CRITICAL_CONFIDENCE: f64 = 0.8;

/// Headline counts for a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of conflicts
    pub total_conflicts: usize,
    /// Number of recommendations
    pub total_recommendations: usize,
    /// Number of coverage gaps
    pub total_coverage_gaps: usize,
    /// High-confidence conflicts plus critical/high recommendations
    pub critical_issues: usize,
    /// Conflicts per type
    pub conflicts_by_type: BTreeMap<ConflictType, usize>,
    /// Recommendations per priority
    pub recommendations_by_priority: BTreeMap<Priority, usize>,
    /// When the report was built
    pub generated_at: DateTime<Utc>,
}

/// The combined result of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Headline counts
    pub summary: ReportSummary,
    /// Conflicts, highest confidence first
    pub conflicts: Vec<Conflict>,
    /// Recommendations, most urgent first
    pub recommendations: Vec<Recommendation>,
    /// Coverage gaps
    pub coverage_gaps: Vec<CoverageGap>,
    /// Short prioritised action items
    pub next_actions: Vec<String>,
}

impl AnalysisReport {
    /// Whether the report contains any critical issue.
    pub fn has_critical_issues(&self) -> bool {
        self.summary.critical_issues > 0
    }
}

/// Merge analysis results into a report.
///
/// Conflicts are ordered by descending confidence and recommendations by
/// priority; both sorts are stable, so ties keep their input order.
pub fn aggregate(
    mut conflicts: Vec<Conflict>,
    mut recommendations: Vec<Recommendation>,
    coverage_gaps: Vec<CoverageGap>,
) -> AnalysisReport {
    conflicts.sort_by(|a, b| b.confidence_score.total_cmp(&a.confidence_score));
    recommendations.sort_by_key(|r| r.priority);

    let critical_conflicts = conflicts
        .iter()
        .filter(|c| c.confidence_score > CRITICAL_CONFIDENCE)
        .count();
    let urgent_recommendations = recommendations
        .iter()
        .filter(|r| r.priority.is_urgent())
        .count();

    let mut conflicts_by_type = BTreeMap::new();
    for conflict in &conflicts {
        *conflicts_by_type.entry(conflict.conflict_type).or_insert(0) += 1;
    }
    let mut recommendations_by_priority = BTreeMap::new();
    for recommendation in &recommendations {
        *recommendations_by_priority
            .entry(recommendation.priority)
            .or_insert(0) += 1;
    }

    let next_actions = next_actions(critical_conflicts, urgent_recommendations, coverage_gaps.len());

    AnalysisReport {
        summary: ReportSummary {
            total_conflicts: conflicts.len(),
            total_recommendations: recommendations.len(),
            total_coverage_gaps: coverage_gaps.len(),
            critical_issues: critical_conflicts + urgent_recommendations,
            conflicts_by_type,
            recommendations_by_priority,
            generated_at: Utc::now(),
        },
        conflicts,
        recommendations,
        coverage_gaps,
        next_actions,
    }
}

fn next_actions(critical_conflicts: usize, urgent_recommendations: usize, gaps: usize) -> Vec<String> {
    let mut actions = Vec::new();
    if critical_conflicts > 0 {
        actions.push(format!(
            "Resolve {} critical policy conflicts",
            critical_conflicts
        ));
    }
    if urgent_recommendations > 0 {
        actions.push(format!(
            "Implement {} high-priority recommendations",
            urgent_recommendations
        ));
    }
    if gaps > 0 {
        actions.push(format!("Address {} coverage gaps", gaps));
    }
    if actions.is_empty() {
        actions.push("Policy set appears well-optimized.".to_string());
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaps::{GapType, RiskLevel};
    use crate::recommend::RecommendationType;

    fn conflict(ids: [&str; 2], confidence: f64) -> Conflict {
        Conflict::new(ConflictType::OverlappingPatterns, ids, "overlap").with_confidence(confidence)
    }

    fn recommendation(priority: Priority, title: &str) -> Recommendation {
        Recommendation::new(RecommendationType::Optimization, priority, title)
    }

    #[test]
    fn test_empty_report() {
        let report = aggregate(Vec::new(), Vec::new(), Vec::new());
        assert_eq!(report.summary.critical_issues, 0);
        assert_eq!(report.next_actions, vec!["Policy set appears well-optimized."]);
        assert!(!report.has_critical_issues());
    }

    #[test]
    fn test_critical_issue_count_and_actions() {
        let report = aggregate(
            vec![conflict(["a", "b"], 0.7), conflict(["a", "c"], 0.9), conflict(["b", "c"], 0.8)],
            vec![
                recommendation(Priority::Medium, "m"),
                recommendation(Priority::High, "h"),
                recommendation(Priority::Critical, "c"),
            ],
            vec![CoverageGap::new(GapType::Endpoint, RiskLevel::Medium, "gap", vec![])],
        );

        // 0.8 is not above the threshold.
        assert_eq!(report.summary.critical_issues, 3);
        assert_eq!(
            report.next_actions,
            vec![
                "Resolve 1 critical policy conflicts",
                "Implement 2 high-priority recommendations",
                "Address 1 coverage gaps",
            ]
        );
    }

    #[test]
    fn test_ordering_is_stable() {
        let report = aggregate(
            vec![conflict(["a", "b"], 0.5), conflict(["c", "d"], 0.9), conflict(["e", "f"], 0.5)],
            vec![
                recommendation(Priority::Low, "l"),
                recommendation(Priority::Medium, "m1"),
                recommendation(Priority::High, "h"),
                recommendation(Priority::Medium, "m2"),
            ],
            Vec::new(),
        );

        let conflict_ids: Vec<_> = report.conflicts.iter().map(|c| c.rule_ids[0].as_str()).collect();
        assert_eq!(conflict_ids, vec!["c", "a", "e"]);

        let titles: Vec<_> = report.recommendations.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["h", "m1", "m2", "l"]);

        assert_eq!(report.summary.recommendations_by_priority[&Priority::Medium], 2);
        assert_eq!(
            report.summary.conflicts_by_type[&ConflictType::OverlappingPatterns],
            3
        );
    }

    #[test]
    fn test_report_serialization() {
        let report = aggregate(vec![conflict(["a", "b"], 0.9)], Vec::new(), Vec::new());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["critical_issues"], 1);
        assert_eq!(json["summary"]["conflicts_by_type"]["overlapping_patterns"], 1);
        assert_eq!(json["conflicts"][0]["type"], "overlapping_patterns");
    }
}
