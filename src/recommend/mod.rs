//! Improvement recommendations for a rule set.
//!
//! Recommendations are proposals: `suggested_changes` describes an edit, it
//! never applies one.

mod catalogue;
mod generator;

pub use catalogue::{
    missing_families, ComplianceFramework, PatternFamily, COMPLIANCE_FRAMEWORKS, PATTERN_FAMILIES,
};
pub use generator::{
    compliance_recommendations, generate_recommendations, pattern_quality_recommendations,
    performance_recommendations, security_gap_recommendations,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Observed runtime behaviour of one rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulePerformance {
    /// Share of matches that were false positives
    pub false_positive_rate: Option<f64>,
    /// How well the rule catches what it targets, in `[0, 1]`
    pub effectiveness_score: Option<f64>,
    /// Number of evaluations observed
    pub total_evaluations: u64,
}

/// Per-rule telemetry keyed by rule id.
pub type PerformanceData = BTreeMap<String, RulePerformance>;

/// Kind of recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    /// Resolve a detected conflict
    ConflictResolution,
    /// Improve an existing rule
    Optimization,
    /// Cover something no rule covers
    CoverageGap,
    /// Reduce noise or cost of a rule
    PerformanceTuning,
    /// Add protection for a sensitive data family
    SecurityEnhancement,
    /// Meet a compliance requirement
    ComplianceAlignment,
}

impl RecommendationType {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::ConflictResolution => "conflict_resolution",
            RecommendationType::Optimization => "optimization",
            RecommendationType::CoverageGap => "coverage_gap",
            RecommendationType::PerformanceTuning => "performance_tuning",
            RecommendationType::SecurityEnhancement => "security_enhancement",
            RecommendationType::ComplianceAlignment => "compliance_alignment",
        }
    }
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recommendation priority. Ordered most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Critical
    Critical,
    /// High
    High,
    /// Medium
    Medium,
    /// Low
    Low,
    /// Informational
    Informational,
}

impl Priority {
    /// Critical or high.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Priority::Critical | Priority::High)
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Informational => "informational",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A suggested improvement to the rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Unique id
    pub recommendation_id: String,
    /// Kind of recommendation
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    /// Priority
    pub priority: Priority,
    /// Short title
    pub title: String,
    /// What is recommended
    pub description: String,
    /// Rules the recommendation concerns; empty for new rules
    #[serde(default)]
    pub affected_rules: Vec<String>,
    /// Proposed edit
    #[serde(default)]
    pub suggested_changes: serde_json::Map<String, serde_json::Value>,
    /// Why
    pub rationale: String,
    /// Expected effect once applied
    pub expected_impact: String,
    /// Certainty in `[0, 1]`
    pub confidence_score: f64,
    /// Ordered steps to apply it
    #[serde(default)]
    pub implementation_steps: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Recommendation {
    /// Create a recommendation with a fresh id.
    pub fn new(
        recommendation_type: RecommendationType,
        priority: Priority,
        title: impl Into<String>,
    ) -> Self {
        Self {
            recommendation_id: format!("rec-{}", Uuid::new_v4()),
            recommendation_type,
            priority,
            title: title.into(),
            description: String::new(),
            affected_rules: Vec::new(),
            suggested_changes: serde_json::Map::new(),
            rationale: String::new(),
            expected_impact: String::new(),
            confidence_score: 0.0,
            implementation_steps: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an affected rule.
    pub fn with_affected_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.affected_rules.push(rule_id.into());
        self
    }

    /// Add a suggested change.
    pub fn with_change(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.suggested_changes.insert(key.into(), value);
        self
    }

    /// Set the rationale.
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    /// Set the expected impact.
    pub fn with_expected_impact(mut self, impact: impl Into<String>) -> Self {
        self.expected_impact = impact.into();
        self
    }

    /// Set the confidence score, clamped to `[0, 1]`.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence_score = confidence.clamp(0.0, 1.0);
        self
    }

    /// Append an implementation step.
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.implementation_steps.push(step.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let mut priorities = vec![Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
        priorities.sort();
        assert_eq!(
            priorities,
            vec![Priority::Critical, Priority::High, Priority::Medium, Priority::Low]
        );
        assert!(Priority::High.is_urgent());
        assert!(!Priority::Medium.is_urgent());
    }

    #[test]
    fn test_recommendation_builder() {
        let rec = Recommendation::new(RecommendationType::Optimization, Priority::Medium, "Tighten")
            .with_affected_rule("r1")
            .with_change("min_count", serde_json::json!(2))
            .with_confidence(1.4)
            .with_step("Edit the rule");

        assert!(rec.recommendation_id.starts_with("rec-"));
        assert_eq!(rec.affected_rules, vec!["r1"]);
        assert_eq!(rec.suggested_changes["min_count"], 2);
        assert_eq!(rec.confidence_score, 1.0);
    }

    #[test]
    fn test_recommendation_serialization() {
        let rec = Recommendation::new(
            RecommendationType::SecurityEnhancement,
            Priority::High,
            "Add rules",
        );
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "security_enhancement");
        assert_eq!(json["priority"], "high");
    }

    #[test]
    fn test_performance_defaults() {
        let perf: RulePerformance =
            serde_json::from_str(r#"{"false_positive_rate": 0.5}"#).unwrap();
        assert_eq!(perf.false_positive_rate, Some(0.5));
        assert_eq!(perf.effectiveness_score, None);
        assert_eq!(perf.total_evaluations, 0);
    }
}
