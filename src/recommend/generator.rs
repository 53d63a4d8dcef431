//! Recommendation passes.
//!
//! Each pass is independent and no recommendation is deduplicated against
//! another pass. Confidence values are fixed per pass.

use super::catalogue::{missing_families, ComplianceFramework, PatternFamily};
use super::{PerformanceData, Priority, Recommendation, RecommendationType};
use crate::config::RecommendationConfig;
use crate::rule::RuleSet;

use serde_json::{json, Value};
use tracing::debug;

const FALSE_POSITIVE_CONFIDENCE: f64 = 0.85;
const EFFECTIVENESS_CONFIDENCE: f64 = 0.75;
const SECURITY_GAP_CONFIDENCE: f64 = 0.9;
const PATTERN_QUALITY_CONFIDENCE: f64 = 0.6;
const COMPLIANCE_CONFIDENCE: f64 = 0.8;

/// Run every recommendation pass over a rule set.
///
/// An empty rule set yields no recommendations.
pub fn generate_recommendations(
    rules: &RuleSet,
    performance: Option<&PerformanceData>,
    compliance_requirements: Option<&[String]>,
    config: &RecommendationConfig,
) -> Vec<Recommendation> {
    if rules.is_empty() {
        return Vec::new();
    }

    let mut recommendations = Vec::new();
    if let Some(performance) = performance {
        recommendations.extend(performance_recommendations(rules, performance, config));
    }
    recommendations.extend(security_gap_recommendations(rules));
    recommendations.extend(pattern_quality_recommendations(rules, config));
    if let Some(requirements) = compliance_requirements {
        recommendations.extend(compliance_recommendations(rules, requirements));
    }

    debug!(count = recommendations.len(), "Generated recommendations");
    recommendations
}

/// Recommendations from observed false positive rates and effectiveness.
pub fn performance_recommendations(
    rules: &RuleSet,
    performance: &PerformanceData,
    config: &RecommendationConfig,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    for (rule_id, perf) in performance {
        if !rules.contains(rule_id) {
            debug!(rule_id = %rule_id, "Ignoring performance data for unknown rule");
            continue;
        }

        if let Some(rate) = perf.false_positive_rate.filter(|r| r.is_finite()) {
            if rate > config.false_positive_rate_threshold {
                recommendations.push(
                    Recommendation::new(
                        RecommendationType::PerformanceTuning,
                        Priority::High,
                        format!("Reduce false positives for rule {}", rule_id),
                    )
                    .with_description(format!(
                        "Rule {} has a false positive rate of {:.1}%",
                        rule_id,
                        rate * 100.0
                    ))
                    .with_affected_rule(rule_id.as_str())
                    .with_change("pattern", json!("narrow the pattern with surrounding context"))
                    .with_change("min_count", json!(2))
                    .with_rationale("High false positive rates erode trust and cause alert fatigue")
                    .with_expected_impact("Fewer false positives without losing true detections")
                    .with_confidence(FALSE_POSITIVE_CONFIDENCE)
                    .with_step("Review recent false positive matches")
                    .with_step("Narrow the pattern or raise min_count")
                    .with_step("Re-measure the false positive rate"),
                );
            }
        }

        if let Some(score) = perf.effectiveness_score.filter(|s| s.is_finite()) {
            if score < config.effectiveness_threshold {
                recommendations.push(
                    Recommendation::new(
                        RecommendationType::Optimization,
                        Priority::Medium,
                        format!("Improve effectiveness of rule {}", rule_id),
                    )
                    .with_description(format!(
                        "Rule {} has an effectiveness score of {:.2}",
                        rule_id, score
                    ))
                    .with_affected_rule(rule_id.as_str())
                    .with_change("review", json!("broaden detection criteria"))
                    .with_rationale("The rule misses content it is meant to catch")
                    .with_expected_impact("Higher detection rate for the targeted content")
                    .with_confidence(EFFECTIVENESS_CONFIDENCE)
                    .with_step("Collect samples the rule failed to detect")
                    .with_step("Broaden or add alternative patterns")
                    .with_step("Validate against known-good content"),
                );
            }
        }
    }

    recommendations
}

/// One recommendation listing every catalogue family no rule covers.
pub fn security_gap_recommendations(rules: &RuleSet) -> Vec<Recommendation> {
    let missing = missing_families(rules);
    if missing.is_empty() {
        return Vec::new();
    }

    let names: Vec<&str> = missing.iter().map(|f| f.name).collect();
    let drafts: Vec<Value> = missing.iter().map(|f| f.draft_rule()).collect();

    vec![Recommendation::new(
        RecommendationType::SecurityEnhancement,
        Priority::High,
        "Add rules for uncovered sensitive data families",
    )
    .with_description(format!(
        "No rule covers {} sensitive data families: {}",
        names.len(),
        names.join(", ")
    ))
    .with_change("new_rules", Value::Array(drafts))
    .with_rationale("Common sensitive data types should be detected by at least one rule")
    .with_expected_impact("Broader protection against sensitive data exposure")
    .with_confidence(SECURITY_GAP_CONFIDENCE)
    .with_step("Review the drafted rules")
    .with_step("Adjust patterns to local data formats")
    .with_step("Add the rules in flag mode before enforcing")]
}

/// Recommendations for patterns too short to be specific.
pub fn pattern_quality_recommendations(
    rules: &RuleSet,
    config: &RecommendationConfig,
) -> Vec<Recommendation> {
    rules
        .iter()
        .filter_map(|rule| {
            let length = rule.pattern_text()?.chars().count();
            if length >= config.min_pattern_length {
                return None;
            }
            Some(
                Recommendation::new(
                    RecommendationType::Optimization,
                    Priority::Medium,
                    format!("Pattern of rule {} is too broad", rule.id),
                )
                .with_description(format!(
                    "Rule {} uses a {}-character pattern which is likely to over-match",
                    rule.id, length
                ))
                .with_affected_rule(rule.id.as_str())
                .with_change("pattern", json!("add contextual constraints"))
                .with_rationale("Short patterns match unrelated content")
                .with_expected_impact("Fewer incidental matches")
                .with_confidence(PATTERN_QUALITY_CONFIDENCE)
                .with_step("Add surrounding context such as keys or delimiters")
                .with_step("Consider min_count or applies_to restrictions"),
            )
        })
        .collect()
}

/// One recommendation per requested framework with uncovered families.
pub fn compliance_recommendations(rules: &RuleSet, requirements: &[String]) -> Vec<Recommendation> {
    let mut seen = Vec::new();
    let mut recommendations = Vec::new();

    for tag in requirements {
        let Some(framework) = ComplianceFramework::find(tag) else {
            debug!(framework = %tag, "Ignoring unknown compliance requirement");
            continue;
        };
        if seen.contains(&framework.name) {
            continue;
        }
        seen.push(framework.name);

        let missing = framework.missing_families(rules);
        if missing.is_empty() {
            continue;
        }
        recommendations.push(compliance_recommendation(framework, &missing));
    }

    recommendations
}

fn compliance_recommendation(
    framework: &ComplianceFramework,
    missing: &[&'static PatternFamily],
) -> Recommendation {
    let names: Vec<&str> = missing.iter().map(|f| f.name).collect();
    Recommendation::new(
        RecommendationType::ComplianceAlignment,
        Priority::High,
        format!("Align rules with {}", framework.name),
    )
    .with_description(format!(
        "{} requires detection of {} but no rule covers it",
        framework.name,
        names.join(", ")
    ))
    .with_change("framework", json!(framework.name))
    .with_change("missing_families", json!(names))
    .with_change(
        "new_rules",
        Value::Array(missing.iter().map(|f| f.draft_rule()).collect()),
    )
    .with_rationale(format!(
        "{} obligations cover data the rule set does not inspect",
        framework.name
    ))
    .with_expected_impact("Rule coverage consistent with the compliance requirement")
    .with_confidence(COMPLIANCE_CONFIDENCE)
    .with_step("Confirm which data the framework applies to")
    .with_step("Add the drafted rules")
}
