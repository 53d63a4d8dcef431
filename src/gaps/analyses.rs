//! Built-in gap analyses.

use super::{CoverageGap, GapAnalysis, GapInput, GapType, RiskLevel};
use crate::core::detectors::scope::wildcard_covers;
use crate::recommend::ComplianceFramework;
use crate::rule::{RuleAction, RuleSet};

use serde_json::json;
use std::collections::BTreeSet;
use tracing::debug;

/// Endpoints seen in evaluation history that no rule scope covers.
///
/// A rule without endpoints applies everywhere and covers every endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointGapAnalysis;

impl GapAnalysis for EndpointGapAnalysis {
    fn gap_type(&self) -> GapType {
        GapType::Endpoint
    }

    fn identify(&self, input: &GapInput<'_>) -> Vec<CoverageGap> {
        let seen: BTreeSet<&str> = input
            .history()
            .iter()
            .filter_map(|record| record.endpoint.as_deref())
            .filter(|endpoint| !endpoint.is_empty())
            .collect();

        let uncovered: Vec<String> = seen
            .into_iter()
            .filter(|endpoint| !endpoint_covered(input.rules, endpoint))
            .map(String::from)
            .collect();
        if uncovered.is_empty() {
            return Vec::new();
        }

        let stub = json!({
            "id": "suggested-endpoint-scope",
            "title": "Inspect unscoped endpoints",
            "action": RuleAction::Flag,
            "endpoints": uncovered,
        });
        vec![CoverageGap::new(
            GapType::Endpoint,
            RiskLevel::Medium,
            format!(
                "{} endpoint(s) received traffic but no rule is scoped to them",
                uncovered.len()
            ),
            uncovered,
        )
        .with_suggested_rule(stub)]
    }
}

fn endpoint_covered(rules: &RuleSet, endpoint: &str) -> bool {
    rules.iter().any(|rule| {
        rule.endpoints.is_empty()
            || rule
                .endpoints
                .iter()
                .any(|scope| scope == endpoint || wildcard_covers(scope, endpoint))
    })
}

/// Content locations seen in evaluation history that no rule inspects.
///
/// A rule with an empty `applies_to` inspects every location.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentPatternGapAnalysis;

impl GapAnalysis for ContentPatternGapAnalysis {
    fn gap_type(&self) -> GapType {
        GapType::ContentPattern
    }

    fn identify(&self, input: &GapInput<'_>) -> Vec<CoverageGap> {
        let seen: BTreeSet<&str> = input
            .history()
            .iter()
            .filter_map(|record| record.content_location.as_deref())
            .filter(|location| !location.is_empty())
            .collect();

        let uncovered: Vec<String> = seen
            .into_iter()
            .filter(|location| {
                !input.rules.iter().any(|rule| {
                    rule.applies_to.is_empty() || rule.applies_to.contains(*location)
                })
            })
            .map(String::from)
            .collect();
        if uncovered.is_empty() {
            return Vec::new();
        }

        let stub = json!({
            "id": "suggested-content-locations",
            "title": "Inspect uncovered content locations",
            "action": RuleAction::Flag,
            "applies_to": uncovered,
        });
        vec![CoverageGap::new(
            GapType::ContentPattern,
            RiskLevel::Medium,
            format!(
                "No rule inspects content in: {}",
                uncovered.join(", ")
            ),
            uncovered,
        )
        .with_suggested_rule(stub)]
    }
}

/// Requested compliance frameworks whose data families no rule covers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegulationAreaGapAnalysis;

impl GapAnalysis for RegulationAreaGapAnalysis {
    fn gap_type(&self) -> GapType {
        GapType::RegulationArea
    }

    fn identify(&self, input: &GapInput<'_>) -> Vec<CoverageGap> {
        let mut seen = BTreeSet::new();
        let mut gaps = Vec::new();

        for tag in input.frameworks() {
            let Some(framework) = ComplianceFramework::find(tag) else {
                debug!(framework = %tag, "Unknown compliance framework, no coverage map");
                continue;
            };
            if !seen.insert(framework.name) {
                continue;
            }

            let missing = framework.missing_families(input.rules);
            if missing.is_empty() {
                continue;
            }

            let scenarios: Vec<String> = missing.iter().map(|f| f.name.to_string()).collect();
            let mut gap = CoverageGap::new(
                GapType::RegulationArea,
                RiskLevel::High,
                format!(
                    "{} data families are not covered: {}",
                    framework.name,
                    scenarios.join(", ")
                ),
                scenarios,
            );
            for family in &missing {
                gap = gap
                    .with_suggested_rule(family.draft_rule())
                    .with_implication(format!(
                        "{} requires controls over {} data",
                        framework.name, family.name
                    ));
            }
            gaps.push(gap);
        }

        gaps
    }
}

/// Time-window coverage. No built-in signal exists, so it never reports gaps;
/// register a custom [`GapAnalysis`] to supply one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalGapAnalysis;

impl GapAnalysis for TemporalGapAnalysis {
    fn gap_type(&self) -> GapType {
        GapType::Temporal
    }

    fn identify(&self, _input: &GapInput<'_>) -> Vec<CoverageGap> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaps::EvaluationRecord;
    use crate::rule::Rule;

    fn record(endpoint: &str, location: &str) -> EvaluationRecord {
        EvaluationRecord {
            endpoint: Some(endpoint.to_string()),
            content_location: Some(location.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_endpoint_gaps() {
        let rules = RuleSet::from_rules(vec![
            Rule::new("r1", RuleAction::Block).with_endpoints(["/api/*"]),
            Rule::new("r2", RuleAction::Flag).with_endpoints(["/health"]),
        ]);
        let history = vec![
            record("/api/users", "request"),
            record("/admin/export", "request"),
            record("/admin/export", "response"),
            record("/health", "request"),
        ];

        let gaps = EndpointGapAnalysis.identify(&GapInput::new(&rules).with_history(&history));
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].uncovered_scenarios, vec!["/admin/export"]);
        assert_eq!(gaps[0].suggested_rules[0]["endpoints"][0], "/admin/export");
    }

    #[test]
    fn test_wildcard_covers_bare_prefix_endpoint() {
        let rules = RuleSet::from_rules(vec![
            Rule::new("r1", RuleAction::Block).with_endpoints(["/api/*"]),
        ]);
        let history = vec![record("/api", "request"), record("/apiary", "request")];
        let input = GapInput::new(&rules).with_history(&history);
        assert!(EndpointGapAnalysis.identify(&input).is_empty());
    }

    #[test]
    fn test_unscoped_rule_covers_every_endpoint() {
        let rules = RuleSet::from_rules(vec![Rule::new("r1", RuleAction::Block)]);
        let history = vec![record("/anything", "request")];
        let input = GapInput::new(&rules).with_history(&history);
        assert!(EndpointGapAnalysis.identify(&input).is_empty());
        assert!(ContentPatternGapAnalysis.identify(&input).is_empty());
    }

    #[test]
    fn test_content_location_gaps() {
        let rules = RuleSet::from_rules(vec![
            Rule::new("r1", RuleAction::Block).with_applies_to(["request"]),
        ]);
        let history = vec![record("/a", "request"), record("/a", "response")];

        let gaps =
            ContentPatternGapAnalysis.identify(&GapInput::new(&rules).with_history(&history));
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].uncovered_scenarios, vec!["response"]);
    }

    #[test]
    fn test_history_absent_yields_nothing() {
        let rules = RuleSet::new();
        let input = GapInput::new(&rules);
        assert!(EndpointGapAnalysis.identify(&input).is_empty());
        assert!(ContentPatternGapAnalysis.identify(&input).is_empty());
        assert!(RegulationAreaGapAnalysis.identify(&input).is_empty());
    }

    #[test]
    fn test_regulation_area_gaps() {
        let rules = RuleSet::from_rules(vec![
            Rule::new("r1", RuleAction::Block).with_pattern("(?i)ssn\\s*:\\s*\\d{3}-\\d{2}-\\d{4}"),
        ]);
        let frameworks = vec!["hipaa".to_string(), "HIPAA".to_string(), "iso-27001".to_string()];

        let gaps =
            RegulationAreaGapAnalysis.identify(&GapInput::new(&rules).with_frameworks(&frameworks));
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].risk_level, RiskLevel::High);
        assert_eq!(gaps[0].uncovered_scenarios, vec!["email"]);
        assert_eq!(gaps[0].suggested_rules.len(), 1);
        assert_eq!(gaps[0].compliance_implications.len(), 1);
    }

    #[test]
    fn test_temporal_is_empty() {
        let rules = RuleSet::new();
        let history = vec![record("/a", "request")];
        assert!(TemporalGapAnalysis
            .identify(&GapInput::new(&rules).with_history(&history))
            .is_empty());
    }
}
