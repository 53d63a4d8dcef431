//! Analysis request documents.

use crate::gaps::EvaluationRecord;
use crate::recommend::PerformanceData;
use crate::rule::RuleSet;
use crate::{Error, Result};

use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Everything a full analysis consumes.
///
/// `rules` maps rule id to rule definition. Invalid entries are skipped and
/// listed in [`RuleSet::skipped`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
    /// Rules under analysis
    #[serde(deserialize_with = "deserialize_rules")]
    pub rules: RuleSet,
    /// Per-rule runtime telemetry
    #[serde(default)]
    pub performance_data: Option<PerformanceData>,
    /// Compliance tags the rule set must satisfy
    #[serde(default)]
    pub compliance_requirements: Option<Vec<String>>,
    /// Observed evaluations
    #[serde(default)]
    pub evaluation_history: Option<Vec<EvaluationRecord>>,
    /// Compliance frameworks in force
    #[serde(default)]
    pub compliance_frameworks: Option<Vec<String>>,
}

impl AnalysisRequest {
    /// Create a request for a rule set with no optional inputs.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    /// Parse a request from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a request from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a request file. `.yaml`/`.yml` are read as YAML; `.json` or no extension as JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            other => Err(Error::parse(format!(
                "Unsupported request file extension: {}",
                other
            ))),
        }
    }

    /// Set performance data.
    pub fn with_performance_data(mut self, data: PerformanceData) -> Self {
        self.performance_data = Some(data);
        self
    }

    /// Set compliance requirements.
    pub fn with_compliance_requirements(mut self, requirements: Vec<String>) -> Self {
        self.compliance_requirements = Some(requirements);
        self
    }

    /// Set evaluation history.
    pub fn with_evaluation_history(mut self, history: Vec<EvaluationRecord>) -> Self {
        self.evaluation_history = Some(history);
        self
    }

    /// Set compliance frameworks.
    pub fn with_compliance_frameworks(mut self, frameworks: Vec<String>) -> Self {
        self.compliance_frameworks = Some(frameworks);
        self
    }
}

fn deserialize_rules<'de, D>(deserializer: D) -> std::result::Result<RuleSet, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    RuleSet::from_rules_value(&value).map_err(<D::Error as serde::de::Error>::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let request = AnalysisRequest::from_json(
            r#"{
                "rules": {
                    "R1": {"pattern": "api[_-]?key=...", "action": "block"},
                    "R2": {"pattern": "oops"}
                },
                "performance_data": {"R1": {"false_positive_rate": 0.5}},
                "compliance_requirements": ["gdpr"],
                "evaluation_history": [{"endpoint": "/api/users", "content_location": "request"}]
            }"#,
        )
        .unwrap();

        assert_eq!(request.rules.len(), 1);
        assert_eq!(request.rules.skipped()[0].id, "R2");
        assert_eq!(
            request.performance_data.unwrap()["R1"].false_positive_rate,
            Some(0.5)
        );
        assert_eq!(request.compliance_requirements.unwrap(), vec!["gdpr"]);
        assert_eq!(request.evaluation_history.unwrap().len(), 1);
        assert!(request.compliance_frameworks.is_none());
    }

    #[test]
    fn test_from_yaml() {
        let request = AnalysisRequest::from_yaml(
            r#"
rules:
  R1:
    pattern: "password\\s*="
    action: block
compliance_frameworks: [hipaa]
"#,
        )
        .unwrap();
        assert_eq!(request.rules.len(), 1);
        assert_eq!(request.compliance_frameworks.unwrap(), vec!["hipaa"]);
    }

    #[test]
    fn test_rules_must_be_a_map() {
        assert!(AnalysisRequest::from_json(r#"{"rules": []}"#).is_err());
        assert!(AnalysisRequest::from_json(r#"{"performance_data": {}}"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = AnalysisRequest::from_file("/nonexistent/request.json").unwrap_err();
        assert_eq!(err.category(), "io");
    }
}
