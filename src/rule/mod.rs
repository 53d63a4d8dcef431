//! Rule data structures.
//!
//! A rule is a declarative content-inspection check: an opaque pattern, an
//! enforcement action, and a scope. The analyzer only ever reads rules; it
//! never compiles their patterns or mutates them.

mod action;
mod document;
mod severity;

pub use action::RuleAction;
pub use document::{RuleSet, SkippedRule};
pub use severity::Severity;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single detection rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier within one analysis call
    #[serde(default)]
    pub id: String,
    /// Regular expression source, treated as plain text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Enforcement action
    pub action: RuleAction,
    /// Informational severity
    #[serde(default)]
    pub severity: Severity,
    /// Human-readable title
    #[serde(default)]
    pub title: String,
    /// Content locations the rule inspects (e.g. `request`, `response`)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub applies_to: BTreeSet<String>,
    /// Endpoint scopes, optionally ending in a `/*` wildcard
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<String>,
    /// Minimum number of matches before the rule fires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u32>,
    /// Maximum number of characters inspected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<u32>,
}

impl Rule {
    /// Create a rule with only an id and an action.
    pub fn new(id: impl Into<String>, action: RuleAction) -> Self {
        Self {
            id: id.into(),
            pattern: None,
            action,
            severity: Severity::default(),
            title: String::new(),
            applies_to: BTreeSet::new(),
            endpoints: Vec::new(),
            min_count: None,
            max_chars: None,
        }
    }

    /// Create a rule builder.
    pub fn builder(id: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(id)
    }

    /// The pattern, if present and not blank.
    pub fn pattern_text(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// Set the pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Add endpoint scopes.
    pub fn with_endpoints(mut self, endpoints: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.endpoints.extend(endpoints.into_iter().map(Into::into));
        self
    }

    /// Add content locations.
    pub fn with_applies_to(mut self, locations: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.applies_to.extend(locations.into_iter().map(Into::into));
        self
    }

    /// Validate the rule.
    pub fn validate(&self) -> crate::Result<()> {
        if self.id.trim().is_empty() {
            return Err(crate::Error::validation_field("Rule ID cannot be empty", "id"));
        }

        if self.min_count == Some(0) {
            return Err(crate::Error::validation_field(
                "min_count must be at least 1",
                "min_count",
            ));
        }

        if self.endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(crate::Error::validation_field(
                "Endpoint scopes cannot be empty strings",
                "endpoints",
            ));
        }

        Ok(())
    }
}

/// Builder for creating rules.
#[derive(Debug)]
pub struct RuleBuilder {
    id: String,
    pattern: Option<String>,
    action: Option<RuleAction>,
    severity: Severity,
    title: Option<String>,
    applies_to: BTreeSet<String>,
    endpoints: Vec<String>,
    min_count: Option<u32>,
    max_chars: Option<u32>,
}

impl RuleBuilder {
    /// Create a new rule builder.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pattern: None,
            action: None,
            severity: Severity::default(),
            title: None,
            applies_to: BTreeSet::new(),
            endpoints: Vec::new(),
            min_count: None,
            max_chars: None,
        }
    }

    /// Set the pattern.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the action.
    pub fn action(mut self, action: RuleAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Set the severity.
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a content location.
    pub fn applies_to(mut self, location: impl Into<String>) -> Self {
        self.applies_to.insert(location.into());
        self
    }

    /// Add an endpoint scope.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoints.push(endpoint.into());
        self
    }

    /// Set the minimum match count.
    pub fn min_count(mut self, min_count: u32) -> Self {
        self.min_count = Some(min_count);
        self
    }

    /// Set the maximum inspected characters.
    pub fn max_chars(mut self, max_chars: u32) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    /// Build the rule.
    pub fn build(self) -> crate::Result<Rule> {
        let action = self
            .action
            .ok_or_else(|| crate::Error::validation_field("Rule must have an action", "action"))?;
        let title = self.title.unwrap_or_else(|| self.id.clone());

        let rule = Rule {
            id: self.id,
            pattern: self.pattern,
            action,
            severity: self.severity,
            title,
            applies_to: self.applies_to,
            endpoints: self.endpoints,
            min_count: self.min_count,
            max_chars: self.max_chars,
        };
        rule.validate()?;
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_creation() {
        let rule = Rule::new("r1", RuleAction::Block).with_pattern("secret");
        assert_eq!(rule.id, "r1");
        assert_eq!(rule.pattern_text(), Some("secret"));
        assert_eq!(rule.severity, Severity::Medium);
    }

    #[test]
    fn test_rule_builder() {
        let rule = Rule::builder("r1")
            .pattern(r"api[_-]?key=\w+")
            .action(RuleAction::Block)
            .severity(Severity::High)
            .applies_to("request")
            .endpoint("/api/*")
            .min_count(2)
            .build()
            .unwrap();

        assert_eq!(rule.title, "r1");
        assert_eq!(rule.severity, Severity::High);
        assert!(rule.applies_to.contains("request"));
        assert_eq!(rule.endpoints, vec!["/api/*"]);
        assert_eq!(rule.min_count, Some(2));
    }

    #[test]
    fn test_builder_requires_action() {
        let err = Rule::builder("r1").pattern("x").build().unwrap_err();
        assert!(err.to_string().contains("action"));
    }

    #[test]
    fn test_blank_pattern_is_absent() {
        let rule = Rule::new("r1", RuleAction::Flag).with_pattern("   ");
        assert_eq!(rule.pattern_text(), None);
    }

    #[test]
    fn test_rule_validation() {
        assert!(Rule::new("r1", RuleAction::Allow).validate().is_ok());
        assert!(Rule::new("", RuleAction::Allow).validate().is_err());

        let mut rule = Rule::new("r1", RuleAction::Allow);
        rule.min_count = Some(0);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_missing_action_fails_deserialization() {
        let result: std::result::Result<Rule, _> =
            serde_json::from_str(r#"{"id": "r1", "pattern": "abc"}"#);
        assert!(result.is_err());
    }
}
