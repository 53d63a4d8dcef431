//! Rule set ingestion.
//!
//! Rule documents carry a top-level `rules` object mapping rule id to rule
//! definition. Entries that fail to deserialize or validate are skipped and
//! recorded; they never abort ingestion of the remaining rules.

use super::Rule;
use crate::error::ErrorContext;
use crate::{Error, Result};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A rule entry that was dropped during ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRule {
    /// Id (map key) of the dropped entry
    pub id: String,
    /// Why the entry was dropped
    pub reason: String,
}

/// An ordered collection of rules with unique ids.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    ids: HashSet<String>,
    skipped: Vec<SkippedRule>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rule set from rules, skipping invalid entries and duplicate ids.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut set = Self::new();
        for rule in rules {
            let id = rule.id.clone();
            if let Err(e) = set.push(rule) {
                set.skip(id, e.to_string());
            }
        }
        set
    }

    /// Parse a rule document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Parse a rule document from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(&value)
    }

    /// Build a rule set from a parsed document with a top-level `rules` object.
    pub fn from_value(document: &serde_json::Value) -> Result<Self> {
        let rules = document
            .get("rules")
            .ok_or_else(|| Error::parse("Rule document has no top-level 'rules' key"))?;
        Self::from_rules_value(rules)
    }

    /// Build a rule set from the `rules` object itself (id → rule).
    pub fn from_rules_value(rules: &serde_json::Value) -> Result<Self> {
        let entries = rules
            .as_object()
            .ok_or_else(|| Error::parse("'rules' must be an object keyed by rule id"))?;

        let mut set = Self::new();
        // serde_json maps iterate in key order, which keeps ingestion deterministic.
        for (key, entry) in entries {
            match parse_entry(key, entry) {
                Ok(rule) => {
                    if let Err(e) = set.push(rule) {
                        set.skip(key.clone(), e.to_string());
                    }
                }
                Err(e) => set.skip(key.clone(), e.to_string()),
            }
        }

        debug!(
            loaded = set.len(),
            skipped = set.skipped.len(),
            "Ingested rule document"
        );
        Ok(set)
    }

    /// Add a rule, rejecting invalid rules and duplicate ids.
    pub fn push(&mut self, rule: Rule) -> Result<()> {
        rule.validate()?;
        if self.ids.contains(&rule.id) {
            return Err(Error::validation_field(
                format!("Duplicate rule id: {}", rule.id),
                "id",
            ));
        }
        self.ids.insert(rule.id.clone());
        self.rules.push(rule);
        Ok(())
    }

    fn skip(&mut self, id: String, reason: String) {
        warn!(rule_id = %id, %reason, "Skipping invalid rule entry");
        self.skipped.push(SkippedRule { id, reason });
    }

    /// Rules in ingestion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Iterate rules in ingestion order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Rules sorted by id, for order-independent pairwise passes.
    pub fn sorted_by_id(&self) -> Vec<&Rule> {
        let mut sorted: Vec<&Rule> = self.rules.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        sorted
    }

    /// Find a rule by id.
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Whether a rule with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Entries dropped during ingestion.
    pub fn skipped(&self) -> &[SkippedRule] {
        &self.skipped
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::from_rules(iter)
    }
}

fn parse_entry(key: &str, entry: &serde_json::Value) -> Result<Rule> {
    let mut entry = entry.clone();
    let object = entry
        .as_object_mut()
        .ok_or_else(|| Error::validation(format!("Rule '{}' is not an object", key)))?;
    // The map key is the rule's identity.
    object.insert("id".to_string(), serde_json::Value::String(key.to_string()));

    let rule: Rule = serde_json::from_value(entry).map_err(|e| {
        Error::validation(format!("Rule '{}' does not match the rule shape: {}", key, e))
    })?;
    rule.validate().with_rule(key)?;
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleAction;

    #[test]
    fn test_from_json_uses_map_keys_as_ids() {
        let set = RuleSet::from_json(
            r#"{"rules": {
                "r2": {"pattern": "b", "action": "allow"},
                "r1": {"pattern": "a", "action": "block", "applies_to": ["request"]}
            }}"#,
        )
        .unwrap();

        assert_eq!(set.len(), 2);
        let ids: Vec<_> = set.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
        assert!(set.get("r1").unwrap().applies_to.contains("request"));
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let set = RuleSet::from_json(
            r#"{"rules": {
                "ok": {"pattern": "a", "action": "flag"},
                "no-action": {"pattern": "b"},
                "bad-action": {"pattern": "c", "action": "explode"},
                "not-object": 42
            }}"#,
        )
        .unwrap();

        assert_eq!(set.len(), 1);
        assert!(set.contains("ok"));
        let skipped: Vec<_> = set.skipped().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(skipped, vec!["bad-action", "no-action", "not-object"]);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
rules:
  pw:
    pattern: "password\\s*="
    action: block
    endpoints: ["/api/*"]
"#;
        let set = RuleSet::from_yaml(yaml).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.rules()[0].endpoints, vec!["/api/*"]);
    }

    #[test]
    fn test_missing_rules_key() {
        assert!(RuleSet::from_json(r#"{"policies": {}}"#).is_err());
        assert!(RuleSet::from_json(r#"{"rules": []}"#).is_err());
    }

    #[test]
    fn test_empty_rules_object() {
        let set = RuleSet::from_json(r#"{"rules": {}}"#).unwrap();
        assert!(set.is_empty());
        assert!(set.skipped().is_empty());
    }

    #[test]
    fn test_duplicate_ids_skipped() {
        let set = RuleSet::from_rules(vec![
            Rule::new("r1", RuleAction::Block),
            Rule::new("r1", RuleAction::Allow),
        ]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.rules()[0].action, RuleAction::Block);
        assert_eq!(set.skipped().len(), 1);
    }

    #[test]
    fn test_sorted_by_id_keeps_insertion_order_intact() {
        let set = RuleSet::from_rules(vec![
            Rule::new("b", RuleAction::Block),
            Rule::new("a", RuleAction::Block),
        ]);
        let sorted: Vec<_> = set.sorted_by_id().iter().map(|r| r.id.clone()).collect();
        assert_eq!(sorted, vec!["a", "b"]);
        assert_eq!(set.rules()[0].id, "b");
    }
}
