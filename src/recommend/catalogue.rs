//! Canonical sensitive-data pattern families and the compliance frameworks
//! that require them.

use crate::rule::{RuleAction, RuleSet, Severity};

use serde_json::json;

/// A family of sensitive data that a rule set is expected to cover.
#[derive(Debug, Clone, Copy)]
pub struct PatternFamily {
    /// Family name, e.g. `api-key`
    pub name: &'static str,
    /// Title for a drafted rule
    pub title: &'static str,
    /// Starting-point pattern for a drafted rule
    pub pattern: &'static str,
    /// Action for a drafted rule
    pub action: RuleAction,
    /// Severity for a drafted rule
    pub severity: Severity,
}

/// The fixed catalogue of families.
pub const PATTERN_FAMILIES: &[PatternFamily] = &[
    PatternFamily {
        name: "api-key",
        title: "API key exposure",
        pattern: r#"(?i)api[_-]?key\s*[:=]\s*['"]?[A-Za-z0-9_\-]{16,}"#,
        action: RuleAction::Block,
        severity: Severity::High,
    },
    PatternFamily {
        name: "password",
        title: "Password disclosure",
        pattern: r"(?i)passw(or)?d\s*[:=]\s*\S+",
        action: RuleAction::Block,
        severity: Severity::Critical,
    },
    PatternFamily {
        name: "credit-card",
        title: "Payment card number",
        pattern: r"\b(?:\d[ -]?){13,16}\b",
        action: RuleAction::Block,
        severity: Severity::Critical,
    },
    PatternFamily {
        name: "ssn",
        title: "US social security number",
        pattern: r"\b\d{3}-\d{2}-\d{4}\b",
        action: RuleAction::Block,
        severity: Severity::Critical,
    },
    PatternFamily {
        name: "email",
        title: "Email address",
        pattern: r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
        action: RuleAction::Flag,
        severity: Severity::Medium,
    },
    PatternFamily {
        name: "ip-address",
        title: "IP address",
        pattern: r"\b(?:\d{1,3}\.){3}\d{1,3}\b",
        action: RuleAction::Flag,
        severity: Severity::Low,
    },
    PatternFamily {
        name: "url",
        title: "Embedded URL",
        pattern: r"https?://[^\s/$.?#][^\s]*",
        action: RuleAction::Flag,
        severity: Severity::Low,
    },
    PatternFamily {
        name: "sql-injection",
        title: "SQL injection attempt",
        pattern: r"(?i)\bunion\b.+\bselect\b|\bor\b\s+1\s*=\s*1|;\s*drop\s+table",
        action: RuleAction::Block,
        severity: Severity::High,
    },
    PatternFamily {
        name: "xss",
        title: "Cross-site scripting payload",
        pattern: r"(?i)<script[^>]*>|javascript:|\bon\w+\s*=",
        action: RuleAction::Block,
        severity: Severity::High,
    },
    PatternFamily {
        name: "file-path",
        title: "File path traversal",
        pattern: r"\.\./|/etc/passwd|[A-Za-z]:\\",
        action: RuleAction::Flag,
        severity: Severity::Medium,
    },
];

impl PatternFamily {
    /// Look up a family by name.
    pub fn find(name: &str) -> Option<&'static PatternFamily> {
        PATTERN_FAMILIES.iter().find(|f| f.name == name)
    }

    /// Name without separators, matched against rule patterns.
    pub fn key(&self) -> String {
        strip_separators(self.name)
    }

    /// Whether any rule pattern mentions this family (case-insensitive).
    pub fn is_covered_by(&self, rules: &RuleSet) -> bool {
        let key = self.key();
        rules
            .iter()
            .filter_map(|rule| rule.pattern_text())
            .any(|pattern| pattern.to_lowercase().contains(&key))
    }

    /// Draft rule stub in the rule document shape.
    pub fn draft_rule(&self) -> serde_json::Value {
        json!({
            "id": format!("suggested-{}", self.name),
            "title": self.title,
            "pattern": self.pattern,
            "action": self.action,
            "severity": self.severity,
            "applies_to": ["request", "response"],
        })
    }
}

/// Families from the catalogue that no rule covers, in catalogue order.
pub fn missing_families(rules: &RuleSet) -> Vec<&'static PatternFamily> {
    PATTERN_FAMILIES
        .iter()
        .filter(|family| !family.is_covered_by(rules))
        .collect()
}

/// A compliance framework and the data families it requires rules for.
#[derive(Debug, Clone, Copy)]
pub struct ComplianceFramework {
    /// Framework tag, e.g. `pci-dss`
    pub name: &'static str,
    /// Required pattern family names
    pub families: &'static [&'static str],
}

/// Known frameworks.
pub const COMPLIANCE_FRAMEWORKS: &[ComplianceFramework] = &[
    ComplianceFramework {
        name: "pci-dss",
        families: &["credit-card"],
    },
    ComplianceFramework {
        name: "hipaa",
        families: &["ssn", "email"],
    },
    ComplianceFramework {
        name: "gdpr",
        families: &["email", "ip-address"],
    },
    ComplianceFramework {
        name: "soc2",
        families: &["api-key", "password"],
    },
];

impl ComplianceFramework {
    /// Look up a framework tag, ignoring case and separators (`PCI_DSS`, `pci dss`).
    pub fn find(tag: &str) -> Option<&'static ComplianceFramework> {
        let wanted = strip_separators(&tag.to_lowercase());
        COMPLIANCE_FRAMEWORKS
            .iter()
            .find(|f| strip_separators(f.name) == wanted)
    }

    /// Required families that no rule covers.
    pub fn missing_families(&self, rules: &RuleSet) -> Vec<&'static PatternFamily> {
        self.families
            .iter()
            .filter_map(|name| PatternFamily::find(name))
            .filter(|family| !family.is_covered_by(rules))
            .collect()
    }
}

fn strip_separators(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' ' | '.'))
        .collect()
}
