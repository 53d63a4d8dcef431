//! Endpoint scope conflict detection.
//!
//! Scope overlap is literal: equal strings overlap, and a scope ending in `/*`
//! overlaps any scope that starts with the text before the `/*`, so `/api/*`
//! covers `/api`, `/api/users` and `/apiary`.
//! Other wildcard forms such as `/api/**` or `/api/*/users` are unsupported and
//! only ever match themselves exactly.

use crate::core::conflict::{Conflict, ConflictType};
use crate::rule::{Rule, RuleSet};

use std::collections::BTreeSet;
use tracing::warn;

/// Confidence assigned to every scope conflict.
pub const SCOPE_CONFIDENCE: f64 = 0.8;

/// Flag rule pairs with different actions whose endpoint scopes overlap.
pub fn detect(rules: &RuleSet) -> Vec<Conflict> {
    let scoped: Vec<&Rule> = rules
        .sorted_by_id()
        .into_iter()
        .filter(|rule| !rule.endpoints.is_empty())
        .collect();

    warn_unsupported_wildcards(&scoped);

    let mut conflicts = Vec::new();
    for (i, a) in scoped.iter().enumerate() {
        for b in &scoped[i + 1..] {
            if a.action == b.action {
                continue;
            }
            let overlaps = overlapping_endpoints(&a.endpoints, &b.endpoints);
            if !overlaps.is_empty() {
                conflicts.push(scope_conflict(a, b, &overlaps));
            }
        }
    }
    conflicts
}

/// Whether two endpoint scopes overlap.
pub fn endpoints_overlap(a: &str, b: &str) -> bool {
    a == b || wildcard_covers(a, b) || wildcard_covers(b, a)
}

/// Whether `scope` is a one-level `/*` wildcard covering `other`.
pub fn wildcard_covers(scope: &str, other: &str) -> bool {
    match one_level_prefix(scope) {
        Some(prefix) => other.starts_with(prefix),
        None => false,
    }
}

/// The literal prefix of a supported `/*` wildcard scope, without the `/*`.
fn one_level_prefix(scope: &str) -> Option<&str> {
    let prefix = scope.strip_suffix("/*")?;
    if prefix.contains('*') {
        None
    } else {
        Some(prefix)
    }
}

fn is_unsupported_wildcard(scope: &str) -> bool {
    scope.contains('*') && one_level_prefix(scope).is_none()
}

fn warn_unsupported_wildcards(rules: &[&Rule]) {
    for rule in rules {
        for endpoint in rule.endpoints.iter().filter(|e| is_unsupported_wildcard(e)) {
            warn!(
                rule_id = %rule.id,
                endpoint = %endpoint,
                "Unsupported wildcard scope; only a trailing '/*' is recognised, comparing literally"
            );
        }
    }
}

/// Endpoint strings from either list that overlap the other list.
fn overlapping_endpoints(a: &[String], b: &[String]) -> BTreeSet<String> {
    let mut overlaps = BTreeSet::new();
    for ea in a {
        for eb in b {
            if endpoints_overlap(ea, eb) {
                overlaps.insert(ea.clone());
                overlaps.insert(eb.clone());
            }
        }
    }
    overlaps
}

fn scope_conflict(a: &Rule, b: &Rule, overlaps: &BTreeSet<String>) -> Conflict {
    let endpoints = overlaps.iter().cloned().collect::<Vec<_>>().join(", ");
    Conflict::new(
        ConflictType::ScopeConflicts,
        [a.id.as_str(), b.id.as_str()],
        format!(
            "Rules '{}' ({}) and '{}' ({}) have overlapping endpoint scopes: {}",
            a.id, a.action, b.id, b.action, endpoints
        ),
    )
    .with_impact("Requests to the shared endpoints receive inconsistent enforcement")
    .with_suggestion("Make the endpoint scopes disjoint")
    .with_suggestion("Align the actions if both rules are meant to cover the shared endpoints")
    .with_confidence(SCOPE_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleAction;

    fn scoped(id: &str, action: RuleAction, endpoints: &[&str]) -> Rule {
        Rule::new(id, action).with_endpoints(endpoints.iter().copied())
    }

    #[test]
    fn test_endpoint_overlap_semantics() {
        assert!(endpoints_overlap("/api/users", "/api/users"));
        assert!(endpoints_overlap("/api/*", "/api/users"));
        assert!(endpoints_overlap("/api/users", "/api/*"));
        assert!(endpoints_overlap("/api/*", "/api/v1/*"));
        assert!(endpoints_overlap("/api/*", "/api"));
        assert!(endpoints_overlap("/api/*", "/apiary"));
        assert!(!endpoints_overlap("/api/*", "/health"));
        assert!(!endpoints_overlap("/api/users", "/api/orders"));
    }

    #[test]
    fn test_unsupported_wildcards_compare_literally() {
        assert!(!endpoints_overlap("/api/**", "/api/admin/*"));
        assert!(!endpoints_overlap("/api/*/users", "/api/v1/users"));
        assert!(endpoints_overlap("/api/**", "/api/**"));
        assert!(is_unsupported_wildcard("/api/**"));
        assert!(!is_unsupported_wildcard("/api/*"));
    }

    #[test]
    fn test_scope_conflict_detected() {
        let rules = RuleSet::from_rules(vec![
            scoped("r1", RuleAction::Block, &["/api/*"]),
            scoped("r2", RuleAction::Allow, &["/api/public", "/health"]),
        ]);
        let conflicts = detect(&rules);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].confidence_score, 0.8);
        assert!(conflicts[0].description.contains("/api/*, /api/public"));
        assert!(!conflicts[0].description.contains("/health"));
    }

    #[test]
    fn test_wildcard_covers_bare_prefix() {
        let rules = RuleSet::from_rules(vec![
            scoped("r1", RuleAction::Block, &["/api/*"]),
            scoped("r2", RuleAction::Allow, &["/api"]),
        ]);
        let conflicts = detect(&rules);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].rule_ids, vec!["r1", "r2"]);

        let rules = RuleSet::from_rules(vec![
            scoped("r1", RuleAction::Block, &["/api/*"]),
            scoped("r2", RuleAction::Allow, &["/apiary"]),
        ]);
        assert_eq!(detect(&rules).len(), 1);
    }

    #[test]
    fn test_same_action_not_a_conflict() {
        let rules = RuleSet::from_rules(vec![
            scoped("r1", RuleAction::Block, &["/api/*"]),
            scoped("r2", RuleAction::Block, &["/api/users"]),
        ]);
        assert!(detect(&rules).is_empty());
    }

    #[test]
    fn test_unscoped_rules_ignored() {
        let rules = RuleSet::from_rules(vec![
            scoped("r1", RuleAction::Block, &["/api/*"]),
            Rule::new("r2", RuleAction::Allow),
        ]);
        assert!(detect(&rules).is_empty());
    }
}
