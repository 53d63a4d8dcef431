//! Conflict findings produced by the detectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Kind of defect detected between rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Patterns are lexically similar enough to match the same content
    OverlappingPatterns,
    /// Equivalent patterns prescribe block and allow
    ContradictoryActions,
    /// Overlapping endpoint scopes with different actions
    ScopeConflicts,
    /// Duplicate rules
    RedundantRules,
    /// A general rule precedes a more specific overlapping one
    PrecedenceIssues,
}

impl ConflictType {
    /// All conflict types in detection order.
    pub const ALL: [ConflictType; 5] = [
        ConflictType::OverlappingPatterns,
        ConflictType::ContradictoryActions,
        ConflictType::ScopeConflicts,
        ConflictType::RedundantRules,
        ConflictType::PrecedenceIssues,
    ];

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::OverlappingPatterns => "overlapping_patterns",
            ConflictType::ContradictoryActions => "contradictory_actions",
            ConflictType::ScopeConflicts => "scope_conflicts",
            ConflictType::RedundantRules => "redundant_rules",
            ConflictType::PrecedenceIssues => "precedence_issues",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected defect between two or more rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Stable id derived from the conflict type and the involved rule ids
    pub conflict_id: String,
    /// Kind of conflict
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    /// Involved rule ids, sorted and deduplicated
    pub rule_ids: Vec<String>,
    /// What was detected
    pub description: String,
    /// What the defect means for enforcement
    pub impact_assessment: String,
    /// Remedies, most direct first
    #[serde(default)]
    pub resolution_suggestions: Vec<String>,
    /// Detector certainty in `[0, 1]`
    pub confidence_score: f64,
    /// When the conflict was detected
    pub detected_at: DateTime<Utc>,
}

impl Conflict {
    /// Create a conflict. Rule ids are sorted and deduplicated, and the id is
    /// derived from them so unchanged input yields unchanged ids.
    pub fn new(
        conflict_type: ConflictType,
        rule_ids: impl IntoIterator<Item = impl Into<String>>,
        description: impl Into<String>,
    ) -> Self {
        let mut rule_ids: Vec<String> = rule_ids.into_iter().map(Into::into).collect();
        rule_ids.sort();
        rule_ids.dedup();

        Self {
            conflict_id: conflict_id(conflict_type, &rule_ids),
            conflict_type,
            rule_ids,
            description: description.into(),
            impact_assessment: String::new(),
            resolution_suggestions: Vec::new(),
            confidence_score: 0.0,
            detected_at: Utc::now(),
        }
    }

    /// Set the impact assessment.
    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact_assessment = impact.into();
        self
    }

    /// Add a resolution suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.resolution_suggestions.push(suggestion.into());
        self
    }

    /// Set the confidence score, clamped to `[0, 1]`.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence_score = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }
}

fn conflict_id(conflict_type: ConflictType, rule_ids: &[String]) -> String {
    let key = format!("{}:{}", conflict_type.as_str(), rule_ids.join("\u{1f}"));
    let hex = blake3::hash(key.as_bytes()).to_hex();
    format!("conflict-{}", &hex.as_str()[..16])
}

/// Ordered collection that keeps one conflict per type and rule-id set.
#[derive(Debug, Default)]
pub struct ConflictSet {
    conflicts: Vec<Conflict>,
    seen: HashSet<(ConflictType, Vec<String>)>,
}

impl ConflictSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a conflict unless one of the same type over the same rules exists.
    /// Returns whether it was inserted.
    pub fn insert(&mut self, conflict: Conflict) -> bool {
        let key = (conflict.conflict_type, conflict.rule_ids.clone());
        if !self.seen.insert(key) {
            return false;
        }
        self.conflicts.push(conflict);
        true
    }

    /// Insert every conflict from an iterator.
    pub fn extend(&mut self, conflicts: impl IntoIterator<Item = Conflict>) {
        for conflict in conflicts {
            self.insert(conflict);
        }
    }

    /// Number of conflicts.
    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Consume the set, returning conflicts in insertion order.
    pub fn into_vec(self) -> Vec<Conflict> {
        self.conflicts
    }
}
