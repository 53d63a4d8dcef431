//! In-process analysis counters.
//!
//! Counters are plain atomics and can be read at any time with
//! [`Telemetry::metrics`]. Nothing is exported; callers decide where the
//! snapshot goes.

use crate::config::TelemetryConfig;
use crate::core::{Conflict, ConflictType};
use crate::Result;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for analyzer activity.
#[derive(Debug)]
pub struct Telemetry {
    config: TelemetryConfig,
    analysis_runs: AtomicU64,
    /// Conflicts by type, indexed like [`ConflictType::ALL`]
    conflicts: [AtomicU64; 5],
    recommendations: AtomicU64,
    coverage_gaps: AtomicU64,
    rules_skipped: AtomicU64,
    cache_hits: AtomicU64,
    total_analysis_time_us: AtomicU64,
}

impl Telemetry {
    /// Create a new telemetry instance.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        if config.service_name.trim().is_empty() {
            return Err(crate::Error::config_key(
                "service_name cannot be empty",
                "telemetry.service_name",
            ));
        }

        Ok(Self {
            config: config.clone(),
            analysis_runs: AtomicU64::new(0),
            conflicts: Default::default(),
            recommendations: AtomicU64::new(0),
            coverage_gaps: AtomicU64::new(0),
            rules_skipped: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            total_analysis_time_us: AtomicU64::new(0),
        })
    }

    /// Record one conflict analysis run.
    pub fn record_conflict_analysis(&self, conflicts: &[Conflict], elapsed: Duration, cached: bool) {
        self.analysis_runs.fetch_add(1, Ordering::Relaxed);
        for conflict in conflicts {
            self.conflicts[type_index(conflict.conflict_type)].fetch_add(1, Ordering::Relaxed);
        }
        if cached {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
        self.total_analysis_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record generated recommendations.
    pub fn record_recommendations(&self, count: usize) {
        self.recommendations.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record identified coverage gaps.
    pub fn record_coverage_gaps(&self, count: usize) {
        self.coverage_gaps.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record rule entries dropped during ingestion.
    pub fn record_skipped_rules(&self, count: usize) {
        self.rules_skipped.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get current metrics.
    pub fn metrics(&self) -> TelemetryMetrics {
        let analysis_runs = self.analysis_runs.load(Ordering::Relaxed);
        let total_time_us = self.total_analysis_time_us.load(Ordering::Relaxed);
        let avg_analysis_time_ms = if analysis_runs > 0 {
            (total_time_us as f64 / analysis_runs as f64) / 1000.0
        } else {
            0.0
        };

        let conflicts_by_type = ConflictType::ALL
            .iter()
            .map(|t| ConflictCount {
                conflict_type: *t,
                count: self.conflicts[type_index(*t)].load(Ordering::Relaxed),
            })
            .collect::<Vec<_>>();

        TelemetryMetrics {
            analysis_runs,
            total_conflicts: conflicts_by_type.iter().map(|c| c.count).sum(),
            conflicts_by_type,
            recommendations: self.recommendations.load(Ordering::Relaxed),
            coverage_gaps: self.coverage_gaps.load(Ordering::Relaxed),
            rules_skipped: self.rules_skipped.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            avg_analysis_time_ms,
        }
    }

    /// Check if telemetry is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Get the service name.
    pub fn service_name(&self) -> &str {
        &self.config.service_name
    }
}

fn type_index(conflict_type: ConflictType) -> usize {
    match conflict_type {
        ConflictType::OverlappingPatterns => 0,
        ConflictType::ContradictoryActions => 1,
        ConflictType::ScopeConflicts => 2,
        ConflictType::RedundantRules => 3,
        ConflictType::PrecedenceIssues => 4,
    }
}

/// Conflict count for one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCount {
    /// Conflict type
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    /// Number detected
    pub count: u64,
}

/// Snapshot of telemetry counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryMetrics {
    /// Number of conflict analysis runs
    pub analysis_runs: u64,
    /// Conflicts detected across all runs
    pub total_conflicts: u64,
    /// Conflicts detected per type
    pub conflicts_by_type: Vec<ConflictCount>,
    /// Recommendations generated
    pub recommendations: u64,
    /// Coverage gaps identified
    pub coverage_gaps: u64,
    /// Rule entries skipped during ingestion
    pub rules_skipped: u64,
    /// Runs served from the conflict cache
    pub cache_hits: u64,
    /// Average conflict analysis time in milliseconds
    pub avg_analysis_time_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_creation() {
        let telemetry = Telemetry::new(&TelemetryConfig::default()).unwrap();
        assert!(telemetry.is_enabled());
        assert_eq!(telemetry.service_name(), "policy-rule-analyzer");

        let config = TelemetryConfig {
            service_name: " ".to_string(),
            ..Default::default()
        };
        assert!(Telemetry::new(&config).is_err());
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = Telemetry::new(&TelemetryConfig::default()).unwrap().metrics();
        assert_eq!(metrics.analysis_runs, 0);
        assert_eq!(metrics.avg_analysis_time_ms, 0.0);
        assert_eq!(metrics.conflicts_by_type.len(), 5);
    }

    #[test]
    fn test_record_analysis() {
        let telemetry = Telemetry::new(&TelemetryConfig::default()).unwrap();
        let conflicts = vec![
            Conflict::new(ConflictType::RedundantRules, ["a", "b"], "dup"),
            Conflict::new(ConflictType::ScopeConflicts, ["a", "c"], "scope"),
            Conflict::new(ConflictType::ScopeConflicts, ["b", "c"], "scope"),
        ];

        telemetry.record_conflict_analysis(&conflicts, Duration::from_millis(4), false);
        telemetry.record_conflict_analysis(&conflicts, Duration::from_millis(2), true);
        telemetry.record_recommendations(3);
        telemetry.record_coverage_gaps(1);
        telemetry.record_skipped_rules(2);

        let metrics = telemetry.metrics();
        assert_eq!(metrics.analysis_runs, 2);
        assert_eq!(metrics.total_conflicts, 6);
        let scope = metrics
            .conflicts_by_type
            .iter()
            .find(|c| c.conflict_type == ConflictType::ScopeConflicts)
            .unwrap();
        assert_eq!(scope.count, 4);
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.recommendations, 3);
        assert_eq!(metrics.rules_skipped, 2);
        assert_eq!(metrics.avg_analysis_time_ms, 3.0);
    }
}
