//! Rule analyzer implementation.

use super::report::{aggregate, AnalysisReport};
use super::request::AnalysisRequest;
use crate::cache::{CacheStats, ConflictCache};
use crate::config::Config;
use crate::core::backend::{self, SimilarityBackend};
use crate::core::{detect_conflicts, Conflict};
use crate::gaps::{CoverageGap, CoverageGapAnalyzer, EvaluationRecord, GapAnalysis, GapInput};
use crate::recommend::{self, PerformanceData, Recommendation};
use crate::rule::RuleSet;
use crate::telemetry::{Telemetry, TelemetryMetrics};
use crate::Result;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, instrument};

/// Results of the most recent call to each analysis operation.
#[derive(Debug, Default)]
struct LastRun {
    conflicts: Vec<Conflict>,
    recommendations: Vec<Recommendation>,
    coverage_gaps: Vec<CoverageGap>,
}

/// The rule analyzer.
///
/// Every operation computes its result from its arguments and returns it. The
/// analyzer also remembers the latest result of each operation so that
/// [`RuleAnalyzer::build_report`] can combine them; each slot reflects the most
/// recently completed call.
#[derive(Debug)]
pub struct RuleAnalyzer {
    /// Configuration
    config: Config,
    /// Similarity backend, chosen at construction
    backend: Box<dyn SimilarityBackend>,
    /// Gap analyses
    gap_analyzer: CoverageGapAnalyzer,
    /// Conflict result cache
    cache: Option<ConflictCache>,
    /// Telemetry instance
    telemetry: Option<Telemetry>,
    /// Latest results
    last_run: RwLock<LastRun>,
}

impl RuleAnalyzer {
    /// Create a rule analyzer builder.
    pub fn builder() -> RuleAnalyzerBuilder {
        RuleAnalyzerBuilder::new()
    }

    /// Create a new rule analyzer with the given configuration.
    pub fn new(config: Config) -> Self {
        let cache = if config.cache.enabled {
            Some(ConflictCache::new(config.cache.max_entries, config.cache.ttl()))
        } else {
            None
        };

        Self {
            backend: backend::probe(&config.analysis),
            gap_analyzer: CoverageGapAnalyzer::new(),
            cache,
            telemetry: None,
            last_run: RwLock::new(LastRun::default()),
            config,
        }
    }

    /// Detect conflicts between rules.
    ///
    /// Unchanged input yields an identical list: same ids, order and
    /// confidences.
    #[instrument(skip(self, rules), fields(rules = rules.len(), backend = self.backend.name()))]
    pub fn analyze_conflicts(&self, rules: &RuleSet) -> Vec<Conflict> {
        let start = Instant::now();

        let key = self
            .cache
            .as_ref()
            .map(|_| ConflictCache::fingerprint(rules, self.backend.name()));

        let cached = match (&self.cache, &key) {
            (Some(cache), Some(key)) => cache.get(key),
            _ => None,
        };
        let was_cached = cached.is_some();

        let conflicts = match cached {
            Some(conflicts) => conflicts,
            None => {
                let conflicts =
                    detect_conflicts(rules, self.backend.as_ref(), &self.config.analysis);
                if let (Some(cache), Some(key)) = (&self.cache, key) {
                    cache.put(key, &conflicts);
                }
                conflicts
            }
        };

        if let Some(ref telemetry) = self.telemetry {
            telemetry.record_conflict_analysis(&conflicts, start.elapsed(), was_cached);
        }
        info!(conflicts = conflicts.len(), cached = was_cached, "Conflict analysis finished");

        self.last_run.write().conflicts = conflicts.clone();
        conflicts
    }

    /// Generate improvement recommendations.
    #[instrument(skip_all, fields(rules = rules.len()))]
    pub fn generate_recommendations(
        &self,
        rules: &RuleSet,
        performance: Option<&PerformanceData>,
        compliance_requirements: Option<&[String]>,
    ) -> Vec<Recommendation> {
        let recommendations = recommend::generate_recommendations(
            rules,
            performance,
            compliance_requirements,
            &self.config.recommendations,
        );

        if let Some(ref telemetry) = self.telemetry {
            telemetry.record_recommendations(recommendations.len());
        }
        info!(recommendations = recommendations.len(), "Recommendations generated");

        self.last_run.write().recommendations = recommendations.clone();
        recommendations
    }

    /// Identify coverage gaps.
    #[instrument(skip_all, fields(rules = rules.len()))]
    pub fn identify_coverage_gaps(
        &self,
        rules: &RuleSet,
        evaluation_history: Option<&[EvaluationRecord]>,
        compliance_frameworks: Option<&[String]>,
    ) -> Vec<CoverageGap> {
        let input = GapInput {
            rules,
            evaluation_history,
            compliance_frameworks,
        };
        let gaps = self.gap_analyzer.identify(&input);

        if let Some(ref telemetry) = self.telemetry {
            telemetry.record_coverage_gaps(gaps.len());
        }
        info!(gaps = gaps.len(), "Coverage gaps identified");

        self.last_run.write().coverage_gaps = gaps.clone();
        gaps
    }

    /// Build a report from the latest result of each operation.
    pub fn build_report(&self) -> AnalysisReport {
        let last = self.last_run.read();
        aggregate(
            last.conflicts.clone(),
            last.recommendations.clone(),
            last.coverage_gaps.clone(),
        )
    }

    /// Run every analysis over a request and report on exactly those results.
    #[instrument(skip_all, fields(rules = request.rules.len()))]
    pub fn analyze(&self, request: &AnalysisRequest) -> AnalysisReport {
        let rules = &request.rules;
        if let Some(ref telemetry) = self.telemetry {
            telemetry.record_skipped_rules(rules.skipped().len());
        }

        let conflicts = self.analyze_conflicts(rules);
        let recommendations = self.generate_recommendations(
            rules,
            request.performance_data.as_ref(),
            request.compliance_requirements.as_deref(),
        );
        let gaps = self.identify_coverage_gaps(
            rules,
            request.evaluation_history.as_deref(),
            request.compliance_frameworks.as_deref(),
        );

        aggregate(conflicts, recommendations, gaps)
    }

    /// Forget the latest results.
    pub fn reset(&self) {
        *self.last_run.write() = LastRun::default();
    }

    /// Name of the active similarity backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Clear the conflict cache.
    pub fn clear_cache(&self) {
        if let Some(ref cache) = self.cache {
            cache.clear();
        }
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    /// Get analyzer metrics.
    pub fn metrics(&self) -> AnalyzerMetrics {
        AnalyzerMetrics {
            backend: self.backend_name().to_string(),
            cache_enabled: self.cache.is_some(),
            cache_stats: self.cache_stats(),
            telemetry: self.telemetry.as_ref().map(|t| t.metrics()),
        }
    }
}

/// Builder for creating a RuleAnalyzer.
#[derive(Debug, Default)]
pub struct RuleAnalyzerBuilder {
    config: Option<Config>,
    backend: Option<Box<dyn SimilarityBackend>>,
    gap_analyses: Vec<Box<dyn GapAnalysis>>,
    telemetry_enabled: Option<bool>,
    cache_enabled: Option<bool>,
    cache_size: Option<usize>,
}

impl RuleAnalyzerBuilder {
    /// Create a new rule analyzer builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a specific similarity backend instead of probing for one.
    pub fn with_backend(mut self, backend: impl SimilarityBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    /// Register an additional gap analysis.
    pub fn with_gap_analysis(mut self, analysis: impl GapAnalysis + 'static) -> Self {
        self.gap_analyses.push(Box::new(analysis));
        self
    }

    /// Enable or disable telemetry.
    pub fn with_telemetry_enabled(mut self, enabled: bool) -> Self {
        self.telemetry_enabled = Some(enabled);
        self
    }

    /// Enable or disable caching.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = Some(enabled);
        self
    }

    /// Set the cache size.
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = Some(size);
        self
    }

    /// Build the rule analyzer.
    pub fn build(self) -> Result<RuleAnalyzer> {
        let mut config = self.config.unwrap_or_default();

        if let Some(enabled) = self.cache_enabled {
            config.cache.enabled = enabled;
        }
        if let Some(size) = self.cache_size {
            config.cache.max_entries = size;
        }
        if let Some(enabled) = self.telemetry_enabled {
            config.telemetry.enabled = enabled;
        }
        config.validate()?;

        let mut analyzer = RuleAnalyzer::new(config);

        if let Some(backend) = self.backend {
            analyzer.backend = backend;
        }
        for analysis in self.gap_analyses {
            analyzer.gap_analyzer.push(analysis);
        }
        if analyzer.config.telemetry.enabled {
            analyzer.telemetry = Some(Telemetry::new(&analyzer.config.telemetry)?);
        }

        Ok(analyzer)
    }
}

/// Analyzer metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerMetrics {
    /// Active similarity backend
    pub backend: String,
    /// Whether caching is enabled
    pub cache_enabled: bool,
    /// Cache statistics (if caching is enabled)
    pub cache_stats: Option<CacheStats>,
    /// Telemetry counters (if telemetry is enabled)
    pub telemetry: Option<TelemetryMetrics>,
}
