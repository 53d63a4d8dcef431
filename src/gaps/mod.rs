//! Coverage gap analysis.
//!
//! Gap analysis is pluggable: a [`CoverageGapAnalyzer`] runs a list of
//! [`GapAnalysis`] implementations over the same inputs and concatenates their
//! results. A sub-analysis without the input it needs returns no gaps.

mod analyses;

pub use analyses::{
    ContentPatternGapAnalysis, EndpointGapAnalysis, RegulationAreaGapAnalysis,
    TemporalGapAnalysis,
};

use crate::rule::RuleSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Dimension along which coverage is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    /// Endpoints seen in traffic that no rule scope covers
    Endpoint,
    /// Content locations seen in traffic that no rule inspects
    ContentPattern,
    /// Compliance areas without matching rules
    RegulationArea,
    /// Time windows without coverage
    Temporal,
}

impl GapType {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            GapType::Endpoint => "endpoint",
            GapType::ContentPattern => "content_pattern",
            GapType::RegulationArea => "regulation_area",
            GapType::Temporal => "temporal",
        }
    }
}

impl fmt::Display for GapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk of leaving a gap open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// High
    High,
    /// Medium
    Medium,
    /// Low
    Low,
}

/// An area with insufficient or no rule coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGap {
    /// Identifier derived from the gap type and scenarios
    pub gap_id: String,
    /// Dimension of the gap
    pub gap_type: GapType,
    /// What is uncovered
    pub description: String,
    /// Concrete uncovered cases
    #[serde(default)]
    pub uncovered_scenarios: Vec<String>,
    /// Draft rule stubs that would close the gap
    #[serde(default)]
    pub suggested_rules: Vec<serde_json::Value>,
    /// Risk of leaving the gap open
    pub risk_level: RiskLevel,
    /// Compliance consequences, if any
    #[serde(default)]
    pub compliance_implications: Vec<String>,
    /// When the gap was identified
    pub identified_at: DateTime<Utc>,
}

impl CoverageGap {
    /// Create a gap. The id is derived from the type and scenarios.
    pub fn new(
        gap_type: GapType,
        risk_level: RiskLevel,
        description: impl Into<String>,
        uncovered_scenarios: Vec<String>,
    ) -> Self {
        let key = format!("{}:{}", gap_type.as_str(), uncovered_scenarios.join("\u{1f}"));
        let hex = blake3::hash(key.as_bytes()).to_hex();

        Self {
            gap_id: format!("gap-{}", &hex.as_str()[..16]),
            gap_type,
            description: description.into(),
            uncovered_scenarios,
            suggested_rules: Vec::new(),
            risk_level,
            compliance_implications: Vec::new(),
            identified_at: Utc::now(),
        }
    }

    /// Add a draft rule stub.
    pub fn with_suggested_rule(mut self, rule: serde_json::Value) -> Self {
        self.suggested_rules.push(rule);
        self
    }

    /// Add a compliance implication.
    pub fn with_implication(mut self, implication: impl Into<String>) -> Self {
        self.compliance_implications.push(implication.into());
        self
    }
}

/// One observed rule evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationRecord {
    /// Endpoint the evaluated content was sent to
    pub endpoint: Option<String>,
    /// Content location, e.g. `request` or `response`
    pub content_location: Option<String>,
    /// Rules that matched
    pub matched_rules: Vec<String>,
    /// When the evaluation happened
    pub timestamp: Option<DateTime<Utc>>,
}

/// Inputs shared by every gap analysis.
#[derive(Debug, Clone, Copy)]
pub struct GapInput<'a> {
    /// Rules under analysis
    pub rules: &'a RuleSet,
    /// Observed evaluations, if any
    pub evaluation_history: Option<&'a [EvaluationRecord]>,
    /// Compliance frameworks in force, if any
    pub compliance_frameworks: Option<&'a [String]>,
}

impl<'a> GapInput<'a> {
    /// Inputs with only a rule set.
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            evaluation_history: None,
            compliance_frameworks: None,
        }
    }

    /// Attach evaluation history.
    pub fn with_history(mut self, history: &'a [EvaluationRecord]) -> Self {
        self.evaluation_history = Some(history);
        self
    }

    /// Attach compliance frameworks.
    pub fn with_frameworks(mut self, frameworks: &'a [String]) -> Self {
        self.compliance_frameworks = Some(frameworks);
        self
    }

    /// History, or an empty slice.
    pub fn history(&self) -> &'a [EvaluationRecord] {
        self.evaluation_history.unwrap_or(&[])
    }

    /// Frameworks, or an empty slice.
    pub fn frameworks(&self) -> &'a [String] {
        self.compliance_frameworks.unwrap_or(&[])
    }
}

/// A single coverage dimension.
pub trait GapAnalysis: Send + Sync + fmt::Debug {
    /// The gap type this analysis reports.
    fn gap_type(&self) -> GapType;

    /// Identify gaps. Returns an empty list when the needed input is absent.
    fn identify(&self, input: &GapInput<'_>) -> Vec<CoverageGap>;
}

/// Runs a list of gap analyses and concatenates their results.
#[derive(Debug)]
pub struct CoverageGapAnalyzer {
    analyses: Vec<Box<dyn GapAnalysis>>,
}

impl Default for CoverageGapAnalyzer {
    fn default() -> Self {
        Self::empty()
            .with_analysis(EndpointGapAnalysis)
            .with_analysis(ContentPatternGapAnalysis)
            .with_analysis(RegulationAreaGapAnalysis)
            .with_analysis(TemporalGapAnalysis)
    }
}

impl CoverageGapAnalyzer {
    /// Analyzer with the four built-in analyses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer with no analyses.
    pub fn empty() -> Self {
        Self {
            analyses: Vec::new(),
        }
    }

    /// Add an analysis; it runs after those already added.
    pub fn with_analysis(mut self, analysis: impl GapAnalysis + 'static) -> Self {
        self.push(Box::new(analysis));
        self
    }

    /// Add a boxed analysis; it runs after those already added.
    pub fn push(&mut self, analysis: Box<dyn GapAnalysis>) {
        self.analyses.push(analysis);
    }

    /// Number of registered analyses.
    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    /// Whether no analyses are registered.
    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    /// Run every analysis in registration order.
    pub fn identify(&self, input: &GapInput<'_>) -> Vec<CoverageGap> {
        let mut gaps = Vec::new();
        for analysis in &self.analyses {
            let found = analysis.identify(input);
            debug!(gap_type = %analysis.gap_type(), count = found.len(), "Gap analysis finished");
            gaps.extend(found);
        }
        gaps
    }
}

/// Run the built-in gap analyses.
pub fn identify_coverage_gaps(
    rules: &RuleSet,
    evaluation_history: Option<&[EvaluationRecord]>,
    compliance_frameworks: Option<&[String]>,
) -> Vec<CoverageGap> {
    let input = GapInput {
        rules,
        evaluation_history,
        compliance_frameworks,
    };
    CoverageGapAnalyzer::new().identify(&input)
}
