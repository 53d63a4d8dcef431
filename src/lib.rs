//! # Policy Rule Analyzer
//!
//! Offline analysis of content-inspection rule sets. Given rules made of a
//! pattern, an enforcement action and a scope, the analyzer finds logical
//! defects between them and proposes explainable improvements.
//!
//! ## Features
//!
//! - **Conflict Detection**: overlapping patterns, contradictory actions,
//!   scope conflicts, redundant rules and precedence hazards
//! - **Recommendations**: performance tuning, security gaps, pattern quality
//!   and compliance alignment
//! - **Coverage Gaps**: pluggable gap analyses over endpoints, content
//!   locations, regulation areas and time windows
//! - **Reports**: prioritised summaries with next actions
//!
//! Patterns are compared as plain text and never compiled.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use policy_rule_analyzer::{AnalysisRequest, RuleAnalyzer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyzer = RuleAnalyzer::builder()
//!         .with_cache_enabled(true)
//!         .build()?;
//!
//!     let request = AnalysisRequest::from_json(
//!         r#"{"rules": {
//!             "R1": {"pattern": "api[_-]?key=...", "action": "block"},
//!             "R2": {"pattern": "api[_-]?key=...", "action": "allow"}
//!         }}"#,
//!     )?;
//!
//!     let report = analyzer.analyze(&request);
//!     for action in &report.next_actions {
//!         println!("{}", action);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod gaps;
pub mod recommend;
pub mod rule;
pub mod telemetry;

// Re-export main types for convenience
pub use api::{AnalysisReport, AnalysisRequest, ReportSummary, RuleAnalyzer, RuleAnalyzerBuilder};
pub use config::Config;
pub use core::{Conflict, ConflictType, ExactOnlyBackend, SimilarityBackend};
pub use error::{Error, Result};
pub use gaps::{CoverageGap, EvaluationRecord, GapAnalysis, GapType, RiskLevel};
pub use recommend::{
    PerformanceData, Priority, Recommendation, RecommendationType, RulePerformance,
};
pub use rule::{Rule, RuleAction, RuleSet, Severity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
