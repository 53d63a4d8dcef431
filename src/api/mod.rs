//! Public API for the rule analyzer.
//!
//! [`RuleAnalyzer`] is the entry point. [`AnalysisRequest`] is the document a
//! caller submits and [`AnalysisReport`] is what comes back.

mod engine;
mod report;
mod request;

pub use engine::{AnalyzerMetrics, RuleAnalyzer, RuleAnalyzerBuilder};
pub use report::{aggregate, AnalysisReport, ReportSummary, CRITICAL_CONFIDENCE};
pub use request::AnalysisRequest;
