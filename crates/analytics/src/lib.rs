//! # SEI Benchmark Analytics Engine
//!
//! This crate turns a benchmark's assessment records into descriptive
//! statistics, top-performer cohorts, competency/outcome correlations,
//! multi-column comparisons and a data-quality report.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of databases or
//!   HTTP. It depends only on `core-types` and `configuration` (Layer 0).
//! - **Stateless Calculation:** Every result is a function of the records and the
//!   configured policy. Recomputing gives the same answer, and a metric without data
//!   is an explicit `None`, never a panic.
//! - **Bounded Parallelism:** Per-metric, per-group and per-pair work fans out over
//!   the `AnalyticsEngine`'s own `rayon` pool.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: Entry point holding the worker pool and policy.
//! - `Statistics`, `GroupedStat`, `TopPerformerOutcome`, `CorrelationResult`,
//!   `ComparisonResult`, `DataQualityReport`: the result types.
//! - `export::comparison_to_csv`: CSV rendering of a comparison.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

pub mod comparison;
pub mod correlation;
pub mod data_quality;
pub mod engine;
pub mod error;
pub mod export;
pub mod grouped;
pub mod statistics;
pub mod top_performers;

// Re-export the key components to create a clean, public-facing API.
pub use comparison::{
    ColumnDifference, ComparisonColumn, ComparisonInput, ComparisonResult, MetricComparison,
    SignificantDifference,
};
pub use correlation::{
    CorrelationDirection, CorrelationResult, CorrelationStrength, OutcomeCorrelations,
};
pub use data_quality::{
    DataQualityReport, DuplicateGroup, DuplicateSummary, FieldCompleteness, Outlier, OutlierKind,
    OutlierReport, ReliabilityBucket, ReliabilityDistribution,
};
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use export::comparison_to_csv;
pub use grouped::{GroupedStat, UNKNOWN_GROUP};
pub use statistics::{OverallStat, Statistics};
pub use top_performers::{
    CohortStatistics, ConfidenceLevel, DimensionEffect, EmptyTopPerformers, TopPerformerOutcome,
    TopPerformerResult,
};
