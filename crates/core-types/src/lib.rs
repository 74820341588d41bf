//! # SEI Benchmark Core Types
//!
//! Layer 0 of the workspace: the vocabulary every other crate speaks. It has no
//! behaviour beyond accessors and parsing.
//!
//! - `AssessmentRecord` and its score groups, with `metric()` access by `MetricKey`.
//! - `Benchmark` and its type/scope/status enums.
//! - `MetricKey`, the closed metric catalogue with stable wire names.
//! - `ScopeField` and `SegmentFilter` for grouping and segment selection.

pub mod enums;
pub mod error;
pub mod metrics;
pub mod scope;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{BenchmarkScope, BenchmarkStatus, BenchmarkType};
pub use error::CoreError;
pub use metrics::{MetricCategory, MetricKey};
pub use scope::{ScopeField, SegmentFilter};
pub use structs::{
    AssessmentRecord, Benchmark, CompetencyScores, OutcomeScores, PillarScores, ScopeAttributes,
    TalentScores,
};
