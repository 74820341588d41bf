//! # SEI Benchmark Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! PostgreSQL database holding benchmarks, their imported assessment records
//! and the derived results computed from them.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** All SQL lives here. Callers see `core_types` and
//!   `analytics` values, never rows.
//! - **Bound Parameters:** Segment criteria are pushed into SQL through `QueryBuilder`
//!   with bound values, never string interpolation.
//! - **Replace Semantics:** Regenerating a derived result deletes and re-inserts it in
//!   one transaction. Readers never see a partial set.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: open the pool and apply the embedded schema.
//! - `DbRepository`: benchmark metadata, record loading (optionally narrowed to a
//!   segment) and storage of top-performer and correlation results.
//! - `StoredResult`: a stored result together with the time it was computed.
//! - `DbError`: connection, query, migration and corrupt-row failures.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{DbBenchmark, DbRepository, StoredResult};
