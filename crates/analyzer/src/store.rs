use analytics::{CorrelationResult, TopPerformerOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{AssessmentRecord, Benchmark, MetricKey, SegmentFilter};
use database::{DbError, DbRepository, StoredResult};

/// Where benchmarks, their records and derived results live.
///
/// The analyzer only talks to storage through this trait, so the service can be
/// exercised without a database.
#[async_trait]
pub trait BenchmarkStore: Send + Sync {
    async fn list_benchmarks(&self) -> Result<Vec<Benchmark>, DbError>;

    async fn fetch_benchmark_meta(&self, benchmark_id: &str) -> Result<Option<Benchmark>, DbError>;

    /// The records of a benchmark, or of one segment of it.
    async fn fetch_records(
        &self,
        benchmark_id: &str,
        segment: Option<&SegmentFilter>,
    ) -> Result<Vec<AssessmentRecord>, DbError>;

    /// Replaces the stored result for `result.outcome()`.
    async fn save_top_performers(
        &self,
        benchmark_id: &str,
        result: &TopPerformerOutcome,
    ) -> Result<DateTime<Utc>, DbError>;

    async fn get_top_performers(
        &self,
        benchmark_id: &str,
        outcome: MetricKey,
    ) -> Result<Option<StoredResult<TopPerformerOutcome>>, DbError>;

    /// Replaces every stored correlation of the benchmark.
    async fn save_correlations(
        &self,
        benchmark_id: &str,
        results: &[CorrelationResult],
    ) -> Result<DateTime<Utc>, DbError>;

    async fn get_correlations(
        &self,
        benchmark_id: &str,
    ) -> Result<Option<StoredResult<Vec<CorrelationResult>>>, DbError>;
}

#[async_trait]
impl BenchmarkStore for DbRepository {
    async fn list_benchmarks(&self) -> Result<Vec<Benchmark>, DbError> {
        DbRepository::list_benchmarks(self).await
    }

    async fn fetch_benchmark_meta(&self, benchmark_id: &str) -> Result<Option<Benchmark>, DbError> {
        DbRepository::fetch_benchmark_meta(self, benchmark_id).await
    }

    async fn fetch_records(
        &self,
        benchmark_id: &str,
        segment: Option<&SegmentFilter>,
    ) -> Result<Vec<AssessmentRecord>, DbError> {
        DbRepository::fetch_records(self, benchmark_id, segment).await
    }

    async fn save_top_performers(
        &self,
        benchmark_id: &str,
        result: &TopPerformerOutcome,
    ) -> Result<DateTime<Utc>, DbError> {
        DbRepository::save_top_performers(self, benchmark_id, result).await
    }

    async fn get_top_performers(
        &self,
        benchmark_id: &str,
        outcome: MetricKey,
    ) -> Result<Option<StoredResult<TopPerformerOutcome>>, DbError> {
        DbRepository::get_top_performers(self, benchmark_id, outcome).await
    }

    async fn save_correlations(
        &self,
        benchmark_id: &str,
        results: &[CorrelationResult],
    ) -> Result<DateTime<Utc>, DbError> {
        DbRepository::save_correlations(self, benchmark_id, results).await
    }

    async fn get_correlations(
        &self,
        benchmark_id: &str,
    ) -> Result<Option<StoredResult<Vec<CorrelationResult>>>, DbError> {
        DbRepository::get_correlations(self, benchmark_id).await
    }
}
