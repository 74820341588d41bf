use crate::store::BenchmarkStore;
use analytics::{CorrelationResult, TopPerformerOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{
    AssessmentRecord, Benchmark, BenchmarkScope, BenchmarkStatus, BenchmarkType, MetricKey,
    SegmentFilter,
};
use database::{DbError, StoredResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// A `BenchmarkStore` held in memory, for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    benchmarks: Vec<Benchmark>,
    records: HashMap<String, Vec<AssessmentRecord>>,
    top_performers: Mutex<HashMap<(String, MetricKey), StoredResult<TopPerformerOutcome>>>,
    correlations: Mutex<HashMap<String, StoredResult<Vec<CorrelationResult>>>>,
}

/// A benchmark with the given status and neutral metadata.
pub fn benchmark(id: &str, name: &str, status: BenchmarkStatus) -> Benchmark {
    let now = Utc::now();
    Benchmark {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        benchmark_type: BenchmarkType::Internal,
        scope: BenchmarkScope::Global,
        status,
        total_rows: 0,
        created_at: now,
        updated_at: now,
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_benchmark(mut self, mut benchmark: Benchmark, records: Vec<AssessmentRecord>) -> Self {
        benchmark.total_rows = records.len() as i64;
        self.records.insert(benchmark.id.clone(), records);
        self.benchmarks.push(benchmark);
        self
    }
}

#[async_trait]
impl BenchmarkStore for InMemoryStore {
    async fn list_benchmarks(&self) -> Result<Vec<Benchmark>, DbError> {
        Ok(self.benchmarks.clone())
    }

    async fn fetch_benchmark_meta(&self, benchmark_id: &str) -> Result<Option<Benchmark>, DbError> {
        Ok(self.benchmarks.iter().find(|b| b.id == benchmark_id).cloned())
    }

    async fn fetch_records(
        &self,
        benchmark_id: &str,
        segment: Option<&SegmentFilter>,
    ) -> Result<Vec<AssessmentRecord>, DbError> {
        let records = self.records.get(benchmark_id).map(Vec::as_slice).unwrap_or_default();
        Ok(records
            .iter()
            .filter(|record| segment.is_none_or(|s| s.matches(record)))
            .cloned()
            .collect())
    }

    async fn save_top_performers(
        &self,
        benchmark_id: &str,
        result: &TopPerformerOutcome,
    ) -> Result<DateTime<Utc>, DbError> {
        let computed_at = Utc::now();
        let mut stored = self.top_performers.lock().unwrap_or_else(|e| e.into_inner());
        stored.insert(
            (benchmark_id.to_string(), result.outcome()),
            StoredResult {
                computed_at,
                result: result.clone(),
            },
        );
        Ok(computed_at)
    }

    async fn get_top_performers(
        &self,
        benchmark_id: &str,
        outcome: MetricKey,
    ) -> Result<Option<StoredResult<TopPerformerOutcome>>, DbError> {
        let stored = self.top_performers.lock().unwrap_or_else(|e| e.into_inner());
        Ok(stored.get(&(benchmark_id.to_string(), outcome)).cloned())
    }

    async fn save_correlations(
        &self,
        benchmark_id: &str,
        results: &[CorrelationResult],
    ) -> Result<DateTime<Utc>, DbError> {
        let computed_at = Utc::now();
        let mut stored = self.correlations.lock().unwrap_or_else(|e| e.into_inner());
        stored.insert(
            benchmark_id.to_string(),
            StoredResult {
                computed_at,
                result: results.to_vec(),
            },
        );
        Ok(computed_at)
    }

    async fn get_correlations(
        &self,
        benchmark_id: &str,
    ) -> Result<Option<StoredResult<Vec<CorrelationResult>>>, DbError> {
        let stored = self.correlations.lock().unwrap_or_else(|e| e.into_inner());
        Ok(stored.get(benchmark_id).cloned())
    }
}
