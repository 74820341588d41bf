//! # SEI Benchmark Analyzer
//!
//! The service layer between the surfaces (HTTP, CLI) and the engine. Each
//! operation validates the request, loads the benchmark's records from a
//! `BenchmarkStore`, runs the `AnalyticsEngine` on a blocking thread and, for
//! the regenerable results, replaces what was stored before.

use crate::error::AnalyzerError;
use analytics::{
    AnalyticsEngine, AnalyticsError, ComparisonInput, ComparisonResult, CorrelationResult,
    DataQualityReport, GroupedStat, OverallStat, TopPerformerOutcome,
};
use core_types::{AssessmentRecord, Benchmark, MetricKey, ScopeField, SegmentFilter};
use database::StoredResult;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;

pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod store;

pub use store::BenchmarkStore;

/// Runs the benchmark analyses against a store.
#[derive(Clone)]
pub struct BenchmarkAnalyzer {
    store: Arc<dyn BenchmarkStore>,
    engine: Arc<AnalyticsEngine>,
}

fn log_done(benchmark_id: &str, operation: &'static str, started: Instant) {
    tracing::info!(
        benchmark_id,
        operation,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Analysis finished."
    );
}

impl BenchmarkAnalyzer {
    pub fn new(store: Arc<dyn BenchmarkStore>, engine: Arc<AnalyticsEngine>) -> Self {
        Self { store, engine }
    }

    pub fn engine(&self) -> &AnalyticsEngine {
        &self.engine
    }

    pub async fn list_benchmarks(&self) -> Result<Vec<Benchmark>, AnalyzerError> {
        Ok(self.store.list_benchmarks().await?)
    }

    async fn existing_benchmark(&self, benchmark_id: &str) -> Result<Benchmark, AnalyzerError> {
        self.store
            .fetch_benchmark_meta(benchmark_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(benchmark_id, "Unknown benchmark requested.");
                AnalyzerError::BenchmarkNotFound(benchmark_id.to_string())
            })
    }

    /// The benchmark, provided it exists and its import has completed.
    async fn ready_benchmark(&self, benchmark_id: &str) -> Result<Benchmark, AnalyzerError> {
        let benchmark = self.existing_benchmark(benchmark_id).await?;
        if !benchmark.status.is_ready() {
            tracing::warn!(benchmark_id, status = %benchmark.status, "Benchmark is not ready for analysis.");
            return Err(AnalyzerError::BenchmarkNotReady {
                id: benchmark.id,
                status: benchmark.status,
            });
        }
        Ok(benchmark)
    }

    async fn ready_records(&self, benchmark_id: &str) -> Result<Vec<AssessmentRecord>, AnalyzerError> {
        self.ready_benchmark(benchmark_id).await?;
        Ok(self.store.fetch_records(benchmark_id, None).await?)
    }

    /// Runs CPU-bound engine work off the async runtime.
    async fn run_blocking<T, F>(&self, task: F) -> Result<T, AnalyzerError>
    where
        F: FnOnce(&AnalyticsEngine) -> T + Send + 'static,
        T: Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        Ok(tokio::task::spawn_blocking(move || task(&engine)).await?)
    }

    fn check_outcome(outcome: MetricKey) -> Result<(), AnalyzerError> {
        if outcome.is_outcome() {
            Ok(())
        } else {
            tracing::warn!(%outcome, "Top performers requested for a non-outcome metric.");
            Err(AnalyticsError::InvalidMetric(outcome).into())
        }
    }

    fn check_column_count(&self, count: usize) -> Result<(), AnalyzerError> {
        let settings = &self.engine.config().comparison;
        if count < settings.min_columns || count > settings.max_columns {
            tracing::warn!(count, "Comparison requested with an invalid number of columns.");
            return Err(AnalyticsError::InvalidColumnCount {
                min: settings.min_columns,
                max: settings.max_columns,
                actual: count,
            }
            .into());
        }
        Ok(())
    }

    pub async fn compute_statistics(&self, benchmark_id: &str) -> Result<Vec<OverallStat>, AnalyzerError> {
        let started = Instant::now();
        let records = self.ready_records(benchmark_id).await?;
        let stats = self
            .run_blocking(move |engine| engine.overall_statistics(&records))
            .await?;
        log_done(benchmark_id, "statistics", started);
        Ok(stats)
    }

    pub async fn compute_grouped_statistics(
        &self,
        benchmark_id: &str,
        group_by: ScopeField,
    ) -> Result<Vec<GroupedStat>, AnalyzerError> {
        let started = Instant::now();
        let records = self.ready_records(benchmark_id).await?;
        let groups = self
            .run_blocking(move |engine| engine.grouped_statistics(&records, group_by))
            .await?;
        log_done(benchmark_id, "grouped_statistics", started);
        Ok(groups)
    }

    /// Extracts the top performers of one outcome and replaces the stored result.
    pub async fn generate_top_performers(
        &self,
        benchmark_id: &str,
        outcome: MetricKey,
    ) -> Result<StoredResult<TopPerformerOutcome>, AnalyzerError> {
        Self::check_outcome(outcome)?;
        let started = Instant::now();
        let records = self.ready_records(benchmark_id).await?;
        let id = benchmark_id.to_string();
        let result = self
            .run_blocking(move |engine| engine.top_performers(&id, &records, outcome))
            .await??;
        let computed_at = self.store.save_top_performers(benchmark_id, &result).await?;
        log_done(benchmark_id, "top_performers", started);
        Ok(StoredResult { computed_at, result })
    }

    /// Regenerates the top performers of all twelve outcomes from one read of
    /// the records.
    pub async fn regenerate_all_top_performers(
        &self,
        benchmark_id: &str,
    ) -> Result<Vec<StoredResult<TopPerformerOutcome>>, AnalyzerError> {
        let started = Instant::now();
        let records = self.ready_records(benchmark_id).await?;
        let id = benchmark_id.to_string();
        let results = self
            .run_blocking(move |engine| {
                MetricKey::OUTCOMES
                    .into_iter()
                    .map(|outcome| engine.top_performers(&id, &records, outcome))
                    .collect::<Result<Vec<_>, _>>()
            })
            .await??;

        let mut stored = Vec::with_capacity(results.len());
        for result in results {
            let computed_at = self.store.save_top_performers(benchmark_id, &result).await?;
            stored.push(StoredResult { computed_at, result });
        }
        log_done(benchmark_id, "regenerate_top_performers", started);
        Ok(stored)
    }

    /// The stored top performers of one outcome. `None` means not generated yet.
    pub async fn get_top_performers(
        &self,
        benchmark_id: &str,
        outcome: MetricKey,
    ) -> Result<Option<StoredResult<TopPerformerOutcome>>, AnalyzerError> {
        Self::check_outcome(outcome)?;
        self.existing_benchmark(benchmark_id).await?;
        Ok(self.store.get_top_performers(benchmark_id, outcome).await?)
    }

    /// Correlates every competency with every outcome and replaces the stored set.
    pub async fn calculate_correlations(
        &self,
        benchmark_id: &str,
    ) -> Result<StoredResult<Vec<CorrelationResult>>, AnalyzerError> {
        let started = Instant::now();
        let records = self.ready_records(benchmark_id).await?;
        let id = benchmark_id.to_string();
        let result = self
            .run_blocking(move |engine| engine.correlations(&id, &records))
            .await?;
        let computed_at = self.store.save_correlations(benchmark_id, &result).await?;
        log_done(benchmark_id, "correlations", started);
        Ok(StoredResult { computed_at, result })
    }

    pub async fn get_correlations(
        &self,
        benchmark_id: &str,
    ) -> Result<Option<StoredResult<Vec<CorrelationResult>>>, AnalyzerError> {
        self.existing_benchmark(benchmark_id).await?;
        Ok(self.store.get_correlations(benchmark_id).await?)
    }

    /// Compares whole benchmarks; the first id is the base column.
    pub async fn compare_benchmarks(&self, ids: &[String]) -> Result<ComparisonResult, AnalyzerError> {
        self.check_column_count(ids.len())?;
        let started = Instant::now();

        let columns = try_join_all(ids.iter().map(|id| async move {
            let benchmark = self.ready_benchmark(id).await?;
            let records = self.store.fetch_records(id, None).await?;
            Ok::<_, AnalyzerError>(ComparisonInput {
                id: benchmark.id,
                label: benchmark.name,
                records,
            })
        }))
        .await?;

        let result = self.run_blocking(move |engine| engine.compare(&columns)).await??;
        log_done(&ids.join(","), "compare_benchmarks", started);
        Ok(result)
    }

    /// Compares segments of one benchmark; the first segment is the base column.
    /// Segment names identify the columns and must be unique.
    pub async fn compare_segments(
        &self,
        benchmark_id: &str,
        segments: &[SegmentFilter],
    ) -> Result<ComparisonResult, AnalyzerError> {
        self.check_column_count(segments.len())?;
        let started = Instant::now();
        self.ready_benchmark(benchmark_id).await?;

        let columns = try_join_all(segments.iter().map(|segment| async move {
            let records = self.store.fetch_records(benchmark_id, Some(segment)).await?;
            Ok::<_, AnalyzerError>(ComparisonInput {
                id: segment.name.clone(),
                label: segment.name.clone(),
                records,
            })
        }))
        .await?;

        let result = self.run_blocking(move |engine| engine.compare(&columns)).await??;
        log_done(benchmark_id, "compare_segments", started);
        Ok(result)
    }

    pub async fn analyze_data_quality(&self, benchmark_id: &str) -> Result<DataQualityReport, AnalyzerError> {
        let started = Instant::now();
        let records = self.ready_records(benchmark_id).await?;
        let id = benchmark_id.to_string();
        let report = self
            .run_blocking(move |engine| engine.data_quality(&id, &records))
            .await?;
        log_done(benchmark_id, "data_quality", started);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStore, benchmark};
    use configuration::Config;
    use core_types::BenchmarkStatus;

    fn records(benchmark_id: &str, count: usize, offset: f64) -> Vec<AssessmentRecord> {
        (0..count)
            .map(|i| {
                let mut record = AssessmentRecord::new(format!("{benchmark_id}-{i}"), benchmark_id)
                    .with_metric(MetricKey::EqTotal, offset + i as f64)
                    .with_metric(MetricKey::KnowYourself, offset + i as f64)
                    .with_metric(MetricKey::Effectiveness, i as f64)
                    .with_metric(MetricKey::Empathy, (i % 7) as f64 + i as f64 / 10.0)
                    .with_metric(MetricKey::ReliabilityIndex, 50.0);
                record.attributes.country = Some(if i % 2 == 0 { "Spain" } else { "Italy" }.to_string());
                record
            })
            .collect()
    }

    fn analyzer() -> BenchmarkAnalyzer {
        let store = InMemoryStore::new()
            .with_benchmark(benchmark("a", "Global 2024", BenchmarkStatus::Ready), records("a", 40, 100.0))
            .with_benchmark(benchmark("b", "Europe 2024", BenchmarkStatus::Ready), records("b", 40, 110.0))
            .with_benchmark(benchmark("p", "Importing", BenchmarkStatus::Processing), Vec::new());
        let engine = AnalyticsEngine::new(&Config::default()).unwrap();
        BenchmarkAnalyzer::new(Arc::new(store), Arc::new(engine))
    }

    #[tokio::test]
    async fn unknown_and_unready_benchmarks_are_rejected() {
        let analyzer = analyzer();

        let err = analyzer.compute_statistics("missing").await.unwrap_err();
        assert!(err.is_not_found() && err.is_validation());

        let err = analyzer.analyze_data_quality("p").await.unwrap_err();
        assert!(matches!(err, AnalyzerError::BenchmarkNotReady { status: BenchmarkStatus::Processing, .. }));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn statistics_cover_the_whole_catalogue() {
        let stats = analyzer().compute_statistics("a").await.unwrap();
        assert_eq!(stats.len(), MetricKey::statistics_metrics().len());
        let eq = stats.iter().find(|s| s.metric == MetricKey::EqTotal).unwrap();
        assert_eq!(eq.stats.as_ref().unwrap().n, 40);
        let health = stats.iter().find(|s| s.metric == MetricKey::Health).unwrap();
        assert!(health.stats.is_none());
    }

    #[tokio::test]
    async fn grouped_statistics_split_by_field() {
        let groups = analyzer()
            .compute_grouped_statistics("a", ScopeField::Country)
            .await
            .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), 40);
    }

    #[tokio::test]
    async fn top_performers_are_stored_and_replaced() {
        let analyzer = analyzer();
        assert!(analyzer.get_top_performers("a", MetricKey::Effectiveness).await.unwrap().is_none());

        let first = analyzer.generate_top_performers("a", MetricKey::Effectiveness).await.unwrap();
        let stored = analyzer
            .get_top_performers("a", MetricKey::Effectiveness)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.result, first.result);

        let second = analyzer.generate_top_performers("a", MetricKey::Effectiveness).await.unwrap();
        assert_eq!(second.result, first.result);
        assert!(second.computed_at >= first.computed_at);

        let err = analyzer.generate_top_performers("a", MetricKey::Empathy).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn regenerating_all_outcomes_marks_missing_ones_empty() {
        let all = analyzer().regenerate_all_top_performers("a").await.unwrap();
        assert_eq!(all.len(), MetricKey::OUTCOMES.len());
        let computed: Vec<MetricKey> = all
            .iter()
            .filter_map(|s| s.result.as_computed().map(|r| r.outcome))
            .collect();
        assert_eq!(computed, vec![MetricKey::Effectiveness]);
    }

    #[tokio::test]
    async fn correlations_round_trip_through_the_store() {
        let analyzer = analyzer();
        assert!(analyzer.get_correlations("a").await.unwrap().is_none());
        let calculated = analyzer.calculate_correlations("a").await.unwrap();
        assert_eq!(calculated.result.len(), 1);
        let stored = analyzer.get_correlations("a").await.unwrap().unwrap();
        assert_eq!(stored.result, calculated.result);
    }

    #[tokio::test]
    async fn correlations_without_pairs_read_back_as_empty() {
        let records = (0..10)
            .map(|i| AssessmentRecord::new(format!("e-{i}"), "e").with_metric(MetricKey::EqTotal, i as f64))
            .collect();
        let store = InMemoryStore::new()
            .with_benchmark(benchmark("e", "EQ only", BenchmarkStatus::Ready), records);
        let engine = AnalyticsEngine::new(&Config::default()).unwrap();
        let analyzer = BenchmarkAnalyzer::new(Arc::new(store), Arc::new(engine));

        let calculated = analyzer.calculate_correlations("e").await.unwrap();
        assert!(calculated.result.is_empty());
        let stored = analyzer.get_correlations("e").await.unwrap().unwrap();
        assert!(stored.result.is_empty());
        assert_eq!(stored.computed_at, calculated.computed_at);
    }

    #[tokio::test]
    async fn benchmarks_compare_against_the_first() {
        let analyzer = analyzer();
        let result = analyzer
            .compare_benchmarks(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(result.base_column, "a");
        assert_eq!(result.columns[1].label, "Europe 2024");
        assert!(result.metrics.iter().all(|m| m.metric != MetricKey::EqTotal));
        let pillar = result
            .metrics
            .iter()
            .find(|m| m.metric == MetricKey::KnowYourself)
            .unwrap();
        assert_eq!(pillar.differences[0].mean_diff, 0.0);
        assert_eq!(pillar.differences[1].mean_diff, 10.0);
        let effectiveness = result
            .metrics
            .iter()
            .find(|m| m.metric == MetricKey::Effectiveness)
            .unwrap();
        assert_eq!(effectiveness.differences[1].mean_diff, 0.0);

        let err = analyzer.compare_benchmarks(&["a".to_string()]).await.unwrap_err();
        assert!(err.is_validation());
        let err = analyzer
            .compare_benchmarks(&["a".to_string(), "p".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::BenchmarkNotReady { .. }));
    }

    #[tokio::test]
    async fn segments_are_columns_of_one_benchmark() {
        let analyzer = analyzer();
        let segments = vec![
            SegmentFilter::new("Spain").with(ScopeField::Country, "Spain"),
            SegmentFilter::new("Italy").with(ScopeField::Country, "Italy"),
        ];
        let result = analyzer.compare_segments("a", &segments).await.unwrap();
        assert_eq!(result.columns[0].sample_size, 20);
        assert_eq!(result.columns[1].sample_size, 20);

        let empty = vec![
            SegmentFilter::new("Spain").with(ScopeField::Country, "Spain"),
            SegmentFilter::new("France").with(ScopeField::Country, "France"),
        ];
        let err = analyzer.compare_segments("a", &empty).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Analytics(AnalyticsError::EmptyColumn(_))));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn data_quality_reports_on_ready_benchmarks() {
        let report = analyzer().analyze_data_quality("b").await.unwrap();
        assert_eq!(report.total_records, 40);
        assert!(report.duplicates.groups.is_empty());
        assert!(report.quality_score > 0.0);
    }
}
