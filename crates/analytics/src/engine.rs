use crate::comparison::{self, ComparisonInput, ComparisonResult};
use crate::correlation::{self, CorrelationResult};
use crate::data_quality::{self, DataQualityReport};
use crate::error::AnalyticsError;
use crate::grouped::{self, GroupedStat};
use crate::statistics::{self, OverallStat};
use crate::top_performers::{self, TopPerformerOutcome};
use configuration::Config;
use core_types::{AssessmentRecord, MetricKey, ScopeField};

/// The benchmark analysis engine.
///
/// It holds no state besides its policy and a bounded worker pool: every call
/// is a pure function of the records passed in. All parallel work of a call
/// runs inside the engine's own pool, so a burst of requests never competes
/// for more threads than configured.
pub struct AnalyticsEngine {
    pool: rayon::ThreadPool,
    config: Config,
}

impl std::fmt::Debug for AnalyticsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsEngine")
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

impl AnalyticsEngine {
    pub fn new(config: &Config) -> Result<Self, AnalyticsError> {
        let workers = config.engine.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sei-analytics-{i}"))
            .build()
            .map_err(|e| AnalyticsError::ThreadPool(e.to_string()))?;
        tracing::debug!(workers, "Analytics worker pool ready.");
        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Statistics of every metric over the whole record set, in catalogue order.
    pub fn overall_statistics(&self, records: &[AssessmentRecord]) -> Vec<OverallStat> {
        tracing::debug!(records = records.len(), "Computing overall statistics.");
        self.pool.install(|| statistics::overall(records))
    }

    pub fn grouped_statistics(&self, records: &[AssessmentRecord], field: ScopeField) -> Vec<GroupedStat> {
        tracing::debug!(records = records.len(), %field, "Computing grouped statistics.");
        self.pool.install(|| grouped::compute_grouped(records, field))
    }

    pub fn top_performers(
        &self,
        benchmark_id: &str,
        records: &[AssessmentRecord],
        outcome: MetricKey,
    ) -> Result<TopPerformerOutcome, AnalyticsError> {
        tracing::debug!(benchmark_id, records = records.len(), %outcome, "Extracting top performers.");
        self.pool.install(|| {
            top_performers::extract(benchmark_id, records, outcome, &self.config.top_performers)
        })
    }

    pub fn correlations(&self, benchmark_id: &str, records: &[AssessmentRecord]) -> Vec<CorrelationResult> {
        tracing::debug!(benchmark_id, records = records.len(), "Calculating correlations.");
        self.pool
            .install(|| correlation::calculate(benchmark_id, records, &self.config.correlation))
    }

    pub fn compare(&self, columns: &[ComparisonInput]) -> Result<ComparisonResult, AnalyticsError> {
        tracing::debug!(columns = columns.len(), "Comparing columns.");
        self.pool
            .install(|| comparison::compare(columns, &self.config.comparison))
    }

    pub fn data_quality(&self, benchmark_id: &str, records: &[AssessmentRecord]) -> DataQualityReport {
        tracing::debug!(benchmark_id, records = records.len(), "Analyzing data quality.");
        self.pool
            .install(|| data_quality::analyze(benchmark_id, records, &self.config.data_quality))
    }
}
