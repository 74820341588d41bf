use analytics::AnalyticsError;
use core_types::BenchmarkStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("Benchmark '{0}' does not exist")]
    BenchmarkNotFound(String),

    #[error("Benchmark '{id}' is {status}, not READY")]
    BenchmarkNotReady { id: String, status: BenchmarkStatus },

    #[error("Analysis task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AnalyzerError {
    /// True for rejected requests: unknown or unready benchmarks and bad
    /// parameters. These are reported to the caller and never retried.
    pub fn is_validation(&self) -> bool {
        match self {
            AnalyzerError::BenchmarkNotFound(_)
            | AnalyzerError::BenchmarkNotReady { .. } => true,
            AnalyzerError::Analytics(e) => e.is_validation(),
            AnalyzerError::Database(_) | AnalyzerError::Join(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AnalyzerError::BenchmarkNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::MetricKey;
    use database::DbError;

    #[test]
    fn classifies_rejections_and_failures() {
        let missing = AnalyzerError::BenchmarkNotFound("x".into());
        assert!(missing.is_validation() && missing.is_not_found());

        let unready = AnalyzerError::BenchmarkNotReady {
            id: "x".into(),
            status: BenchmarkStatus::Failed,
        };
        assert!(unready.is_validation() && !unready.is_not_found());

        let bad_outcome = AnalyzerError::from(AnalyticsError::InvalidMetric(MetricKey::EqTotal));
        assert!(bad_outcome.is_validation());

        let db = AnalyzerError::from(DbError::ConnectionConfigError("no url".into()));
        assert!(!db.is_validation() && !db.is_not_found());
    }
}
