use core_types::MetricKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("'{0}' is not an outcome metric")]
    InvalidMetric(MetricKey),

    #[error("A comparison needs between {min} and {max} columns, got {actual}")]
    InvalidColumnCount { min: usize, max: usize, actual: usize },

    #[error("Comparison column '{0}' appears more than once")]
    DuplicateColumn(String),

    #[error("Comparison column '{0}' has no matching records")]
    EmptyColumn(String),

    #[error("Failed to build the analysis worker pool: {0}")]
    ThreadPool(String),

    #[error("Failed to export results: {0}")]
    Export(String),
}

impl AnalyticsError {
    /// True for errors caused by the request parameters rather than by the engine.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AnalyticsError::InvalidMetric(_)
                | AnalyticsError::InvalidColumnCount { .. }
                | AnalyticsError::DuplicateColumn(_)
                | AnalyticsError::EmptyColumn(_)
        )
    }
}
