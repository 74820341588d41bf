use crate::error::ConfigError;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section falls back to its defaults, so an empty file (or no file at
/// all) yields the thresholds the product has always used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSettings,
    pub top_performers: TopPerformerSettings,
    pub correlation: CorrelationSettings,
    pub comparison: ComparisonSettings,
    pub data_quality: DataQualitySettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// Settings for the analysis worker pool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Number of worker threads. 0 means one per logical CPU.
    pub workers: usize,
}

impl EngineSettings {
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

/// Cohort selection and significance policy for top-performer extraction.
///
/// The defaults mirror the literals used by the product so far; they are not
/// derived from a stated statistical policy and are expected to be tuned.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TopPerformerSettings {
    /// Percentile of the outcome that defines the top cohort (0.90 = P90).
    pub percentile: f64,
    /// Minimum |Cohen's d| for a dimension to count as significant.
    pub min_effect_size: f64,
    /// Minimum top-cohort size for any dimension to count as significant.
    pub min_sample_size: usize,
    /// Top-cohort size from which confidence is reported as `high`.
    pub high_confidence_sample_size: usize,
    /// How many dimensions to keep in the top competency and talent lists.
    pub top_n: usize,
}

impl Default for TopPerformerSettings {
    fn default() -> Self {
        Self {
            percentile: 0.90,
            min_effect_size: 0.5,
            min_sample_size: 30,
            high_confidence_sample_size: 100,
            top_n: 5,
        }
    }
}

/// Strength bands for competency/outcome correlations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorrelationSettings {
    pub moderate_threshold: f64,
    pub strong_threshold: f64,
    /// Pairs with fewer joint observations are not reported.
    pub min_observations: usize,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            moderate_threshold: 0.3,
            strong_threshold: 0.5,
            min_observations: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComparisonSettings {
    /// Average absolute percentage difference above which a metric is flagged.
    pub significance_threshold_pct: f64,
    pub min_columns: usize,
    pub max_columns: usize,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            significance_threshold_pct: 5.0,
            min_columns: 2,
            max_columns: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataQualitySettings {
    /// |z| at or above which an eqTotal value is reported as an outlier.
    pub outlier_z_threshold: f64,
    pub weights: QualityWeights,
}

impl Default for DataQualitySettings {
    fn default() -> Self {
        Self {
            outlier_z_threshold: 2.0,
            weights: QualityWeights::default(),
        }
    }
}

/// Weights of the composite quality score. They are normalised by their sum,
/// so only their ratios matter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub completeness: f64,
    pub duplicates: f64,
    pub reliability: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            completeness: 0.4,
            duplicates: 0.3,
            reliability: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("invalid server address: {}", e)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub filter: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
            file_prefix: "sei-bench.log".to_string(),
        }
    }
}

impl Config {
    /// Rejects settings the engine cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tp = &self.top_performers;
        if !(tp.percentile > 0.0 && tp.percentile < 1.0) {
            return Err(invalid(format!(
                "top_performers.percentile must be in (0, 1), got {}",
                tp.percentile
            )));
        }
        if tp.min_effect_size < 0.0 {
            return Err(invalid("top_performers.min_effect_size must not be negative"));
        }
        if tp.top_n == 0 {
            return Err(invalid("top_performers.top_n must be at least 1"));
        }

        let corr = &self.correlation;
        if corr.moderate_threshold < 0.0 || corr.strong_threshold > 1.0 {
            return Err(invalid("correlation thresholds must lie in [0, 1]"));
        }
        if corr.moderate_threshold > corr.strong_threshold {
            return Err(invalid(
                "correlation.moderate_threshold must not exceed correlation.strong_threshold",
            ));
        }
        if corr.min_observations < 2 {
            return Err(invalid("correlation.min_observations must be at least 2"));
        }

        let cmp = &self.comparison;
        if cmp.min_columns < 2 {
            return Err(invalid("comparison.min_columns must be at least 2"));
        }
        if cmp.max_columns < cmp.min_columns {
            return Err(invalid("comparison.max_columns must not be below min_columns"));
        }
        if cmp.significance_threshold_pct < 0.0 {
            return Err(invalid("comparison.significance_threshold_pct must not be negative"));
        }

        let dq = &self.data_quality;
        if dq.outlier_z_threshold <= 0.0 {
            return Err(invalid("data_quality.outlier_z_threshold must be positive"));
        }
        let w = &dq.weights;
        if w.completeness < 0.0 || w.duplicates < 0.0 || w.reliability < 0.0 {
            return Err(invalid("data_quality.weights must not be negative"));
        }
        if w.completeness + w.duplicates + w.reliability <= 0.0 {
            return Err(invalid("data_quality.weights must not all be zero"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
