use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    ComparisonSettings, Config, CorrelationSettings, DataQualitySettings, EngineSettings,
    LoggingSettings, QualityWeights, ServerSettings, TopPerformerSettings,
};

/// The configuration file read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "sei-bench.toml";

/// Loads and validates the application configuration.
///
/// Sources, later ones winning: built-in defaults, the TOML file at `path`
/// (optional; missing files are ignored), then `SEI__*` environment variables
/// such as `SEI__TOP_PERFORMERS__MIN_EFFECT_SIZE=0.4`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("SEI")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

/// Parses a TOML document into a validated `Config`. Environment variables are
/// not consulted.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_literals() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.top_performers.percentile, 0.90);
        assert_eq!(config.top_performers.min_effect_size, 0.5);
        assert_eq!(config.top_performers.min_sample_size, 30);
        assert_eq!(config.top_performers.high_confidence_sample_size, 100);
        assert_eq!(config.correlation.moderate_threshold, 0.3);
        assert_eq!(config.correlation.strong_threshold, 0.5);
        assert_eq!(config.comparison.significance_threshold_pct, 5.0);
        assert_eq!(config.data_quality.outlier_z_threshold, 2.0);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = load_config_from_str(
            r#"
            [top_performers]
            min_effect_size = 0.8

            [data_quality.weights]
            reliability = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(config.top_performers.min_effect_size, 0.8);
        assert_eq!(config.top_performers.min_sample_size, 30);
        assert_eq!(config.data_quality.weights.reliability, 0.0);
        assert_eq!(config.data_quality.weights.completeness, 0.4);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.comparison.max_columns, 4);
    }

    #[test]
    fn rejects_inverted_correlation_bands() {
        let err = load_config_from_str(
            r#"
            [correlation]
            moderate_threshold = 0.6
            strong_threshold = 0.5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn rejects_all_zero_quality_weights() {
        let mut config = Config::default();
        config.data_quality.weights = QualityWeights {
            completeness: 0.0,
            duplicates: 0.0,
            reliability: 0.0,
        };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn rejects_degenerate_percentile_and_column_bounds() {
        let mut config = Config::default();
        config.top_performers.percentile = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.comparison.min_columns = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn worker_count_falls_back_to_cpus() {
        let engine = EngineSettings { workers: 0 };
        assert!(engine.worker_count() >= 1);
        assert_eq!(EngineSettings { workers: 3 }.worker_count(), 3);
    }

    #[test]
    fn server_address_parses() {
        let addr = ServerSettings::default().socket_addr().unwrap();
        assert_eq!(addr.port(), 3000);
    }
}
