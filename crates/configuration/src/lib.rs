use crate::error::ConfigError;
use config::{Environment, File, FileFormat};
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{AnalysisConfig, Config, DataSourceConfig, RenderConfig, ReportConfig};

/// Prefix for environment overrides, e.g. `COMPARATOR__ANALYSIS__SYMBOL1=QQQ`.
pub const ENV_PREFIX: &str = "COMPARATOR";

/// Loads the application configuration.
///
/// Reads `path` when given (it must exist), otherwise an optional `config.toml`
/// in the working directory, then layers `COMPARATOR__*` environment variables
/// on top. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::with_name("config.toml").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    finish(builder)
}

/// Parses configuration from TOML text, without consulting the environment.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn empty_document_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.analysis.symbol1, "SPY");
        assert_eq!(config.analysis.symbol2, "TLT");
        assert_eq!(config.analysis.rolling_window, 12);
        assert_eq!(config.render.histogram_bins, 50);
        assert_eq!(config.report.output_root, "results");
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = load_config_from_str(
            r#"
            [analysis]
            symbol1 = "QQQ"
            from_date = "2015-03-01"

            [render]
            conditional_histogram_bins = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.symbol1, "QQQ");
        assert_eq!(config.analysis.symbol2, "TLT");
        assert_eq!(
            config.analysis.from_date,
            NaiveDate::from_ymd_opt(2015, 3, 1).unwrap()
        );
        assert_eq!(config.render.conditional_histogram_bins, 10);
        assert_eq!(config.render.width, 1600);
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let err = load_config_from_str(
            r#"
            [analysis]
            from_date = "2022-01-01"
            to_date = "2012-01-01"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn rolling_window_below_two_is_rejected() {
        let err = load_config_from_str("[analysis]\nrolling_window = 1\n").unwrap_err();
        assert!(err.to_string().contains("rolling_window"));
    }

    #[test]
    fn zero_bins_are_rejected() {
        let err = load_config_from_str("[render]\nhistogram_bins = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = Path::new("definitely-not-here/comparator.toml");
        assert!(matches!(
            load_config(Some(path)),
            Err(ConfigError::LoadError(_))
        ));
    }
}
