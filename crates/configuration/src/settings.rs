use crate::error::ConfigError;
use chrono::NaiveDate;
use serde::Deserialize;

/// The root configuration structure for the entire application.
///
/// Every section is optional; anything left out falls back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub report: ReportConfig,
    pub render: RenderConfig,
    pub data_source: DataSourceConfig,
}

/// The default comparison to run when the CLI does not override it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub symbol1: String,
    pub symbol2: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    /// Number of monthly returns in each rolling-correlation window.
    pub rolling_window: usize,
}

/// Where run directories are created.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_root: String,
}

/// Chart geometry and binning. Passed explicitly to the report assembler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Bins for the full-sample return histograms.
    pub histogram_bins: usize,
    /// Bins for the four conditional histograms.
    pub conditional_histogram_bins: usize,
    /// The conditional histograms span `[-conditional_range, conditional_range]`.
    pub conditional_range: f64,
}

/// Market-data provider settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            symbol1: "SPY".to_string(),
            symbol2: "TLT".to_string(),
            from_date: NaiveDate::from_ymd_opt(2012, 1, 1).unwrap_or_default(),
            to_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
            rolling_window: 12,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_root: "results".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 1000,
            histogram_bins: 50,
            conditional_histogram_bins: 20,
            conditional_range: 0.20,
        }
    }
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            user_agent: "Mozilla/5.0 (compatible; market-comparator/0.1)".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Checks the invariants the analysis relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.render.validate()?;

        if self.report.output_root.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "report.output_root must not be empty".to_string(),
            ));
        }
        if self.data_source.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "data_source.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol1.trim().is_empty() || self.symbol2.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "both symbols must be provided".to_string(),
            ));
        }
        if self.from_date >= self.to_date {
            return Err(ConfigError::ValidationError(format!(
                "from_date ({}) must be before to_date ({})",
                self.from_date, self.to_date
            )));
        }
        if self.rolling_window < 2 {
            return Err(ConfigError::ValidationError(format!(
                "rolling_window must be at least 2, got {}",
                self.rolling_window
            )));
        }
        Ok(())
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ValidationError(
                "render.width and render.height must be positive".to_string(),
            ));
        }
        if self.histogram_bins == 0 || self.conditional_histogram_bins == 0 {
            return Err(ConfigError::ValidationError(
                "histogram bin counts must be positive".to_string(),
            ));
        }
        if !(self.conditional_range > 0.0) {
            return Err(ConfigError::ValidationError(
                "render.conditional_range must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
