use crate::align::align;
use crate::error::AnalyticsError;
use crate::report::{ComparisonReport, ConditionalSet, HedgeRegimes};
use crate::returns::{compute_log_returns, validate_prices};
use crate::stats::{
    correlation_matrix, describe, filter_by_quadrant, filter_by_sign, quadrant_frequencies,
    rolling_correlation, sign_counts,
};
use crate::transform::{normalize, resample_month_end};
use core_types::{Leg, PairedTable, PriceSeries, Quadrant};

/// The default number of monthly returns per rolling-correlation window.
pub const DEFAULT_ROLLING_WINDOW: usize = 12;

/// A stateless calculator that turns two price histories into a `ComparisonReport`.
#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    rolling_window: usize,
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ROLLING_WINDOW)
    }
}

impl ComparisonEngine {
    pub fn new(rolling_window: usize) -> Self {
        Self { rolling_window }
    }

    /// The main entry point: align, resample, compute returns, then every statistic.
    ///
    /// # Arguments
    ///
    /// * `first` - Adjusted closes of the first symbol.
    /// * `second` - Adjusted closes of the second symbol.
    ///
    /// # Returns
    ///
    /// The complete `ComparisonReport`. Alignment and price errors abort the whole
    /// run; a statistic that lacks data is left out of the report instead.
    pub fn analyze(
        &self,
        first: &PriceSeries,
        second: &PriceSeries,
    ) -> Result<ComparisonReport, AnalyticsError> {
        let aligned = align(first, second)?;
        tracing::info!(rows = aligned.len(), "Price histories aligned.");

        validate_prices(&aligned)?;
        let normalized = normalize(&aligned)?;
        let monthly = resample_month_end(&aligned)?;
        let returns = compute_log_returns(&monthly)?;
        tracing::info!(
            months = monthly.len(),
            periods = returns.len(),
            "Monthly log-returns computed."
        );

        let correlation = optional("correlation matrix", correlation_matrix(&returns))?;
        let rolling = optional(
            "rolling correlation",
            rolling_correlation(&returns, self.rolling_window),
        )?;

        let conditional = ConditionalSet {
            second_when_first_negative: filter_by_sign(&returns, Leg::First, true),
            second_when_first_non_negative: filter_by_sign(&returns, Leg::First, false),
            first_when_second_negative: filter_by_sign(&returns, Leg::Second, true),
            first_when_second_non_negative: filter_by_sign(&returns, Leg::Second, false),
        };
        let hedges = HedgeRegimes {
            first_gains_second_loses: filter_by_quadrant(&returns, Quadrant::SecondDownFirstUp),
            second_gains_first_loses: filter_by_quadrant(&returns, Quadrant::SecondUpFirstDown),
        };

        let report = ComparisonReport {
            symbols: aligned.symbols().clone(),
            stats: describe(&returns),
            sign_counts: sign_counts(&returns),
            quadrants: quadrant_frequencies(&returns),
            correlation,
            rolling_window: self.rolling_window,
            rolling_correlation: rolling,
            conditional,
            hedges,
            aligned,
            normalized,
            monthly,
            returns,
        };

        tracing::info!("Statistics computed.");
        Ok(report)
    }
}

/// Downgrades a missing-data failure of one statistic to an absent dataset.
fn optional<T>(name: &str, result: Result<T, AnalyticsError>) -> Result<Option<T>, AnalyticsError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AnalyticsError::InsufficientData(reason)) => {
            tracing::warn!(statistic = name, %reason, "Statistic skipped.");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
