//! # Comparator Analytics Engine
//!
//! This crate holds every numeric step of a two-symbol comparison: aligning the
//! price histories, month-end resampling, log-returns, and the statistics built
//! on them.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O and no knowledge of where prices come from or where
//!   results go. It depends only on `core-types`.
//! - **Strictly forward data flow:** aligner, resampler, return engine, then the
//!   statistics. Each step returns a new value; nothing is mutated afterwards.
//!
//! ## Public API
//!
//! - `ComparisonEngine`: runs the whole pipeline.
//! - `ComparisonReport`: every derived dataset of a run.
//! - The individual steps (`align`, `resample_month_end`, `compute_log_returns`,
//!   `describe`, `rolling_correlation`, ...) for callers that need only one.
//! - `AnalyticsError`: the error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod align;
pub mod engine;
pub mod error;
pub mod report;
pub mod returns;
pub mod stats;
pub mod transform;

// Re-export the key components to create a clean, public-facing API.
pub use align::align;
pub use engine::{ComparisonEngine, DEFAULT_ROLLING_WINDOW};
pub use error::{AnalyticsError, Stage};
pub use report::{ComparisonReport, ConditionalSet, HedgeRegimes};
pub use returns::{compute_log_returns, validate_prices};
pub use stats::{
    ColumnStats, ColumnTotals, Condition, ConditionalSubSeries, CorrelationMatrix,
    DescriptiveStats, PairSignCounts, QuadrantFrequencies, RollingPoint, SignCounts,
    correlation_matrix, cumulative_sum, describe, filter_by_quadrant, filter_by_sign, pearson,
    quadrant_frequencies, rolling_correlation, sign_counts,
};
pub use transform::{business_month_end, normalize, resample_month_end};
