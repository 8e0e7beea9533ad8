use chrono::NaiveDate;
use core_types::CoreError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("No overlapping dates between '{first}' and '{second}'")]
    EmptyAlignment { first: String, second: String },

    #[error("Invalid price for '{symbol}' on {date}: {price} (prices must be positive)")]
    InvalidPrice {
        symbol: String,
        date: NaiveDate,
        price: f64,
    },

    #[error("Not enough data to perform calculation: {0}")]
    InsufficientData(String),

    #[error("Malformed table: {0}")]
    Table(#[from] CoreError),
}

/// The pipeline stage an error aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Alignment,
    Returns,
    Statistics,
}

impl AnalyticsError {
    pub fn stage(&self) -> Stage {
        match self {
            AnalyticsError::EmptyAlignment { .. } | AnalyticsError::Table(_) => Stage::Alignment,
            AnalyticsError::InvalidPrice { .. } => Stage::Returns,
            AnalyticsError::InsufficientData(_) => Stage::Statistics,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Alignment => "alignment",
            Stage::Returns => "returns",
            Stage::Statistics => "statistics",
        };
        f.write_str(name)
    }
}
