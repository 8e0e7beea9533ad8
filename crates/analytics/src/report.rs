use crate::stats::{
    ConditionalSubSeries, CorrelationMatrix, DescriptiveStats, PairSignCounts,
    QuadrantFrequencies, RollingPoint,
};
use core_types::{PriceTable, ReturnTable, SymbolPair};
use serde::{Deserialize, Serialize};

/// Every dataset derived during one comparison run.
///
/// This struct is the final output of the `ComparisonEngine` and the only input
/// the report assembler needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub symbols: SymbolPair,

    // I. Prices
    pub aligned: PriceTable,
    pub normalized: PriceTable,
    pub monthly: PriceTable,

    // II. Returns and their distribution
    pub returns: ReturnTable,
    pub stats: DescriptiveStats,
    pub sign_counts: PairSignCounts,

    // III. Co-movement
    pub correlation: Option<CorrelationMatrix>, // None when there are too few periods
    pub rolling_window: usize,
    pub rolling_correlation: Option<Vec<RollingPoint>>,
    pub quadrants: QuadrantFrequencies,

    // IV. Conditional behaviour
    pub conditional: ConditionalSet,
    pub hedges: HedgeRegimes,
}

/// Each symbol's returns split by the sign of the other symbol's return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalSet {
    pub second_when_first_negative: ConditionalSubSeries,
    pub second_when_first_non_negative: ConditionalSubSeries,
    pub first_when_second_negative: ConditionalSubSeries,
    pub first_when_second_non_negative: ConditionalSubSeries,
}

impl ConditionalSet {
    /// The four sub-series in panel order: top-left, bottom-left, top-right, bottom-right.
    pub fn panels(&self) -> [&ConditionalSubSeries; 4] {
        [
            &self.second_when_first_negative,
            &self.second_when_first_non_negative,
            &self.first_when_second_negative,
            &self.first_when_second_non_negative,
        ]
    }
}

/// Periods where one symbol gained (or was flat) while the other lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeRegimes {
    pub first_gains_second_loses: ConditionalSubSeries,
    pub second_gains_first_loses: ConditionalSubSeries,
}
