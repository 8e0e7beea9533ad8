use crate::error::AnalyticsError;
use core_types::{PairRow, PriceSeries, PriceTable, SymbolPair};
use std::collections::BTreeMap;

/// Inner-joins two price histories on date.
///
/// Only dates present in both series survive; nothing is interpolated. An empty
/// intersection is the one condition that stops an analysis before it starts.
pub fn align(first: &PriceSeries, second: &PriceSeries) -> Result<PriceTable, AnalyticsError> {
    let symbols = SymbolPair::new(first.symbol(), second.symbol());

    let by_date: BTreeMap<_, _> = second.points().iter().map(|p| (p.date, p.price)).collect();

    // `first` is sorted by construction, so the joined rows come out ascending.
    let rows: Vec<PairRow> = first
        .points()
        .iter()
        .filter_map(|p| by_date.get(&p.date).map(|&other| PairRow::new(p.date, p.price, other)))
        .collect();

    if rows.is_empty() {
        return Err(AnalyticsError::EmptyAlignment {
            first: symbols.first,
            second: symbols.second,
        });
    }

    tracing::debug!(
        first = first.len(),
        second = second.len(),
        aligned = rows.len(),
        "Aligned price histories."
    );

    Ok(PriceTable::new(symbols, rows)?)
}
