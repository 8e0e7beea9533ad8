use crate::error::AnalyticsError;
use chrono::{Datelike, NaiveDate, Weekday};
use core_types::{PairRow, PairedTable, PriceTable};

/// Rebases both columns so their first observation equals 100.
///
/// Only used to compare the shape of the two histories; no statistic reads it.
pub fn normalize(table: &PriceTable) -> Result<PriceTable, AnalyticsError> {
    let Some(base) = table.first_row().copied() else {
        return Ok(table.clone());
    };

    for (symbol, price) in [
        (&table.symbols().first, base.first),
        (&table.symbols().second, base.second),
    ] {
        if !(price > 0.0) || !price.is_finite() {
            return Err(AnalyticsError::InvalidPrice {
                symbol: symbol.clone(),
                date: base.date,
                price,
            });
        }
    }

    let rows = table
        .rows()
        .iter()
        .map(|r| {
            PairRow::new(
                r.date,
                r.first / base.first * 100.0,
                r.second / base.second * 100.0,
            )
        })
        .collect();

    Ok(PriceTable::new(table.symbols().clone(), rows)?)
}

/// Reduces a daily table to one row per calendar month.
///
/// Each row carries the last observation of its month and is dated with that
/// month's business month-end. Months with no observation produce no row.
pub fn resample_month_end(table: &PriceTable) -> Result<PriceTable, AnalyticsError> {
    let mut rows: Vec<PairRow> = Vec::new();
    let mut current: Option<(i32, u32)> = None;

    for row in table.rows() {
        let month = (row.date.year(), row.date.month());
        let labelled = PairRow::new(business_month_end(month.0, month.1), row.first, row.second);

        if current == Some(month) {
            if let Some(last) = rows.last_mut() {
                *last = labelled;
            }
        } else {
            rows.push(labelled);
            current = Some(month);
        }
    }

    tracing::debug!(daily = table.len(), monthly = rows.len(), "Resampled to month-end.");

    Ok(PriceTable::new(table.symbols().clone(), rows)?)
}

/// The last Monday-to-Friday date of the given month.
pub fn business_month_end(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    let mut day = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX);

    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    day
}
