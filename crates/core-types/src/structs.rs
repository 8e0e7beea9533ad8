use crate::enums::Leg;
use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single adjusted-close observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// The adjusted-close history of one symbol, ordered by strictly increasing date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series from observations in any order.
    ///
    /// Points are sorted by date. When a date appears more than once, the last
    /// observation supplied for it wins.
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "symbol".to_string(),
                "must not be empty".to_string(),
            ));
        }

        // Stable sort keeps duplicates in input order, so the later one is kept below.
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Ok(Self {
            symbol,
            points: deduped,
        })
    }

    /// An empty series, used when a provider could not deliver data.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The names of the two instruments being compared, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolPair {
    pub first: String,
    pub second: String,
}

impl SymbolPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn get(&self, leg: Leg) -> &str {
        match leg {
            Leg::First => &self.first,
            Leg::Second => &self.second,
        }
    }
}

/// One dated row holding a value for each of the two symbols.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairRow {
    pub date: NaiveDate,
    pub first: f64,
    pub second: f64,
}

impl PairRow {
    pub fn new(date: NaiveDate, first: f64, second: f64) -> Self {
        Self {
            date,
            first,
            second,
        }
    }

    pub fn get(&self, leg: Leg) -> f64 {
        match leg {
            Leg::First => self.first,
            Leg::Second => self.second,
        }
    }
}

/// Shared read access for the date-indexed two-column tables.
pub trait PairedTable {
    fn symbols(&self) -> &SymbolPair;
    fn rows(&self) -> &[PairRow];

    fn len(&self) -> usize {
        self.rows().len()
    }

    fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// Copies one column out, in row order.
    fn column(&self, leg: Leg) -> Vec<f64> {
        self.rows().iter().map(|r| r.get(leg)).collect()
    }

    fn dates(&self) -> Vec<NaiveDate> {
        self.rows().iter().map(|r| r.date).collect()
    }
}

fn check_ascending(rows: &[PairRow]) -> Result<(), CoreError> {
    if let Some(pair) = rows.windows(2).find(|w| w[0].date >= w[1].date) {
        return Err(CoreError::InvalidInput(
            "rows".to_string(),
            format!(
                "dates must be strictly increasing, found {} followed by {}",
                pair[0].date, pair[1].date
            ),
        ));
    }
    Ok(())
}

/// A table of prices: aligned, normalized or month-end resampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    symbols: SymbolPair,
    rows: Vec<PairRow>,
}

impl PriceTable {
    pub fn new(symbols: SymbolPair, rows: Vec<PairRow>) -> Result<Self, CoreError> {
        check_ascending(&rows)?;
        Ok(Self { symbols, rows })
    }

    pub fn first_row(&self) -> Option<&PairRow> {
        self.rows.first()
    }
}

impl PairedTable for PriceTable {
    fn symbols(&self) -> &SymbolPair {
        &self.symbols
    }

    fn rows(&self) -> &[PairRow] {
        &self.rows
    }
}

/// A table of periodic log-returns, or any row subset of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnTable {
    symbols: SymbolPair,
    rows: Vec<PairRow>,
}

impl ReturnTable {
    pub fn new(symbols: SymbolPair, rows: Vec<PairRow>) -> Result<Self, CoreError> {
        check_ascending(&rows)?;
        Ok(Self { symbols, rows })
    }

    /// Keeps the rows matching `predicate`, preserving their order.
    pub fn filter<F>(&self, predicate: F) -> ReturnTable
    where
        F: Fn(&PairRow) -> bool,
    {
        ReturnTable {
            symbols: self.symbols.clone(),
            rows: self.rows.iter().copied().filter(|r| predicate(r)).collect(),
        }
    }
}

impl PairedTable for ReturnTable {
    fn symbols(&self) -> &SymbolPair {
        &self.symbols
    }

    fn rows(&self) -> &[PairRow] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn series_is_sorted_and_last_duplicate_wins() {
        let series = PriceSeries::new(
            "SPY",
            vec![
                PricePoint::new(d(2020, 1, 3), 3.0),
                PricePoint::new(d(2020, 1, 1), 1.0),
                PricePoint::new(d(2020, 1, 3), 4.0),
            ],
        )
        .unwrap();

        let dates: Vec<_> = series.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2020, 1, 1), d(2020, 1, 3)]);
        assert_eq!(series.points()[1].price, 4.0);
    }

    #[test]
    fn blank_symbol_is_rejected() {
        assert!(PriceSeries::new("  ", vec![]).is_err());
    }

    #[test]
    fn table_rejects_unordered_rows() {
        let rows = vec![
            PairRow::new(d(2020, 2, 1), 1.0, 1.0),
            PairRow::new(d(2020, 1, 1), 1.0, 1.0),
        ];
        let err = PriceTable::new(SymbolPair::new("A", "B"), rows).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn filter_keeps_row_alignment() {
        let table = ReturnTable::new(
            SymbolPair::new("A", "B"),
            vec![
                PairRow::new(d(2020, 1, 31), -0.1, 0.2),
                PairRow::new(d(2020, 2, 28), 0.1, -0.2),
                PairRow::new(d(2020, 3, 31), -0.3, 0.4),
            ],
        )
        .unwrap();

        let down = table.filter(|r| r.first < 0.0);
        assert_eq!(down.column(Leg::Second), vec![0.2, 0.4]);
        assert_eq!(down.symbols(), table.symbols());
    }

    #[test]
    fn pair_row_serializes_with_iso_date() {
        let row = PairRow::new(d(2021, 6, 30), 1.5, 2.5);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"date":"2021-06-30","first":1.5,"second":2.5}"#);
    }
}
