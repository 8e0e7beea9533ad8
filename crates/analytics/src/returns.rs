use crate::error::AnalyticsError;
use core_types::{PairRow, PairedTable, PriceTable, ReturnTable};

/// Checks that every price in the table is a positive, finite number.
pub fn validate_prices(table: &PriceTable) -> Result<(), AnalyticsError> {
    let symbols = table.symbols();
    for row in table.rows() {
        for (symbol, price) in [(&symbols.first, row.first), (&symbols.second, row.second)] {
            if !(price > 0.0) || !price.is_finite() {
                return Err(AnalyticsError::InvalidPrice {
                    symbol: symbol.clone(),
                    date: row.date,
                    price,
                });
            }
        }
    }
    Ok(())
}

/// Computes `ln(p[t]) - ln(p[t-1])` for both columns.
///
/// Each return is dated with the later of its two rows. The first row has no
/// predecessor and produces no output, so the result is exactly one row shorter
/// than the input (or empty when the input has fewer than two rows).
pub fn compute_log_returns(prices: &PriceTable) -> Result<ReturnTable, AnalyticsError> {
    validate_prices(prices)?;

    let rows: Vec<PairRow> = prices
        .rows()
        .windows(2)
        .map(|w| {
            PairRow::new(
                w[1].date,
                w[1].first.ln() - w[0].first.ln(),
                w[1].second.ln() - w[0].second.ln(),
            )
        })
        .collect();

    Ok(ReturnTable::new(prices.symbols().clone(), rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::SymbolPair;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, day).unwrap()
    }

    fn prices(rows: Vec<PairRow>) -> PriceTable {
        PriceTable::new(SymbolPair::new("SPY", "TLT"), rows).unwrap()
    }

    #[test]
    fn drops_the_first_row_structurally() {
        let t = prices(vec![
            PairRow::new(d(1, 29), 100.0, 50.0),
            PairRow::new(d(2, 26), 110.0, 45.0),
            PairRow::new(d(3, 31), 99.0, 45.0),
        ]);

        let r = compute_log_returns(&t).unwrap();

        assert_eq!(r.len(), 2);
        assert_eq!(r.dates(), vec![d(2, 26), d(3, 31)]);
        assert!((r.rows()[0].first - (1.1f64).ln()).abs() < 1e-12);
        assert!((r.rows()[0].second - (0.9f64).ln()).abs() < 1e-12);
        assert_eq!(r.rows()[1].second, 0.0);
    }

    #[test]
    fn single_row_yields_no_returns() {
        let t = prices(vec![PairRow::new(d(1, 29), 100.0, 50.0)]);
        assert!(compute_log_returns(&t).unwrap().is_empty());
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let t = prices(vec![
            PairRow::new(d(1, 29), 100.0, 50.0),
            PairRow::new(d(2, 26), 100.0, -1.0),
        ]);

        assert_eq!(
            compute_log_returns(&t).unwrap_err(),
            AnalyticsError::InvalidPrice {
                symbol: "TLT".to_string(),
                date: d(2, 26),
                price: -1.0
            }
        );
    }

    #[test]
    fn nan_price_is_rejected() {
        let t = prices(vec![PairRow::new(d(1, 29), f64::NAN, 50.0)]);
        assert!(validate_prices(&t).is_err());
    }
}
