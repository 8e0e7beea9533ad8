use crate::error::ApiError;
use crate::responses::{ChartEnvelope, ChartResult};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate};
use configuration::DataSourceConfig;
use core_types::{PricePoint, PriceSeries};
use futures::future::join_all;
use std::collections::HashMap;
use std::time::Duration;

pub mod error;
pub mod responses;

/// The abstract interface for a market-data provider.
/// The comparator only needs adjusted closes, so that is the whole contract,
/// allowing the underlying implementation (live or in-memory) to be swapped out.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches daily adjusted closes for `symbol` between `from` and `to`, both inclusive.
    async fn fetch_adjusted_close(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PriceSeries, ApiError>;
}

/// Fetches both symbols concurrently.
///
/// A provider failure is logged and replaced by an empty series: the analysis
/// then stops at alignment with nothing to compare instead of crashing here.
pub async fn fetch_pair(
    source: &dyn PriceSource,
    symbols: [&str; 2],
    from: NaiveDate,
    to: NaiveDate,
) -> (PriceSeries, PriceSeries) {
    let requests = symbols
        .iter()
        .map(|symbol| source.fetch_adjusted_close(symbol, from, to));
    let results = join_all(requests).await;

    let mut series = results
        .into_iter()
        .zip(symbols)
        .map(|(result, symbol)| match result {
            Ok(series) => {
                tracing::info!(symbol, records = series.len(), "Price data downloaded.");
                series
            }
            Err(e) => {
                tracing::error!(symbol, error = %e, "Failed to download price data.");
                PriceSeries::empty(symbol)
            }
        });

    // `symbols` has exactly two entries, so both `next` calls are populated.
    let first = series.next().unwrap_or_else(|| PriceSeries::empty(symbols[0]));
    let second = series.next().unwrap_or_else(|| PriceSeries::empty(symbols[1]));
    (first, second)
}

/// A `PriceSource` backed by the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(config: &DataSourceConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn fetch_adjusted_close(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PriceSeries, ApiError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        // period2 is exclusive on Yahoo's side; push it one day out so `to` is included.
        let period1 = from.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp();
        let period2 = to
            .checked_add_days(Days::new(1))
            .unwrap_or(to)
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc()
            .timestamp();

        tracing::debug!(symbol, %from, %to, "Requesting chart data.");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,split".to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        // Yahoo reports unknown symbols as a 404 with a regular chart envelope,
        // so the body is inspected before the status code.
        let envelope = match serde_json::from_str::<ChartEnvelope>(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ApiError::HttpStatus {
                    status: status.as_u16(),
                    body: text,
                });
            }
            Err(e) => return Err(ApiError::Deserialization(e.to_string())),
        };

        if let Some(error) = envelope.chart.error {
            return Err(ApiError::Provider {
                symbol: symbol.to_string(),
                code: error.code,
                description: error.description,
            });
        }
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let result = envelope
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| ApiError::NotFound(symbol.to_string()))?;

        // A redirected or cached response can describe another instrument.
        if let Some(returned) = result.meta.as_ref().and_then(|m| m.symbol.as_deref()) {
            if !returned.eq_ignore_ascii_case(symbol) {
                return Err(ApiError::InvalidData(format!(
                    "Requested {} but the response is for {}",
                    symbol, returned
                )));
            }
        }

        let points = adjusted_close_points(&result)?;
        Ok(PriceSeries::new(symbol, points)?)
    }
}

/// Pairs each bar's exchange-local date with its adjusted close, skipping nulls.
fn adjusted_close_points(result: &ChartResult) -> Result<Vec<PricePoint>, ApiError> {
    let closes = result
        .indicators
        .adjclose
        .first()
        .map(|a| a.adjclose.as_slice())
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        return Err(ApiError::InvalidData(format!(
            "{} timestamps but {} adjusted closes",
            result.timestamp.len(),
            closes.len()
        )));
    }

    let offset = result.meta.as_ref().map(|m| m.gmtoffset).unwrap_or(0);

    result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| close.map(|price| (ts, price)))
        .map(|(ts, price)| {
            let date = DateTime::from_timestamp(ts + offset, 0)
                .ok_or_else(|| ApiError::InvalidData(format!("Invalid timestamp: {}", ts)))?
                .date_naive();
            Ok(PricePoint::new(date, price))
        })
        .collect()
}

/// An in-memory `PriceSource`, used for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    series: HashMap<String, PriceSeries>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.series.insert(series.symbol().to_string(), series);
        self
    }
}

#[async_trait]
impl PriceSource for StaticSource {
    async fn fetch_adjusted_close(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PriceSeries, ApiError> {
        let series = self
            .series
            .get(symbol)
            .ok_or_else(|| ApiError::NotFound(symbol.to_string()))?;

        let points = series
            .points()
            .iter()
            .copied()
            .filter(|p| p.date >= from && p.date <= to)
            .collect();
        Ok(PriceSeries::new(symbol, points)?)
    }
}
