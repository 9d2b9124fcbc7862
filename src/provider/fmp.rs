use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::NaiveDate;
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ProviderError;
use crate::model::{PriceBar, PriceSeries};
use crate::provider::PriceHistoryProvider;

const PROVIDER_NAME: &str = "fmp";
const DATE_FORMAT: &str = "%Y-%m-%d";
const FMP_REQUESTS_PER_SECOND: NonZeroU32 = nonzero!(5u32);

/// Financial Modeling Prep historical daily prices.
pub struct FmpProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl FmpProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let quota = Quota::per_second(FMP_REQUESTS_PER_SECOND);
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

impl PriceHistoryProvider for FmpProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn fetch(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> BoxFuture<'_, Result<PriceSeries, Report<ProviderError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            self.rate_limiter.until_ready().await;

            let url = format!("{}/historical-price-full/{}", self.base_url, symbol);
            let from_str = from.format(DATE_FORMAT).to_string();
            let to_str = to.format(DATE_FORMAT).to_string();
            let params = [
                ("from", from_str.as_str()),
                ("to", to_str.as_str()),
                ("apikey", self.api_key.as_str()),
            ];

            let response = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await
                .change_context(ProviderError::Request {
                    provider: PROVIDER_NAME.into(),
                })
                .attach_with(|| format!("symbol: {symbol}"))?;

            if !response.status().is_success() {
                return Err(Report::new(ProviderError::Request {
                    provider: PROVIDER_NAME.into(),
                })
                .attach(format!("HTTP status: {}", response.status())));
            }

            let body: FmpHistoricalResponse =
                response
                    .json()
                    .await
                    .change_context(ProviderError::ResponseParse {
                        provider: PROVIDER_NAME.into(),
                    })?;

            let series = body.into_series(&symbol)?;

            info!(
                symbol = %symbol,
                from = %from_str,
                to = %to_str,
                fetched = series.len(),
                "fmp price history fetch complete"
            );

            Ok(series)
        })
    }
}

// ── REST response types ───────────────────────────────────────────────────────

/// `{ "symbol": "AAPL", "historical": [ ... ] }`; unknown symbols yield `{}`.
#[derive(Debug, Deserialize)]
struct FmpHistoricalResponse {
    #[serde(default)]
    historical: Vec<FmpDailyRow>,
}

#[derive(Debug, Deserialize)]
struct FmpDailyRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    /// Sometimes sent as a float, e.g. `5.1e7`.
    volume: f64,
}

impl FmpHistoricalResponse {
    fn into_series(self, symbol: &str) -> Result<PriceSeries, Report<ProviderError>> {
        let total = self.historical.len();
        let bars: Vec<PriceBar> = self
            .historical
            .into_iter()
            .filter_map(|row| {
                if row.close.is_finite() && row.close > 0.0 {
                    Some(row.into_bar())
                } else {
                    warn!(symbol, date = %row.date, close = row.close, "dropping bar with invalid close");
                    None
                }
            })
            .collect();

        if bars.is_empty() {
            return Err(Report::new(ProviderError::DataUnavailable {
                symbol: symbol.to_owned(),
            })
            .attach(format!("rows received: {total}")));
        }

        Ok(PriceSeries::from_unordered(symbol, bars))
    }
}

impl FmpDailyRow {
    fn into_bar(self) -> PriceBar {
        PriceBar {
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume.max(0.0).round() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "symbol": "AAPL",
        "historical": [
            {"date": "2024-05-31", "open": 191.44, "high": 192.57, "low": 189.91, "close": 192.25,
             "adjClose": 192.25, "volume": 75158277, "unadjustedVolume": 75158277,
             "change": 0.81, "changePercent": 0.42, "vwap": 191.58, "label": "May 31, 24",
             "changeOverTime": 0.0042},
            {"date": "2024-05-30", "open": 190.76, "high": 192.18, "low": 190.63, "close": 191.29,
             "adjClose": 191.29, "volume": 4.9947941E7},
            {"date": "2024-05-29", "open": 189.61, "high": 192.25, "low": 189.51, "close": 190.29,
             "adjClose": 190.29, "volume": 53068016}
        ]
    }"#;

    #[test]
    fn response_parses_into_ascending_series() {
        let body: FmpHistoricalResponse = serde_json::from_str(SAMPLE).unwrap();
        let series = body.into_series("AAPL").unwrap();
        assert_eq!(series.symbol(), "AAPL");
        assert_eq!(series.len(), 3);
        let dates: Vec<String> = series.bars().iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-05-29", "2024-05-30", "2024-05-31"]);
        assert_eq!(series.bars()[1].volume, 49_947_941);
        assert_eq!(series.bars()[2].close, 192.25);
    }

    #[test]
    fn empty_object_is_data_unavailable() {
        let body: FmpHistoricalResponse = serde_json::from_str("{}").unwrap();
        let err = body.into_series("NOPE").unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProviderError::DataUnavailable { symbol } if symbol == "NOPE"
        ));
    }

    #[test]
    fn non_positive_close_rows_dropped() {
        let json = r#"{"historical": [
            {"date": "2024-05-30", "open": 1.0, "high": 1.0, "low": 1.0, "close": 0.0, "volume": 10},
            {"date": "2024-05-31", "open": 2.0, "high": 2.0, "low": 2.0, "close": 2.0, "volume": 10}
        ]}"#;
        let body: FmpHistoricalResponse = serde_json::from_str(json).unwrap();
        let series = body.into_series("AAPL").unwrap();
        assert_eq!(series.closes(), vec![2.0]);
    }

    #[test]
    fn all_rows_invalid_is_data_unavailable() {
        let json = r#"{"historical": [
            {"date": "2024-05-30", "open": 1.0, "high": 1.0, "low": 1.0, "close": -1.0, "volume": 10}
        ]}"#;
        let body: FmpHistoricalResponse = serde_json::from_str(json).unwrap();
        assert!(body.into_series("AAPL").is_err());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let provider = FmpProvider::new("https://example.com/api/v3/", "key");
        assert_eq!(provider.base_url, "https://example.com/api/v3");
        assert_eq!(provider.name(), "fmp");
    }

    #[test]
    fn rate_limiter_allows_one_second_burst() {
        let provider = FmpProvider::new("https://example.com", "key");
        for _ in 0..FMP_REQUESTS_PER_SECOND.get() {
            assert!(provider.rate_limiter.check().is_ok());
        }
        assert!(provider.rate_limiter.check().is_err());
    }

    /// Integration test: requires network access and `STOCK_API_KEY`.
    /// Run with `cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn integration_fetch_history() {
        let key = std::env::var("STOCK_API_KEY").expect("STOCK_API_KEY not set");
        let provider = FmpProvider::new("https://financialmodelingprep.com/api/v3", key);
        let to = chrono::Local::now().date_naive() - chrono::Days::new(1);
        let from = to - chrono::Days::new(30);
        let series = provider.fetch("AAPL", from, to).await.unwrap();
        assert!(!series.is_empty());
    }
}
