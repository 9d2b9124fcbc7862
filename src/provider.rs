pub mod fmp;

use chrono::{Days, NaiveDate};
use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::ProviderError;
use crate::model::PriceSeries;

/// Source of daily price history.
///
/// Uses `BoxFuture` so the trait stays object-safe (`dyn PriceHistoryProvider`).
pub trait PriceHistoryProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` between `from` and `to`, inclusive.
    ///
    /// Fails with `ProviderError::DataUnavailable` when the upstream returns
    /// no records.
    fn fetch(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> BoxFuture<'_, Result<PriceSeries, Report<ProviderError>>>;
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// The `days` days ending yesterday, relative to `today`.
    pub fn trailing(today: NaiveDate, days: u64) -> Self {
        let to = today - Days::new(1);
        let from = to - Days::new(days);
        Self { from, to }
    }
}
