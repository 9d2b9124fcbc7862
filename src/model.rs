use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLC prices and volume.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily price history for a single symbol.
///
/// Bars are strictly ascending by date with no duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from bars in any order.
    ///
    /// Bars are sorted ascending by date. When a date appears more than once
    /// the bar that came last in the input wins.
    pub fn from_unordered(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        // Stable sort keeps input order among equal dates, so the last
        // duplicate is the one retained below.
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            symbol: symbol.into(),
            bars: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// The `n` most recent bars, oldest first.
    pub fn tail(&self, n: usize) -> &[PriceBar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }
}

/// Headline figures shown above the indicator table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockMetrics {
    pub current_price: f64,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
}

impl StockMetrics {
    /// Returns `None` for an empty series.
    pub fn from_series(series: &PriceSeries) -> Option<Self> {
        let last = series.bars().last()?;
        let high_price = series
            .bars()
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let low_price = series
            .bars()
            .iter()
            .map(|b| b.low)
            .fold(f64::INFINITY, f64::min);
        Some(Self {
            current_price: last.close,
            open_price: last.open,
            high_price,
            low_price,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(day as u64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    pub(crate) fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i as u32, c))
            .collect();
        PriceSeries::from_unordered("TEST", bars)
    }

    #[test]
    fn from_unordered_sorts_ascending() {
        let series = PriceSeries::from_unordered("AAPL", vec![bar(2, 3.0), bar(0, 1.0), bar(1, 2.0)]);
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert!(series.bars().windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn from_unordered_keeps_last_duplicate() {
        let series = PriceSeries::from_unordered("AAPL", vec![bar(0, 1.0), bar(1, 2.0), bar(1, 5.0)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![1.0, 5.0]);
    }

    #[test]
    fn tail_returns_most_recent_bars() {
        let series = series_from_closes(&[1.0, 2.0, 3.0, 4.0]);
        let tail: Vec<f64> = series.tail(2).iter().map(|b| b.close).collect();
        assert_eq!(tail, vec![3.0, 4.0]);
        assert_eq!(series.tail(10).len(), 4);
    }

    #[test]
    fn metrics_empty_series_is_none() {
        assert!(StockMetrics::from_series(&PriceSeries::default()).is_none());
    }

    #[test]
    fn metrics_uses_last_bar_and_extremes() {
        let mut bars = vec![bar(0, 10.0), bar(1, 12.0), bar(2, 11.0)];
        bars[0].low = 9.0;
        bars[1].high = 13.5;
        bars[2].open = 11.5;
        let series = PriceSeries::from_unordered("AAPL", bars);
        let metrics = StockMetrics::from_series(&series).unwrap();
        assert_eq!(metrics.current_price, 11.0);
        assert_eq!(metrics.open_price, 11.5);
        assert_eq!(metrics.high_price, 13.5);
        assert_eq!(metrics.low_price, 9.0);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
