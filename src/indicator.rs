pub mod ma;
pub mod macd;
pub mod rsi;

use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

use crate::indicator::ma::{Ema, Sma};
use crate::indicator::macd::Macd;
use crate::indicator::rsi::Rsi;
use crate::model::PriceSeries;

pub const DEFAULT_SMA_WINDOW: usize = 20;
pub const DEFAULT_EMA_WINDOW: usize = 20;
pub const DEFAULT_RSI_WINDOW: usize = 14;

/// A technical analysis indicator computed from close prices.
///
/// Output is always aligned one-to-one with the input. Entries inside the
/// warm-up period are `None`. Implementations never fail: short or empty
/// input produces undefined entries instead.
pub trait Indicator: Send {
    /// Legend label, e.g. `"SMA (20)"`.
    fn label(&self) -> String;

    /// Number of leading entries left undefined.
    fn warm_up(&self) -> usize;

    fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Sma,
    Ema,
    Rsi,
    Macd,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 4] = [Self::Sma, Self::Ema, Self::Rsi, Self::Macd];

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sma" => Some(Self::Sma),
            "ema" => Some(Self::Ema),
            "rsi" => Some(Self::Rsi),
            "macd" => Some(Self::Macd),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sma => "sma",
            Self::Ema => "ema",
            Self::Rsi => "rsi",
            Self::Macd => "macd",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-call parameters. `window` is ignored for MACD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorParams {
    pub window: Option<usize>,
}

/// One plotted line, aligned by index with its source `PriceSeries`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn last_defined(&self) -> Option<f64> {
        self.values.iter().rev().find_map(|v| *v)
    }
}

/// Compute the series for `kind` over `series`.
///
/// Returns one series for SMA, EMA and RSI, and two (MACD line, signal line)
/// for MACD.
pub fn compute_indicator(
    series: &PriceSeries,
    kind: IndicatorKind,
    params: IndicatorParams,
) -> Vec<IndicatorSeries> {
    let closes = series.closes();
    match kind {
        IndicatorKind::Sma => {
            let window = params.window.unwrap_or(DEFAULT_SMA_WINDOW);
            vec![run(&Sma::new(window), &closes)]
        }
        IndicatorKind::Ema => {
            let window = params.window.unwrap_or(DEFAULT_EMA_WINDOW);
            vec![run(&Ema::new(window), &closes)]
        }
        IndicatorKind::Rsi => {
            let window = params.window.unwrap_or(DEFAULT_RSI_WINDOW);
            vec![run(&Rsi::new(window), &closes)]
        }
        IndicatorKind::Macd => {
            let lines = Macd::standard().calculate_lines(&closes);
            vec![
                IndicatorSeries {
                    label: "MACD".into(),
                    values: lines.macd.into_iter().map(Some).collect(),
                },
                IndicatorSeries {
                    label: "MACD Signal".into(),
                    values: lines.signal.into_iter().map(Some).collect(),
                },
            ]
        }
    }
}

fn run(indicator: &dyn Indicator, closes: &[f64]) -> IndicatorSeries {
    IndicatorSeries {
        label: indicator.label(),
        values: indicator.calculate(closes),
    }
}
