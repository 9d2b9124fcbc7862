use crate::indicator::ma::Ema;

const FAST_PERIOD: usize = 12;
const SLOW_PERIOD: usize = 26;
const SIGNAL_PERIOD: usize = 9;

/// MACD line and its signal line, both aligned with the input closes.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    /// The conventional 12/26/9 configuration.
    pub fn standard() -> Self {
        Self {
            fast_period: FAST_PERIOD,
            slow_period: SLOW_PERIOD,
            signal_period: SIGNAL_PERIOD,
        }
    }

    pub fn calculate_lines(&self, closes: &[f64]) -> MacdLines {
        let fast_ema = Ema::new(self.fast_period).smooth(closes);
        let slow_ema = Ema::new(self.slow_period).smooth(closes);

        // Both EMAs are seeded from the first close, so they line up index
        // for index and no offset is needed.
        let macd: Vec<f64> = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();
        let signal = Ema::new(self.signal_period).smooth(&macd);

        MacdLines { macd, signal }
    }
}
