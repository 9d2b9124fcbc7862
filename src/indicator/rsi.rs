use crate::indicator::Indicator;

/// RSI (Relative Strength Index) using simple rolling means of gains and
/// losses.
///
/// Defined from index `period` onward, once `period` price changes exist.
/// A window with no losses yields exactly 100.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Rsi {
    fn label(&self) -> String {
        format!("RSI ({})", self.period)
    }

    fn warm_up(&self) -> usize {
        self.period
    }

    fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>> {
        if self.period == 0 || closes.len() <= self.period {
            return vec![None; closes.len()];
        }

        let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

        let mut results = vec![None; self.warm_up()];
        results.extend(deltas.windows(self.period).map(|window| {
            let avg_gain = window.iter().map(|&d| d.max(0.0)).sum::<f64>() / self.period as f64;
            let avg_loss = window.iter().map(|&d| (-d).max(0.0)).sum::<f64>() / self.period as f64;
            Some(rsi_value(avg_gain, avg_loss))
        }));
        results
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
