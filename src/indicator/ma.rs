use crate::indicator::Indicator;

/// Simple Moving Average.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Sma {
    fn label(&self) -> String {
        format!("SMA ({})", self.period)
    }

    fn warm_up(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>> {
        if self.period == 0 || closes.len() < self.period {
            return vec![None; closes.len()];
        }

        let mut results = vec![None; self.warm_up()];
        results.extend(
            closes
                .windows(self.period)
                .map(|w| Some(w.iter().sum::<f64>() / self.period as f64)),
        );
        results
    }
}

/// Exponential Moving Average.
///
/// Seeded with the first close rather than an SMA of the first `period`
/// values, so every entry is defined. MACD relies on this.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Smoothed values over an arbitrary slice. Empty for a zero period.
    pub fn smooth(&self, values: &[f64]) -> Vec<f64> {
        if self.period == 0 {
            return Vec::new();
        }

        let alpha = 2.0 / (self.period as f64 + 1.0);
        let mut results = Vec::with_capacity(values.len());
        let mut iter = values.iter();
        let Some(&seed) = iter.next() else {
            return results;
        };

        let mut ema = seed;
        results.push(ema);
        for &value in iter {
            ema = alpha * value + (1.0 - alpha) * ema;
            results.push(ema);
        }
        results
    }
}

impl Indicator for Ema {
    fn label(&self) -> String {
        format!("EMA ({})", self.period)
    }

    fn warm_up(&self) -> usize {
        0
    }

    fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>> {
        if self.period == 0 {
            return vec![None; closes.len()];
        }
        self.smooth(closes).into_iter().map(Some).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let v = actual.expect("expected a defined value");
        assert!((v - expected).abs() < 1e-9, "expected {expected}, got {v}");
    }

    #[test]
    fn sma_known_scenario() {
        let values = Sma::new(3).calculate(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        assert_eq!(values.len(), 5);
        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        assert_close(values[2], 11.0);
        assert_close(values[3], 12.0);
        assert_close(values[4], 13.0);
    }

    #[test]
    fn sma_matches_slice_mean() {
        let closes = [3.5, 1.25, 8.0, 4.75, 6.0, 2.5, 9.25];
        let window = 4;
        let values = Sma::new(window).calculate(&closes);
        assert_eq!(values.len(), closes.len());
        for (i, v) in values.iter().enumerate() {
            if i < window - 1 {
                assert!(v.is_none());
            } else {
                let slice = &closes[i + 1 - window..=i];
                assert_close(*v, slice.iter().sum::<f64>() / window as f64);
            }
        }
    }

    #[test]
    fn sma_insufficient_data_all_undefined() {
        let values = Sma::new(5).calculate(&[1.0; 4]);
        assert_eq!(values, vec![None; 4]);
    }

    #[test]
    fn sma_window_equal_to_len() {
        let values = Sma::new(4).calculate(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(&values[..3], &[None, None, None]);
        assert_close(values[3], 2.5);
    }

    #[test]
    fn sma_empty_input() {
        assert!(Sma::new(3).calculate(&[]).is_empty());
    }

    #[test]
    fn sma_zero_period_all_undefined() {
        assert_eq!(Sma::new(0).calculate(&[1.0, 2.0]), vec![None, None]);
    }

    #[test]
    fn ema_known_scenario() {
        let values = Ema::new(3).calculate(&[10.0, 12.0, 11.0, 13.0, 12.0]);
        let expected = [10.0, 11.0, 11.0, 12.0, 12.0];
        assert_eq!(values.len(), expected.len());
        for (v, e) in values.iter().zip(expected) {
            assert_close(*v, e);
        }
    }

    #[test]
    fn ema_first_value_is_first_close() {
        let closes = [42.5, 40.0, 41.0];
        for period in [1, 2, 3, 20, 200] {
            let values = Ema::new(period).calculate(&closes);
            assert_eq!(values[0], Some(42.5));
        }
    }

    #[test]
    fn ema_flat_prices() {
        for v in Ema::new(3).calculate(&[10.0; 6]) {
            assert_close(v, 10.0);
        }
    }

    #[test]
    fn ema_defined_even_when_shorter_than_period() {
        let values = Ema::new(20).calculate(&[1.0, 2.0]);
        assert!(values.iter().all(Option::is_some));
    }

    #[test]
    fn ema_empty_and_zero_period() {
        assert!(Ema::new(3).calculate(&[]).is_empty());
        assert_eq!(Ema::new(0).calculate(&[1.0, 2.0]), vec![None, None]);
    }
}
