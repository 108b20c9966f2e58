//! Technical indicators
//!
//! Trailing-window formulas over a price series. Positions without enough
//! history hold `f64::NAN`, mirroring how the series are consumed: the full
//! table keeps the NaN prefix for charting, the training subset drops it.

/// Simple Moving Average. The first `period - 1` positions are NaN.
pub fn sma(prices: &[f64], period: usize) -> Vec<f64> {
    if prices.len() < period || period == 0 {
        return vec![f64::NAN; prices.len()];
    }

    let mut result = vec![f64::NAN; period - 1];

    for i in (period - 1)..prices.len() {
        let sum: f64 = prices[(i + 1 - period)..=i].iter().sum();
        result.push(sum / period as f64);
    }

    result
}

/// Relative Strength Index with Wilder smoothing. The first `period`
/// positions are NaN.
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    if prices.len() < period + 1 {
        return vec![f64::NAN; prices.len()];
    }

    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());
    gains.push(0.0);
    losses.push(0.0);

    for i in 1..prices.len() {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    let mut result = vec![f64::NAN; prices.len()];

    let mut avg_gain: f64 = gains[1..=period].iter().sum::<f64>() / period as f64;
    let mut avg_loss: f64 = losses[1..=period].iter().sum::<f64>() / period as f64;

    for i in period..prices.len() {
        if i > period {
            avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        }

        if avg_loss == 0.0 {
            result[i] = 100.0;
        } else {
            let rs = avg_gain / avg_loss;
            result[i] = 100.0 - (100.0 / (1.0 + rs));
        }
    }

    result
}

/// Period-over-period fractional change. The first position is NaN, as is
/// any position whose predecessor is zero.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return vec![];
    }

    let mut result = vec![f64::NAN];

    for i in 1..values.len() {
        if values[i - 1] != 0.0 {
            result.push((values[i] - values[i - 1]) / values[i - 1]);
        } else {
            result.push(f64::NAN);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_trailing_mean() {
        let prices = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&prices, 3);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!((result[2] - 2.0).abs() < 1e-10);
        assert!((result[3] - 3.0).abs() < 1e-10);
        assert!((result[4] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn sma_short_series_is_all_nan() {
        let result = sma(&[1.0, 2.0], 5);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_defined_from_period_and_bounded() {
        let prices = vec![
            44.0, 44.25, 44.5, 43.75, 44.5, 44.25, 44.0, 43.5, 43.75, 44.0, 44.5, 44.25, 44.75,
            45.0, 45.5, 45.25, 46.0,
        ];
        let result = rsi(&prices, 14);

        for v in result.iter().take(14) {
            assert!(v.is_nan());
        }
        for v in result.iter().skip(14) {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn rsi_all_gains_saturates() {
        let prices: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let result = rsi(&prices, 14);
        assert_eq!(result[14], 100.0);
    }

    #[test]
    fn pct_change_fractions() {
        let result = pct_change(&[100.0, 110.0, 104.5]);
        assert!(result[0].is_nan());
        assert!((result[1] - 0.10).abs() < 1e-10);
        assert!((result[2] - (-0.05)).abs() < 1e-10);
    }

    #[test]
    fn pct_change_zero_denominator_is_nan() {
        let result = pct_change(&[0.0, 5.0]);
        assert!(result[1].is_nan());
    }
}
