/// Default look-back window, in deltas.
pub const DEFAULT_PERIOD: usize = 14;

/// Relative Strength Index over the last `period` price changes.
///
/// Plain sums of gains and losses rather than Wilder smoothing. Returns
/// `None` until `period + 1` prices are available.
pub fn calculate(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let window = &prices[prices.len() - (period + 1)..];

    let (gain, loss) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(gain, loss), delta| {
            if delta >= 0.0 {
                (gain + delta, loss)
            } else {
                (gain, loss - delta)
            }
        });

    if gain + loss == 0.0 {
        // flat
        return Some(50.0);
    }
    if loss == 0.0 {
        return Some(100.0);
    }

    Some(100.0 - 100.0 / (1.0 + gain / loss))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_is_none() {
        let prices: Vec<f64> = (0..14).map(f64::from).collect();
        assert_eq!(calculate(&prices, DEFAULT_PERIOD), None);
        assert_eq!(calculate(&[], DEFAULT_PERIOD), None);
    }

    #[test]
    fn rising_series_is_100() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + f64::from(i)).collect();
        assert_eq!(calculate(&prices, DEFAULT_PERIOD), Some(100.0));

        let longer: Vec<f64> = (0..200).map(|i| f64::from(i).powi(2)).collect();
        assert_eq!(calculate(&longer, DEFAULT_PERIOD), Some(100.0));
    }

    #[test]
    fn falling_series_is_0() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 - f64::from(i)).collect();
        assert_eq!(calculate(&prices, DEFAULT_PERIOD), Some(0.0));
    }

    #[test]
    fn flat_series_is_50() {
        let prices = vec![42.0; 30];
        assert_eq!(calculate(&prices, DEFAULT_PERIOD), Some(50.0));
    }

    #[test]
    fn uses_only_trailing_window() {
        // One large early drop outside the window must not count.
        let mut prices = vec![1000.0, 10.0];
        prices.extend([11.0, 10.0].iter().cycle().take(14));
        // 7 gains of 1.0, 7 losses of 1.0
        let rsi = calculate(&prices, DEFAULT_PERIOD).unwrap();
        assert!((rsi - 50.0).abs() < 1e-9, "rsi = {rsi}");
    }

    #[test]
    fn mixed_moves() {
        // gains 3, losses 1 over a 4-delta window: 100 - 100 / (1 + 3) = 75
        let prices = [10.0, 11.0, 12.0, 11.0, 12.0];
        let rsi = calculate(&prices, 4).unwrap();
        assert!((rsi - 75.0).abs() < 1e-9, "rsi = {rsi}");
    }
}
