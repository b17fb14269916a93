//! Simple Moving Average.
//!
//! SMA[i] = mean(values[i-n+1..=i]). Warmup: first (n-1) points are `None`,
//! and any window holding a null input is `None`.

use crate::domain::bar::Bar;

pub fn sma(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let sum = window.iter().copied().sum::<Option<f64>>()?;
            Some(sum / period as f64)
        })
        .collect()
}

pub fn closes(bars: &[Bar]) -> Vec<Option<f64>> {
    bars.iter().map(|b| b.close).collect()
}

pub fn volumes(bars: &[Bar]) -> Vec<Option<f64>> {
    bars.iter().map(|b| b.volume).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn sma_warmup() {
        let out = sma(&some(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!(out[2].is_some());
        assert!(out[3].is_some());
    }

    #[test]
    fn sma_values() {
        let out = sma(&some(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3);
        assert_relative_eq!(out[2].unwrap(), 20.0);
        assert_relative_eq!(out[3].unwrap(), 30.0);
        assert_relative_eq!(out[4].unwrap(), 40.0);
    }

    #[test]
    fn sma_period_1_is_identity() {
        let out = sma(&some(&[5.0, 6.0]), 1);
        assert_eq!(out, some(&[5.0, 6.0]));
    }

    #[test]
    fn null_poisons_its_windows_only() {
        let values = vec![Some(1.0), None, Some(3.0), Some(5.0), Some(7.0)];
        let out = sma(&values, 2);
        assert_eq!(out[1], None);
        assert_eq!(out[2], None);
        assert_relative_eq!(out[3].unwrap(), 4.0);
        assert_relative_eq!(out[4].unwrap(), 6.0);
    }

    #[test]
    fn shorter_than_period() {
        let out = sma(&some(&[1.0, 2.0]), 5);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn zero_period() {
        assert_eq!(sma(&some(&[1.0]), 0), vec![None]);
    }
}
