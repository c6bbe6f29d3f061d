//! Pure mathematical utilities for portfolio analytics.
//! Stateless functions, no I/O.

/// Trading days per year used for annualisation.
pub const TRADING_DAYS: f64 = 252.0;

/// Simple returns in percent. Steps whose previous value is 0 are skipped.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    if values.len() < 2 {
        return Vec::new();
    }
    values
        .windows(2)
        .filter_map(|w| {
            if w[0] != 0.0 {
                Some((w[1] - w[0]) / w[0] * 100.0)
            } else {
                None
            }
        })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Population standard deviation of the negative returns only; 0 if none.
pub fn downside_deviation(returns: &[f64]) -> f64 {
    let negatives: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    population_std_dev(&negatives)
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Worst peak-to-trough decline of an equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Drawdown {
    /// Most negative (value - peak) / peak in percent; 0 when never below a peak.
    pub max_percent: f64,
    pub peak_index: usize,
    pub trough_index: usize,
    /// Drawdown of the last value from the running peak, in percent.
    pub current_percent: f64,
}

pub fn max_drawdown(values: &[f64]) -> Drawdown {
    if values.is_empty() {
        return Drawdown::default();
    }
    let mut peak = values[0];
    let mut peak_index = 0;
    let mut result = Drawdown::default();

    for (i, &v) in values.iter().enumerate() {
        if v > peak {
            peak = v;
            peak_index = i;
        }
        if peak > 0.0 {
            let dd = (v - peak) / peak * 100.0;
            if dd < result.max_percent {
                result.max_percent = dd;
                result.peak_index = peak_index;
                result.trough_index = i;
            }
        }
    }

    result.current_percent = if peak > 0.0 {
        (values[values.len() - 1] - peak) / peak * 100.0
    } else {
        0.0
    };
    result
}

/// Historical VaR at given confidence (e.g. 0.95 for 95%), as a positive loss.
pub fn var_historical(returns: &[f64], confidence: f64) -> Option<f64> {
    if returns.len() < 10 {
        return None;
    }
    let mut sorted: Vec<f64> = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((1.0 - confidence) * sorted.len() as f64).floor() as usize;
    let idx = idx.min(sorted.len() - 1);
    Some(-sorted[idx])
}

/// Historical CVaR (expected shortfall) at given confidence.
pub fn cvar_historical(returns: &[f64], confidence: f64) -> Option<f64> {
    if returns.len() < 10 {
        return None;
    }
    let mut sorted: Vec<f64> = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let cutoff = ((1.0 - confidence) * sorted.len() as f64).floor() as usize;
    let cutoff = cutoff.max(1).min(sorted.len());
    Some(-mean(&sorted[..cutoff]))
}

/// Annualised volatility (fraction, 0.25 == 25%) of a close-price series:
/// population std-dev of daily simple returns × √252.
pub fn annualized_volatility_from_prices(closes: &[f64]) -> Option<f64> {
    let returns: Vec<f64> = daily_returns(closes).into_iter().map(|r| r / 100.0).collect();
    if returns.len() < 2 {
        return None;
    }
    Some(population_std_dev(&returns) * TRADING_DAYS.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_returns() {
        let values = vec![100.0, 105.0, 103.0, 110.0];
        let returns = daily_returns(&values);
        assert_eq!(returns.len(), 3);
        assert!((returns[0] - 5.0).abs() < 1e-10);
        assert!((returns[1] - (-200.0 / 105.0)).abs() < 1e-10);
    }

    #[test]
    fn test_daily_returns_skip_zero_base() {
        let returns = daily_returns(&[0.0, 100.0, 110.0]);
        assert_eq!(returns.len(), 1);
        assert!((returns[0] - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_population_std_dev() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std_dev(&values) - 2.0).abs() < 1e-12);
        assert_eq!(population_std_dev(&[]), 0.0);
    }

    #[test]
    fn test_downside_deviation_ignores_gains() {
        assert_eq!(downside_deviation(&[1.0, 2.0, 3.0]), 0.0);
        // Negatives -1 and -3: mean -2, deviation 1
        assert!((downside_deviation(&[5.0, -1.0, 2.0, -3.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_drawdown() {
        let values = vec![100.0, 110.0, 105.0, 95.0, 100.0, 115.0, 108.0];
        let dd = max_drawdown(&values);
        // Max DD: peak 110, trough 95
        assert!((dd.max_percent - (-1500.0 / 110.0)).abs() < 1e-9);
        assert_eq!(dd.peak_index, 1);
        assert_eq!(dd.trough_index, 3);
        // Current DD: peak 115, current 108
        assert!((dd.current_percent - (-700.0 / 115.0)).abs() < 1e-9);
    }

    #[test]
    fn test_max_drawdown_monotonic_is_zero() {
        let dd = max_drawdown(&[100.0, 101.0, 102.0]);
        assert_eq!(dd.max_percent, 0.0);
        assert_eq!(dd.current_percent, 0.0);
    }

    #[test]
    fn test_var_historical() {
        let returns = vec![-5.0, -3.0, -1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let var = var_historical(&returns, 0.95).unwrap();
        assert_eq!(var, 5.0);
        assert_eq!(cvar_historical(&returns, 0.95), Some(5.0));
        assert!(var_historical(&returns[..9], 0.95).is_none());
    }

    #[test]
    fn test_annualized_volatility_from_prices() {
        // Alternating +1% / -1% moves
        let mut closes = vec![100.0];
        for i in 0..40 {
            let last = closes[closes.len() - 1];
            closes.push(if i % 2 == 0 { last * 1.01 } else { last * 0.99 });
        }
        let vol = annualized_volatility_from_prices(&closes).unwrap();
        assert!((vol - 0.01 * TRADING_DAYS.sqrt()).abs() < 1e-6);
        assert!(annualized_volatility_from_prices(&[100.0, 101.0]).is_none());
    }

    #[test]
    fn test_ratio_or_zero() {
        assert_eq!(ratio_or_zero(1.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(1.0, 4.0), 0.25);
    }
}
