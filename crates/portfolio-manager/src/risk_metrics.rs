use crate::models::*;
use crate::shared_math::{self, TRADING_DAYS};
use rust_decimal::prelude::*;

pub struct RiskCalculator;

impl RiskCalculator {
    /// Compute risk metrics from a snapshot history. Snapshots may arrive in
    /// any order; they are sorted by date first. Fewer than two snapshots
    /// yield zeroed metrics.
    pub fn compute(snapshots: &[PortfolioSnapshot]) -> RiskMetrics {
        let mut ordered: Vec<&PortfolioSnapshot> = snapshots.iter().collect();
        ordered.sort_by_key(|s| s.snapshot_date);

        let values: Vec<f64> = ordered
            .iter()
            .map(|s| s.total_value.to_f64().unwrap_or(0.0))
            .collect();

        if values.len() < 2 {
            return RiskMetrics {
                data_points: values.len(),
                ..RiskMetrics::default()
            };
        }

        // Dated returns; a zero previous value has no defined return
        let dated: Vec<DayReturn> = ordered
            .windows(2)
            .zip(values.windows(2))
            .filter(|(_, v)| v[0] != 0.0)
            .map(|(s, v)| DayReturn {
                date: s[1].snapshot_date,
                return_percent: (v[1] - v[0]) / v[0] * 100.0,
            })
            .collect();
        let returns: Vec<f64> = dated.iter().map(|d| d.return_percent).collect();

        let mean_daily_return = shared_math::mean(&returns);
        let volatility = shared_math::population_std_dev(&returns);
        let downside_volatility = shared_math::downside_deviation(&returns);
        let drawdown = shared_math::max_drawdown(&values);
        let annualized_return = mean_daily_return * TRADING_DAYS;

        let max_drawdown_period = if drawdown.max_percent < 0.0 {
            Some(DrawdownPeriod {
                peak_date: ordered[drawdown.peak_index].snapshot_date,
                trough_date: ordered[drawdown.trough_index].snapshot_date,
            })
        } else {
            None
        };

        let first = values[0];
        let last = values[values.len() - 1];
        let total_return_percent = if first > 0.0 {
            (last - first) / first * 100.0
        } else {
            0.0
        };

        let positive_days = returns.iter().filter(|&&r| r > 0.0).count();
        let win_rate = if returns.is_empty() {
            0.0
        } else {
            positive_days as f64 / returns.len() as f64 * 100.0
        };

        let best_day = dated.iter().copied().fold(None, |best: Option<DayReturn>, d| match best {
            Some(b) if b.return_percent >= d.return_percent => Some(b),
            _ => Some(d),
        });
        let worst_day = dated.iter().copied().fold(None, |worst: Option<DayReturn>, d| match worst {
            Some(w) if w.return_percent <= d.return_percent => Some(w),
            _ => Some(d),
        });

        RiskMetrics {
            data_points: values.len(),
            total_return_percent,
            mean_daily_return,
            volatility,
            downside_volatility,
            sharpe_ratio: shared_math::ratio_or_zero(mean_daily_return, volatility),
            sortino_ratio: shared_math::ratio_or_zero(mean_daily_return, downside_volatility),
            max_drawdown_percent: drawdown.max_percent,
            max_drawdown_period,
            current_drawdown_percent: drawdown.current_percent,
            annualized_return,
            calmar_ratio: shared_math::ratio_or_zero(annualized_return, drawdown.max_percent.abs()),
            win_rate,
            best_day,
            worst_day,
            var_95: shared_math::var_historical(&returns, 0.95),
            cvar_95: shared_math::cvar_historical(&returns, 0.95),
        }
    }
}
