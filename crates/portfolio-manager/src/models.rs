use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sector label used when a holding has none.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// A long-only position with its current price resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioHolding {
    pub symbol: String,
    pub shares: Decimal,
    pub average_cost: Decimal,
    pub current_price: Decimal,
    #[serde(default)]
    pub sector: Option<String>,
}

impl PortfolioHolding {
    pub fn current_value(&self) -> Decimal {
        self.shares * self.current_price
    }

    pub fn cost_basis(&self) -> Decimal {
        self.shares * self.average_cost
    }

    pub fn gain_loss(&self) -> Decimal {
        self.current_value() - self.cost_basis()
    }

    pub fn gain_loss_percent(&self) -> f64 {
        let cost = self.cost_basis().to_f64().unwrap_or(0.0);
        if cost > 0.0 {
            self.gain_loss().to_f64().unwrap_or(0.0) / cost * 100.0
        } else {
            0.0
        }
    }

    /// Share of `total` held in this position, in percent.
    pub fn allocation_percent(&self, total: Decimal) -> f64 {
        let total = total.to_f64().unwrap_or(0.0);
        if total > 0.0 {
            self.current_value().to_f64().unwrap_or(0.0) / total * 100.0
        } else {
            0.0
        }
    }

    pub fn sector_or_unknown(&self) -> &str {
        self.sector
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(UNKNOWN_SECTOR)
    }
}

/// Point-in-time valuation of a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub snapshot_date: DateTime<Utc>,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_gain_loss: Decimal,
    pub total_gain_loss_percent: f64,
    #[serde(default)]
    pub day_change: Decimal,
    #[serde(default)]
    pub day_change_percent: f64,
    #[serde(default)]
    pub holdings: Vec<HoldingContribution>,
    #[serde(default)]
    pub sector_allocation: BTreeMap<String, f64>,
    #[serde(default)]
    pub top_performers: Vec<PerformerEntry>,
    #[serde(default)]
    pub top_losers: Vec<PerformerEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingContribution {
    pub symbol: String,
    pub value: Decimal,
    pub gain_loss: Decimal,
    pub gain_loss_percent: f64,
    pub allocation_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformerEntry {
    pub symbol: String,
    pub gain_loss_percent: f64,
}

/// A single day's return and the date it was realised on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayReturn {
    pub date: DateTime<Utc>,
    pub return_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPeriod {
    pub peak_date: DateTime<Utc>,
    pub trough_date: DateTime<Utc>,
}

/// Risk metrics over a snapshot history. Percent-valued fields are in
/// percent (10.0 == 10%). Drawdowns are reported as non-positive numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub data_points: usize,
    pub total_return_percent: f64,
    pub mean_daily_return: f64,
    pub volatility: f64,
    pub downside_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown_percent: f64,
    pub max_drawdown_period: Option<DrawdownPeriod>,
    pub current_drawdown_percent: f64,
    pub annualized_return: f64,
    pub calmar_ratio: f64,
    pub win_rate: f64,
    pub best_day: Option<DayReturn>,
    pub worst_day: Option<DayReturn>,
    /// Historical 95% value at risk, as a positive daily loss in percent.
    pub var_95: Option<f64>,
    pub cvar_95: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancingAction {
    pub symbol: String,
    pub action: TradeAction,
    pub current_shares: f64,
    pub target_shares: f64,
    /// Positive for buys, negative for sells, zero for holds.
    pub shares_to_trade: f64,
    pub current_value: f64,
    pub target_value: f64,
    pub value_difference: f64,
    pub current_allocation: f64,
    pub target_allocation: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RebalancingSummary {
    pub buy_count: usize,
    pub sell_count: usize,
    pub hold_count: usize,
    pub total_trades: usize,
    pub max_position_before: f64,
    pub max_position_after: f64,
    /// Drop in the largest single-position allocation, in percentage points.
    pub risk_reduction: f64,
    pub turnover_value: f64,
    pub turnover_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancingPlan {
    pub strategy: String,
    pub total_value: f64,
    pub target_allocations: BTreeMap<String, f64>,
    /// Sorted by |value_difference|, largest first.
    pub actions: Vec<RebalancingAction>,
    pub summary: RebalancingSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holding(sector: Option<&str>) -> PortfolioHolding {
        PortfolioHolding {
            symbol: "AAPL".to_string(),
            shares: dec!(10),
            average_cost: dec!(150),
            current_price: dec!(180),
            sector: sector.map(str::to_string),
        }
    }

    #[test]
    fn test_holding_valuation() {
        let h = holding(Some("Technology"));
        assert_eq!(h.current_value(), dec!(1800));
        assert_eq!(h.cost_basis(), dec!(1500));
        assert_eq!(h.gain_loss(), dec!(300));
        assert!((h.gain_loss_percent() - 20.0).abs() < 1e-10);
        assert!((h.allocation_percent(dec!(3600)) - 50.0).abs() < 1e-10);
        assert_eq!(h.allocation_percent(Decimal::ZERO), 0.0);
    }

    #[test]
    fn test_missing_sector_is_unknown() {
        assert_eq!(holding(None).sector_or_unknown(), UNKNOWN_SECTOR);
        assert_eq!(holding(Some("  ")).sector_or_unknown(), UNKNOWN_SECTOR);
        assert_eq!(holding(Some("Energy")).sector_or_unknown(), "Energy");
    }

    #[test]
    fn test_holding_deserializes_from_floats() {
        let json = r#"{"symbol":"MSFT","shares":5,"average_cost":300.5,"current_price":320.25}"#;
        let h: PortfolioHolding = serde_json::from_str(json).unwrap();
        assert_eq!(h.current_value(), dec!(1601.25));
        assert!(h.sector.is_none());
    }
}
