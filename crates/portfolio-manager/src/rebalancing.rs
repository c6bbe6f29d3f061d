use crate::error::PortfolioError;
use crate::models::*;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub const DEFAULT_MAX_SECTOR_PERCENT: f64 = 25.0;

/// Volatility assumed when neither the caller nor the sector table has one.
pub const FALLBACK_VOLATILITY: f64 = 0.25;

/// Accepted distance of a custom target map's total from 100.
const CUSTOM_SUM_TOLERANCE: f64 = 0.5;

/// Value gaps at or below this are rounding noise, even with a zero deadband.
const VALUE_EPSILON: f64 = 1e-6;

fn default_max_sector_percent() -> f64 {
    DEFAULT_MAX_SECTOR_PERCENT
}

/// How target allocations are derived from the current holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RebalanceStrategy {
    EqualWeight,
    SectorBalanced {
        #[serde(default = "default_max_sector_percent")]
        max_sector_percent: f64,
    },
    /// Annualised volatility per symbol (0.25 == 25%). Symbols without an
    /// entry fall back to [`default_sector_volatility`].
    RiskParity {
        #[serde(default)]
        volatilities: HashMap<String, f64>,
    },
    /// Target percent per symbol.
    Custom { targets: HashMap<String, f64> },
}

impl RebalanceStrategy {
    /// Parse a strategy by name with default parameters. `custom` needs a
    /// target map and cannot be built from a name alone.
    pub fn from_name(name: &str) -> Result<Self, PortfolioError> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "equal_weight" => Ok(RebalanceStrategy::EqualWeight),
            "sector_balanced" => Ok(RebalanceStrategy::SectorBalanced {
                max_sector_percent: DEFAULT_MAX_SECTOR_PERCENT,
            }),
            "risk_parity" => Ok(RebalanceStrategy::RiskParity {
                volatilities: HashMap::new(),
            }),
            "custom" => Err(PortfolioError::validation(
                "custom strategy requires a target allocation map",
            )),
            other => Err(PortfolioError::Validation(format!(
                "Unknown rebalancing strategy '{}' (expected equal_weight, sector_balanced, risk_parity or custom)",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RebalanceStrategy::EqualWeight => "equal_weight",
            RebalanceStrategy::SectorBalanced { .. } => "sector_balanced",
            RebalanceStrategy::RiskParity { .. } => "risk_parity",
            RebalanceStrategy::Custom { .. } => "custom",
        }
    }
}

/// Minimum trade size. A holding is left alone unless its value gap exceeds
/// `max(min_trade_percent% of current value, min_trade_value)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deadband {
    pub min_trade_value: f64,
    pub min_trade_percent: f64,
}

impl Default for Deadband {
    fn default() -> Self {
        Self {
            min_trade_value: 100.0,
            min_trade_percent: 1.0,
        }
    }
}

impl Deadband {
    pub fn validate(&self) -> Result<(), PortfolioError> {
        for (field, value) in [
            ("min_trade_value", self.min_trade_value),
            ("min_trade_percent", self.min_trade_percent),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PortfolioError::Validation(format!(
                    "{} must be a non-negative number, got {}",
                    field, value
                )));
            }
        }
        Ok(())
    }

    pub fn threshold(&self, current_value: f64) -> f64 {
        (current_value * self.min_trade_percent / 100.0)
            .max(self.min_trade_value)
            .max(VALUE_EPSILON)
    }
}

/// Heuristic annualised volatility by sector.
pub fn default_sector_volatility(sector: &str) -> f64 {
    match sector {
        "Technology" => 0.30,
        "Energy" => 0.35,
        "Healthcare" => 0.25,
        "Financials" => 0.22,
        "Consumer Discretionary" => 0.28,
        "Industrials" => 0.22,
        "Materials" => 0.25,
        "Communication Services" => 0.27,
        "Real Estate" => 0.20,
        "Consumer Staples" => 0.15,
        "Utilities" => 0.15,
        _ => FALLBACK_VOLATILITY,
    }
}

/// Holding reduced to the numbers the planner works with.
struct Valued<'a> {
    symbol: &'a str,
    sector: &'a str,
    shares: f64,
    price: f64,
    value: f64,
}

pub struct RebalanceCalculator;

impl RebalanceCalculator {
    /// Plan trades with the default $100 / 1% deadband.
    pub fn plan(
        holdings: &[PortfolioHolding],
        strategy: &RebalanceStrategy,
    ) -> Result<RebalancingPlan, PortfolioError> {
        Self::plan_with_deadband(holdings, strategy, &Deadband::default())
    }

    pub fn plan_with_deadband(
        holdings: &[PortfolioHolding],
        strategy: &RebalanceStrategy,
        deadband: &Deadband,
    ) -> Result<RebalancingPlan, PortfolioError> {
        deadband.validate()?;
        let valued = value_holdings(holdings)?;
        let total: f64 = valued.iter().map(|v| v.value).sum();
        let targets = target_weights(&valued, total, strategy)?;

        let mut actions: Vec<RebalancingAction> = valued
            .iter()
            .zip(&targets)
            .map(|(v, &target)| build_action(v, target, total, deadband))
            .collect();
        actions.sort_by(|a, b| {
            b.value_difference
                .abs()
                .partial_cmp(&a.value_difference.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let summary = summarize(&actions, total);
        tracing::info!(
            strategy = strategy.name(),
            holdings = actions.len(),
            buys = summary.buy_count,
            sells = summary.sell_count,
            turnover = summary.turnover_value,
            "rebalancing plan computed"
        );

        Ok(RebalancingPlan {
            strategy: strategy.name().to_string(),
            total_value: total,
            target_allocations: valued
                .iter()
                .zip(&targets)
                .map(|(v, &t)| (v.symbol.to_string(), t))
                .collect(),
            actions,
            summary,
        })
    }

    /// Target allocation per symbol, summing to 100.
    pub fn target_allocations(
        holdings: &[PortfolioHolding],
        strategy: &RebalanceStrategy,
    ) -> Result<BTreeMap<String, f64>, PortfolioError> {
        let valued = value_holdings(holdings)?;
        let total: f64 = valued.iter().map(|v| v.value).sum();
        let targets = target_weights(&valued, total, strategy)?;
        Ok(valued
            .iter()
            .zip(targets)
            .map(|(v, t)| (v.symbol.to_string(), t))
            .collect())
    }
}

fn value_holdings(holdings: &[PortfolioHolding]) -> Result<Vec<Valued<'_>>, PortfolioError> {
    if holdings.is_empty() {
        return Err(PortfolioError::validation("No holdings to rebalance"));
    }

    let mut seen = HashSet::new();
    let mut valued = Vec::with_capacity(holdings.len());
    for h in holdings {
        if !seen.insert(h.symbol.as_str()) {
            return Err(PortfolioError::Validation(format!(
                "Duplicate holding for {}",
                h.symbol
            )));
        }
        if h.shares.is_sign_negative() && !h.shares.is_zero() {
            return Err(PortfolioError::Validation(format!(
                "{}: short positions are not supported",
                h.symbol
            )));
        }
        valued.push(Valued {
            symbol: &h.symbol,
            sector: h.sector_or_unknown(),
            shares: h.shares.to_f64().unwrap_or(0.0),
            price: h.current_price.to_f64().unwrap_or(0.0),
            value: h.current_value().to_f64().unwrap_or(0.0),
        });
    }

    let total: f64 = valued.iter().map(|v| v.value).sum();
    if total <= 0.0 {
        return Err(PortfolioError::validation("Portfolio has no value to rebalance"));
    }
    Ok(valued)
}

fn target_weights(
    valued: &[Valued<'_>],
    total: f64,
    strategy: &RebalanceStrategy,
) -> Result<Vec<f64>, PortfolioError> {
    let raw = match strategy {
        RebalanceStrategy::EqualWeight => vec![1.0; valued.len()],
        RebalanceStrategy::SectorBalanced { max_sector_percent } => {
            sector_balanced(valued, total, *max_sector_percent)?
        }
        RebalanceStrategy::RiskParity { volatilities } => risk_parity(valued, volatilities)?,
        RebalanceStrategy::Custom { targets } => custom(valued, targets)?,
    };
    normalize(raw)
}

fn normalize(weights: Vec<f64>) -> Result<Vec<f64>, PortfolioError> {
    let sum: f64 = weights.iter().sum();
    if !(sum > 0.0) || !sum.is_finite() {
        return Err(PortfolioError::validation(
            "Target allocations must have a positive total",
        ));
    }
    Ok(weights.into_iter().map(|w| w / sum * 100.0).collect())
}

fn sector_balanced(
    valued: &[Valued<'_>],
    total: f64,
    max_sector_percent: f64,
) -> Result<Vec<f64>, PortfolioError> {
    if !max_sector_percent.is_finite() || max_sector_percent <= 0.0 || max_sector_percent > 100.0 {
        return Err(PortfolioError::Validation(format!(
            "max_sector_percent must be in (0, 100], got {}",
            max_sector_percent
        )));
    }

    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, v) in valued.iter().enumerate() {
        groups.entry(v.sector).or_default().push(i);
    }

    let mut weights = vec![0.0; valued.len()];

    if groups.len() <= 3 {
        let per_sector = 100.0 / groups.len() as f64;
        for members in groups.values() {
            for &i in members {
                weights[i] = per_sector / members.len() as f64;
            }
        }
        return Ok(weights);
    }

    let current: BTreeMap<&str, f64> = groups
        .iter()
        .map(|(sector, members)| {
            let value: f64 = members.iter().map(|&i| valued[i].value).sum();
            (*sector, value / total * 100.0)
        })
        .collect();
    let sector_targets = cap_sectors(&current, max_sector_percent);

    for (sector, members) in &groups {
        let target = sector_targets.get(sector).copied().unwrap_or(0.0);
        let sector_value: f64 = members.iter().map(|&i| valued[i].value).sum();
        for &i in members {
            weights[i] = if sector_value > 0.0 {
                target * valued[i].value / sector_value
            } else {
                target / members.len() as f64
            };
        }
    }
    Ok(weights)
}

/// Cap sector allocations at `cap` and hand the remainder to the other
/// sectors in proportion to their current allocation, repeating until no
/// sector breaches the cap.
fn cap_sectors<'a>(current: &BTreeMap<&'a str, f64>, cap: f64) -> BTreeMap<&'a str, f64> {
    let n = current.len() as f64;
    if cap * n < 100.0 - 1e-9 {
        tracing::warn!(
            cap,
            sectors = current.len(),
            "sector ceiling cannot be met, distributing evenly across sectors"
        );
        return current.keys().map(|s| (*s, 100.0 / n)).collect();
    }

    let mut capped: BTreeSet<&str> = current
        .iter()
        .filter(|(_, alloc)| **alloc > cap)
        .map(|(s, _)| *s)
        .collect();

    loop {
        let remaining = 100.0 - cap * capped.len() as f64;
        let free: Vec<(&str, f64)> = current
            .iter()
            .filter(|(s, _)| !capped.contains(*s))
            .map(|(s, a)| (*s, *a))
            .collect();
        let free_sum: f64 = free.iter().map(|(_, a)| a).sum();
        let scaled = |alloc: f64| {
            if free_sum > 0.0 {
                alloc * remaining / free_sum
            } else {
                remaining / free.len() as f64
            }
        };

        let breaches: Vec<&str> = free
            .iter()
            .filter(|(_, a)| scaled(*a) > cap + 1e-9)
            .map(|(s, _)| *s)
            .collect();

        if breaches.is_empty() {
            return current
                .keys()
                .map(|s| {
                    let target = if capped.contains(s) {
                        cap
                    } else {
                        scaled(current[s])
                    };
                    (*s, target)
                })
                .collect();
        }
        capped.extend(breaches);
    }
}

fn risk_parity(
    valued: &[Valued<'_>],
    volatilities: &HashMap<String, f64>,
) -> Result<Vec<f64>, PortfolioError> {
    valued
        .iter()
        .map(|v| {
            let vol = volatilities
                .get(v.symbol)
                .copied()
                .unwrap_or_else(|| default_sector_volatility(v.sector));
            if !vol.is_finite() || vol <= 0.0 {
                return Err(PortfolioError::Validation(format!(
                    "{}: volatility must be positive, got {}",
                    v.symbol, vol
                )));
            }
            Ok(1.0 / vol)
        })
        .collect()
}

fn custom(valued: &[Valued<'_>], targets: &HashMap<String, f64>) -> Result<Vec<f64>, PortfolioError> {
    if let Some((symbol, value)) = targets.iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
        return Err(PortfolioError::Validation(format!(
            "{}: target allocation must be non-negative, got {}",
            symbol, value
        )));
    }
    let sum: f64 = targets.values().sum();
    if (sum - 100.0).abs() > CUSTOM_SUM_TOLERANCE {
        return Err(PortfolioError::Validation(format!(
            "Custom target allocations must sum to 100, got {:.2}",
            sum
        )));
    }

    for symbol in targets.keys() {
        if !valued.iter().any(|v| v.symbol == symbol.as_str()) {
            tracing::warn!(symbol = %symbol, "custom target for a symbol not held, ignoring");
        }
    }

    let weights: Vec<f64> = valued
        .iter()
        .map(|v| targets.get(v.symbol).copied().unwrap_or(0.0))
        .collect();
    if weights.iter().all(|&w| w == 0.0) {
        return Err(PortfolioError::validation(
            "Custom targets do not cover any current holding",
        ));
    }
    Ok(weights)
}

fn build_action(v: &Valued<'_>, target_allocation: f64, total: f64, deadband: &Deadband) -> RebalancingAction {
    let current_allocation = v.value / total * 100.0;
    let target_value = target_allocation * total / 100.0;
    let value_difference = target_value - v.value;

    let (action, target_shares, shares_to_trade, reason) = if v.price <= 0.0 {
        (
            TradeAction::Hold,
            v.shares,
            0.0,
            "No valid price, position left unchanged".to_string(),
        )
    } else {
        let target_shares = target_value / v.price;
        let shares_to_trade = target_shares - v.shares;
        let threshold = deadband.threshold(v.value);
        if value_difference.abs() <= threshold || shares_to_trade == 0.0 {
            (
                TradeAction::Hold,
                target_shares,
                0.0,
                format!("Within deadband of ${:.2}", threshold),
            )
        } else if shares_to_trade > 0.0 {
            (
                TradeAction::Buy,
                target_shares,
                shares_to_trade,
                format!(
                    "Increase allocation from {:.2}% to {:.2}%",
                    current_allocation, target_allocation
                ),
            )
        } else {
            (
                TradeAction::Sell,
                target_shares,
                shares_to_trade,
                format!(
                    "Reduce allocation from {:.2}% to {:.2}%",
                    current_allocation, target_allocation
                ),
            )
        }
    };

    RebalancingAction {
        symbol: v.symbol.to_string(),
        action,
        current_shares: v.shares,
        target_shares,
        shares_to_trade,
        current_value: v.value,
        target_value,
        value_difference,
        current_allocation,
        target_allocation,
        reason,
    }
}

fn summarize(actions: &[RebalancingAction], total: f64) -> RebalancingSummary {
    let count = |kind: TradeAction| actions.iter().filter(|a| a.action == kind).count();
    let buy_count = count(TradeAction::Buy);
    let sell_count = count(TradeAction::Sell);
    let max_position_before = actions
        .iter()
        .map(|a| a.current_allocation)
        .fold(0.0, f64::max);
    let max_position_after = actions
        .iter()
        .map(|a| a.target_allocation)
        .fold(0.0, f64::max);
    let turnover_value: f64 = actions
        .iter()
        .filter(|a| a.action != TradeAction::Hold)
        .map(|a| a.value_difference.abs())
        .sum();

    RebalancingSummary {
        buy_count,
        sell_count,
        hold_count: count(TradeAction::Hold),
        total_trades: buy_count + sell_count,
        max_position_before,
        max_position_after,
        risk_reduction: max_position_before - max_position_after,
        turnover_value,
        turnover_percent: if total > 0.0 {
            turnover_value / total * 100.0
        } else {
            0.0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(symbol: &str, sector: &str, shares: i64, price: i64) -> PortfolioHolding {
        PortfolioHolding {
            symbol: symbol.to_string(),
            shares: Decimal::from(shares),
            average_cost: Decimal::from(price),
            current_price: Decimal::from(price),
            sector: Some(sector.to_string()),
        }
    }

    fn targets_sum(plan: &RebalancingPlan) -> f64 {
        plan.target_allocations.values().sum()
    }

    fn assert_signs_match(plan: &RebalancingPlan) {
        for a in &plan.actions {
            match a.action {
                TradeAction::Buy => assert!(a.shares_to_trade > 0.0, "{:?}", a),
                TradeAction::Sell => assert!(a.shares_to_trade < 0.0, "{:?}", a),
                TradeAction::Hold => assert_eq!(a.shares_to_trade, 0.0),
            }
        }
    }

    #[test]
    fn test_equal_weight_balanced_portfolio_holds() {
        let holdings = vec![
            holding("AAPL", "Technology", 10, 100),
            holding("XOM", "Energy", 20, 50),
            holding("JPM", "Financials", 5, 200),
        ];
        let plan = RebalanceCalculator::plan(&holdings, &RebalanceStrategy::EqualWeight).unwrap();

        assert_eq!(plan.strategy, "equal_weight");
        assert_eq!(plan.total_value, 3000.0);
        assert_eq!(plan.summary.hold_count, 3);
        assert_eq!(plan.summary.total_trades, 0);
        assert!(plan.actions.iter().all(|a| a.action == TradeAction::Hold));
        assert!((targets_sum(&plan) - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_equal_weight_trades_imbalance() {
        let holdings = vec![
            holding("AAPL", "Technology", 70, 100),
            holding("XOM", "Energy", 20, 50),
            holding("JPM", "Financials", 10, 200),
        ];
        let plan = RebalanceCalculator::plan(&holdings, &RebalanceStrategy::EqualWeight).unwrap();

        // 7000 / 1000 / 2000 -> 3333.33 each
        assert_eq!(plan.actions[0].symbol, "AAPL");
        assert_eq!(plan.actions[0].action, TradeAction::Sell);
        assert!((plan.actions[0].target_shares - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(plan.summary.buy_count, 2);
        assert_eq!(plan.summary.sell_count, 1);
        assert!((plan.summary.max_position_before - 70.0).abs() < 1e-9);
        assert!((plan.summary.risk_reduction - (70.0 - 100.0 / 3.0)).abs() < 1e-9);
        assert!((plan.summary.turnover_value - 2.0 * (7000.0 - 10000.0 / 3.0)).abs() < 1e-6);
        assert_signs_match(&plan);

        // Largest gap first
        let gaps: Vec<f64> = plan.actions.iter().map(|a| a.value_difference.abs()).collect();
        assert!(gaps.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_deadband_suppresses_small_trades() {
        // 20_000 vs 19_700: gap of 150 stays inside the 1% (200) band
        let holdings = vec![
            holding("AAPL", "Technology", 200, 100),
            holding("MSFT", "Technology", 197, 100),
        ];
        let plan = RebalanceCalculator::plan(&holdings, &RebalanceStrategy::EqualWeight).unwrap();
        assert_eq!(plan.summary.hold_count, 2);

        let tight = Deadband {
            min_trade_value: 10.0,
            min_trade_percent: 0.1,
        };
        let plan = RebalanceCalculator::plan_with_deadband(&holdings, &RebalanceStrategy::EqualWeight, &tight)
            .unwrap();
        assert_eq!(plan.summary.total_trades, 2);
        assert_signs_match(&plan);
    }

    #[test]
    fn test_non_positive_price_holds() {
        let mut holdings = vec![
            holding("AAPL", "Technology", 10, 100),
            holding("DEAD", "Energy", 50, 0),
        ];
        holdings[1].average_cost = Decimal::from(10);
        let plan = RebalanceCalculator::plan(&holdings, &RebalanceStrategy::EqualWeight).unwrap();
        let dead = plan.actions.iter().find(|a| a.symbol == "DEAD").unwrap();
        assert_eq!(dead.action, TradeAction::Hold);
        assert_eq!(dead.shares_to_trade, 0.0);
        assert_eq!(dead.target_shares, 50.0);
    }

    #[test]
    fn test_sector_balanced_few_sectors_split_evenly() {
        let holdings = vec![
            holding("AAPL", "Technology", 50, 100),
            holding("MSFT", "Technology", 30, 100),
            holding("XOM", "Energy", 20, 100),
        ];
        let strategy = RebalanceStrategy::from_name("sector_balanced").unwrap();
        let targets = RebalanceCalculator::target_allocations(&holdings, &strategy).unwrap();
        assert!((targets["AAPL"] - 25.0).abs() < 1e-9);
        assert!((targets["MSFT"] - 25.0).abs() < 1e-9);
        assert!((targets["XOM"] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_sector_cap_with_five_sectors() {
        let holdings = vec![
            holding("AAPL", "Technology", 30, 100),
            holding("MSFT", "Technology", 30, 100),
            holding("JPM", "Financials", 10, 100),
            holding("JNJ", "Healthcare", 10, 100),
            holding("XOM", "Energy", 10, 100),
            holding("NEE", "Utilities", 10, 100),
        ];
        let strategy = RebalanceStrategy::SectorBalanced {
            max_sector_percent: 25.0,
        };
        let plan = RebalanceCalculator::plan(&holdings, &strategy).unwrap();
        let t = &plan.target_allocations;

        assert!((t["AAPL"] + t["MSFT"] - 25.0).abs() < 1e-9);
        assert!((t["AAPL"] - t["MSFT"]).abs() < 1e-9);
        for symbol in ["JPM", "JNJ", "XOM", "NEE"] {
            assert!((t[symbol] - 18.75).abs() < 1e-9);
        }
        assert!((targets_sum(&plan) - 100.0).abs() < 0.01);
        assert_signs_match(&plan);
    }

    #[test]
    fn test_sector_cap_repeats_until_no_breach() {
        // Technology 60%, Financials 20%, Healthcare 10%, Energy 10%
        let holdings = vec![
            holding("AAPL", "Technology", 30, 100),
            holding("MSFT", "Technology", 30, 100),
            holding("JPM", "Financials", 20, 100),
            holding("JNJ", "Healthcare", 10, 100),
            holding("XOM", "Energy", 10, 100),
        ];
        let strategy = RebalanceStrategy::SectorBalanced {
            max_sector_percent: 25.0,
        };
        let plan = RebalanceCalculator::plan(&holdings, &strategy).unwrap();
        let t = &plan.target_allocations;

        assert!((t["AAPL"] + t["MSFT"] - 25.0).abs() < 1e-9);
        for symbol in ["JPM", "JNJ", "XOM"] {
            assert!((t[symbol] - 25.0).abs() < 1e-9);
        }
        // Other sectors rise
        for a in plan.actions.iter().filter(|a| a.symbol != "AAPL" && a.symbol != "MSFT") {
            assert!(a.target_allocation > a.current_allocation);
        }
        assert!((plan.summary.risk_reduction - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_sector_cap_distributes_evenly() {
        let holdings = vec![
            holding("AAPL", "Technology", 70, 100),
            holding("JPM", "Financials", 10, 100),
            holding("JNJ", "Healthcare", 10, 100),
            holding("XOM", "Energy", 10, 100),
        ];
        let strategy = RebalanceStrategy::SectorBalanced {
            max_sector_percent: 20.0,
        };
        let targets = RebalanceCalculator::target_allocations(&holdings, &strategy).unwrap();
        for value in targets.values() {
            assert!((value - 25.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_missing_sector_grouped_as_unknown() {
        let mut holdings = vec![
            holding("AAPL", "Technology", 10, 100),
            holding("ABC", "Technology", 10, 100),
            holding("XYZ", "Technology", 10, 100),
        ];
        holdings[1].sector = None;
        holdings[2].sector = None;
        let strategy = RebalanceStrategy::from_name("sector-balanced").unwrap();
        let targets = RebalanceCalculator::target_allocations(&holdings, &strategy).unwrap();
        assert!((targets["AAPL"] - 50.0).abs() < 1e-9);
        assert!((targets["ABC"] - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_invalid_sector_ceiling() {
        let holdings = vec![holding("AAPL", "Technology", 10, 100)];
        let strategy = RebalanceStrategy::SectorBalanced {
            max_sector_percent: 0.0,
        };
        assert!(matches!(
            RebalanceCalculator::plan(&holdings, &strategy),
            Err(PortfolioError::Validation(_))
        ));
    }

    #[test]
    fn test_risk_parity_sector_defaults() {
        let holdings = vec![
            holding("AAPL", "Technology", 10, 100),
            holding("NEE", "Utilities", 10, 100),
        ];
        let strategy = RebalanceStrategy::from_name("risk_parity").unwrap();
        let targets = RebalanceCalculator::target_allocations(&holdings, &strategy).unwrap();
        // 1/0.30 : 1/0.15 = 1 : 2
        assert!((targets["AAPL"] - 100.0 / 3.0).abs() < 1e-9);
        assert!((targets["NEE"] - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_risk_parity_caller_volatilities() {
        let holdings = vec![
            holding("AAPL", "Technology", 10, 100),
            holding("ZZZ", "Widgets", 10, 100),
        ];
        let mut volatilities = HashMap::new();
        volatilities.insert("AAPL".to_string(), 0.75);
        let strategy = RebalanceStrategy::RiskParity { volatilities };
        let targets = RebalanceCalculator::target_allocations(&holdings, &strategy).unwrap();
        // 1/0.75 : 1/0.25 = 1 : 3
        assert!((targets["AAPL"] - 25.0).abs() < 1e-9);
        assert!((targets["ZZZ"] - 75.0).abs() < 1e-9);

        let mut bad = HashMap::new();
        bad.insert("AAPL".to_string(), 0.0);
        let err = RebalanceCalculator::plan(&holdings, &RebalanceStrategy::RiskParity { volatilities: bad });
        assert!(matches!(err, Err(PortfolioError::Validation(_))));
    }

    #[test]
    fn test_custom_targets() {
        let holdings = vec![
            holding("AAPL", "Technology", 10, 100),
            holding("MSFT", "Technology", 10, 100),
            holding("XOM", "Energy", 10, 100),
        ];
        let targets: HashMap<String, f64> =
            vec![("AAPL".to_string(), 60.0), ("MSFT".to_string(), 39.8)]
                .into_iter()
                .collect();
        let plan = RebalanceCalculator::plan(&holdings, &RebalanceStrategy::Custom { targets }).unwrap();

        assert!((targets_sum(&plan) - 100.0).abs() < 0.01);
        let xom = plan.actions.iter().find(|a| a.symbol == "XOM").unwrap();
        assert_eq!(xom.target_allocation, 0.0);
        assert_eq!(xom.action, TradeAction::Sell);
        assert!((xom.shares_to_trade - -10.0).abs() < 1e-9);
        assert_signs_match(&plan);
    }

    #[test]
    fn test_custom_targets_validation() {
        let holdings = vec![holding("AAPL", "Technology", 10, 100)];
        let custom = |pairs: &[(&str, f64)]| RebalanceStrategy::Custom {
            targets: pairs.iter().map(|(s, v)| (s.to_string(), *v)).collect(),
        };

        for strategy in [
            custom(&[("AAPL", 90.0)]),
            custom(&[("AAPL", 110.0), ("MSFT", -10.0)]),
            custom(&[("MSFT", 100.0)]),
        ] {
            assert!(matches!(
                RebalanceCalculator::plan(&holdings, &strategy),
                Err(PortfolioError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(
            RebalanceStrategy::from_name("Equal-Weight").unwrap(),
            RebalanceStrategy::EqualWeight
        );
        assert!(RebalanceStrategy::from_name("momentum").is_err());
        assert!(RebalanceStrategy::from_name("custom").is_err());

        let parsed: RebalanceStrategy = serde_json::from_str(r#"{"strategy":"sector_balanced"}"#).unwrap();
        assert_eq!(
            parsed,
            RebalanceStrategy::SectorBalanced {
                max_sector_percent: 25.0
            }
        );
    }

    #[test]
    fn test_rejects_empty_and_worthless_portfolios() {
        assert!(matches!(
            RebalanceCalculator::plan(&[], &RebalanceStrategy::EqualWeight),
            Err(PortfolioError::Validation(_))
        ));

        let worthless = vec![holding("AAPL", "Technology", 0, 100)];
        assert!(matches!(
            RebalanceCalculator::plan(&worthless, &RebalanceStrategy::EqualWeight),
            Err(PortfolioError::Validation(_))
        ));

        let duplicated = vec![
            holding("AAPL", "Technology", 1, 100),
            holding("AAPL", "Technology", 1, 100),
        ];
        assert!(RebalanceCalculator::plan(&duplicated, &RebalanceStrategy::EqualWeight).is_err());
    }

    #[test]
    fn test_zero_deadband_balanced_positions_hold() {
        let zero = Deadband {
            min_trade_value: 0.0,
            min_trade_percent: 0.0,
        };
        let prices = ["0.1", "1.7", "33.3", "47.9", "101.7"];
        for n in 3..12 {
            for price in prices {
                let price = Decimal::from_str(price).unwrap();
                let holdings: Vec<PortfolioHolding> = (0..n)
                    .map(|i| PortfolioHolding {
                        symbol: format!("S{}", i),
                        shares: Decimal::from(10),
                        average_cost: price,
                        current_price: price,
                        sector: None,
                    })
                    .collect();
                let plan =
                    RebalanceCalculator::plan_with_deadband(&holdings, &RebalanceStrategy::EqualWeight, &zero)
                        .unwrap();
                assert_eq!(plan.summary.hold_count, n, "n={} price={}", n, price);
                assert_signs_match(&plan);
            }
        }
    }

    #[test]
    fn test_zero_deadband_trades_any_real_gap() {
        let zero = Deadband {
            min_trade_value: 0.0,
            min_trade_percent: 0.0,
        };
        let holdings = vec![
            holding("AAPL", "Technology", 101, 100),
            holding("MSFT", "Technology", 99, 100),
        ];
        let plan =
            RebalanceCalculator::plan_with_deadband(&holdings, &RebalanceStrategy::EqualWeight, &zero).unwrap();
        assert_eq!(plan.summary.total_trades, 2);
        assert_signs_match(&plan);
    }

    #[test]
    fn test_rejects_invalid_deadband() {
        let holdings = vec![holding("AAPL", "Technology", 10, 100)];
        for deadband in [
            Deadband {
                min_trade_value: -1.0,
                min_trade_percent: 1.0,
            },
            Deadband {
                min_trade_value: 100.0,
                min_trade_percent: f64::NAN,
            },
            Deadband {
                min_trade_value: f64::INFINITY,
                min_trade_percent: 1.0,
            },
        ] {
            assert!(matches!(
                RebalanceCalculator::plan_with_deadband(&holdings, &RebalanceStrategy::EqualWeight, &deadband),
                Err(PortfolioError::Validation(_))
            ));
        }
        assert!(Deadband::default().validate().is_ok());
    }
}
