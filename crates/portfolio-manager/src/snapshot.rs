use crate::models::*;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use std::collections::BTreeMap;

/// Entries reported in each of the top performer / loser lists.
pub const TOP_MOVERS: usize = 3;

/// Value the holdings at `at`. Day change is measured against `previous`
/// when given, otherwise it is zero.
pub fn capture(
    holdings: &[PortfolioHolding],
    at: DateTime<Utc>,
    previous: Option<&PortfolioSnapshot>,
) -> PortfolioSnapshot {
    let total_value: Decimal = holdings.iter().map(|h| h.current_value()).sum();
    let total_cost: Decimal = holdings.iter().map(|h| h.cost_basis()).sum();
    let total_gain_loss = total_value - total_cost;
    let total_gain_loss_percent = percent_of(total_gain_loss, total_cost);

    let (day_change, day_change_percent) = match previous {
        Some(prev) => {
            let change = total_value - prev.total_value;
            (change, percent_of(change, prev.total_value))
        }
        None => (Decimal::ZERO, 0.0),
    };

    let contributions: Vec<HoldingContribution> = holdings
        .iter()
        .map(|h| HoldingContribution {
            symbol: h.symbol.clone(),
            value: h.current_value(),
            gain_loss: h.gain_loss(),
            gain_loss_percent: h.gain_loss_percent(),
            allocation_percent: h.allocation_percent(total_value),
        })
        .collect();

    let mut sector_allocation: BTreeMap<String, f64> = BTreeMap::new();
    for h in holdings {
        *sector_allocation
            .entry(h.sector_or_unknown().to_string())
            .or_insert(0.0) += h.allocation_percent(total_value);
    }

    let mut ranked: Vec<PerformerEntry> = contributions
        .iter()
        .map(|c| PerformerEntry {
            symbol: c.symbol.clone(),
            gain_loss_percent: c.gain_loss_percent,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.gain_loss_percent
            .partial_cmp(&a.gain_loss_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let top_performers: Vec<PerformerEntry> = ranked
        .iter()
        .filter(|p| p.gain_loss_percent > 0.0)
        .take(TOP_MOVERS)
        .cloned()
        .collect();
    let top_losers: Vec<PerformerEntry> = ranked
        .iter()
        .rev()
        .filter(|p| p.gain_loss_percent < 0.0)
        .take(TOP_MOVERS)
        .cloned()
        .collect();

    PortfolioSnapshot {
        snapshot_date: at,
        total_value,
        total_cost,
        total_gain_loss,
        total_gain_loss_percent,
        day_change,
        day_change_percent,
        holdings: contributions,
        sector_allocation,
        top_performers,
        top_losers,
    }
}

fn percent_of(part: Decimal, whole: Decimal) -> f64 {
    let whole = whole.to_f64().unwrap_or(0.0);
    if whole > 0.0 {
        part.to_f64().unwrap_or(0.0) / whole * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn holding(symbol: &str, sector: Option<&str>, shares: Decimal, cost: Decimal, price: Decimal) -> PortfolioHolding {
        PortfolioHolding {
            symbol: symbol.to_string(),
            shares,
            average_cost: cost,
            current_price: price,
            sector: sector.map(str::to_string),
        }
    }

    fn sample() -> Vec<PortfolioHolding> {
        vec![
            holding("AAPL", Some("Technology"), dec!(10), dec!(100), dec!(150)),
            holding("MSFT", Some("Technology"), dec!(5), dec!(200), dec!(220)),
            holding("XOM", Some("Energy"), dec!(20), dec!(60), dec!(45)),
            holding("PFE", None, dec!(40), dec!(30), dec!(27.5)),
            holding("JPM", Some("Financials"), dec!(4), dec!(150), dec!(150)),
        ]
    }

    #[test]
    fn test_capture_totals() {
        let at = Utc.with_ymd_and_hms(2025, 3, 3, 21, 0, 0).unwrap();
        let snap = capture(&sample(), at, None);

        // 1500 + 1100 + 900 + 1100 + 600
        assert_eq!(snap.total_value, dec!(5200));
        // 1000 + 1000 + 1200 + 1200 + 600
        assert_eq!(snap.total_cost, dec!(5000));
        assert_eq!(snap.total_gain_loss, dec!(200));
        assert!((snap.total_gain_loss_percent - 4.0).abs() < 1e-9);
        assert_eq!(snap.day_change, Decimal::ZERO);
        assert_eq!(snap.snapshot_date, at);
        assert_eq!(snap.holdings.len(), 5);

        let allocation: f64 = snap.sector_allocation.values().sum();
        assert!((allocation - 100.0).abs() < 1e-9);
        assert!((snap.sector_allocation["Technology"] - 50.0).abs() < 1e-9);
        assert!(snap.sector_allocation.contains_key(UNKNOWN_SECTOR));
    }

    #[test]
    fn test_top_movers() {
        let snap = capture(&sample(), Utc::now(), None);

        let performers: Vec<&str> = snap.top_performers.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(performers, vec!["AAPL", "MSFT"]);
        let losers: Vec<&str> = snap.top_losers.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(losers, vec!["XOM", "PFE"]);
    }

    #[test]
    fn test_day_change_against_previous() {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 21, 0, 0).unwrap();
        let first = capture(&sample(), start, None);

        let mut moved = sample();
        moved[0].current_price = dec!(202);
        let second = capture(&moved, start + Duration::days(1), Some(&first));

        assert_eq!(second.day_change, dec!(520));
        assert!((second.day_change_percent - 10.0).abs() < 1e-9);
    }
}
