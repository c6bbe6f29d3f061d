//! Stateless classifiers turning adjacent indicator values into discrete
//! signals.

use serde::{Deserialize, Serialize};

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const STOCHASTIC_OVERBOUGHT: f64 = 80.0;
pub const STOCHASTIC_OVERSOLD: f64 = 20.0;
pub const CCI_OVERBOUGHT: f64 = 100.0;
pub const CCI_OVERSOLD: f64 = -100.0;
pub const WILLIAMS_OVERBOUGHT: f64 = -20.0;
pub const WILLIAMS_OVERSOLD: f64 = -80.0;
pub const ADX_STRONG_TREND: f64 = 40.0;
pub const ADX_WEAK_TREND: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Overbought,
    Oversold,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossover {
    BullishCrossover,
    BearishCrossover,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaCross {
    GoldenCross,
    DeathCross,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStrength {
    StrongBullish,
    StrongBearish,
    WeakTrend,
    NoTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StochasticReading {
    pub zone: Zone,
    pub crossover: Crossover,
}

/// RSI >= 70 overbought, <= 30 oversold.
pub fn rsi_zone(rsi: f64) -> Zone {
    if rsi >= RSI_OVERBOUGHT {
        Zone::Overbought
    } else if rsi <= RSI_OVERSOLD {
        Zone::Oversold
    } else {
        Zone::Neutral
    }
}

/// Fast series crossing the slow one between the previous and current pair.
pub fn crossover(prev_fast: f64, prev_slow: f64, fast: f64, slow: f64) -> Crossover {
    if prev_fast <= prev_slow && fast > slow {
        Crossover::BullishCrossover
    } else if prev_fast >= prev_slow && fast < slow {
        Crossover::BearishCrossover
    } else {
        Crossover::None
    }
}

/// MACD line crossing its signal line.
pub fn macd_crossover(prev_macd: f64, prev_signal: f64, macd: f64, signal: f64) -> Crossover {
    crossover(prev_macd, prev_signal, macd, signal)
}

/// Short moving average crossing the long one.
pub fn ma_cross(prev_short: f64, prev_long: f64, short: f64, long: f64) -> MaCross {
    match crossover(prev_short, prev_long, short, long) {
        Crossover::BullishCrossover => MaCross::GoldenCross,
        Crossover::BearishCrossover => MaCross::DeathCross,
        Crossover::None => MaCross::None,
    }
}

pub fn stochastic_zone(k: f64) -> Zone {
    if k >= STOCHASTIC_OVERBOUGHT {
        Zone::Overbought
    } else if k <= STOCHASTIC_OVERSOLD {
        Zone::Oversold
    } else {
        Zone::Neutral
    }
}

/// Zone of %K plus any %K/%D crossover.
pub fn stochastic_reading(prev_k: f64, prev_d: f64, k: f64, d: f64) -> StochasticReading {
    StochasticReading {
        zone: stochastic_zone(k),
        crossover: crossover(prev_k, prev_d, k, d),
    }
}

/// ADX > 40 strong (direction from the leading DI), 20..=40 weak, < 20 none.
pub fn trend_strength(adx: f64, plus_di: f64, minus_di: f64) -> TrendStrength {
    if adx > ADX_STRONG_TREND {
        if plus_di > minus_di {
            TrendStrength::StrongBullish
        } else {
            TrendStrength::StrongBearish
        }
    } else if adx >= ADX_WEAK_TREND {
        TrendStrength::WeakTrend
    } else {
        TrendStrength::NoTrend
    }
}

pub fn cci_zone(cci: f64) -> Zone {
    if cci > CCI_OVERBOUGHT {
        Zone::Overbought
    } else if cci < CCI_OVERSOLD {
        Zone::Oversold
    } else {
        Zone::Neutral
    }
}

pub fn williams_zone(williams_r: f64) -> Zone {
    if williams_r >= WILLIAMS_OVERBOUGHT {
        Zone::Overbought
    } else if williams_r <= WILLIAMS_OVERSOLD {
        Zone::Oversold
    } else {
        Zone::Neutral
    }
}

/// Last two values of a series, oldest first.
pub(crate) fn last_pair(values: &[f64]) -> Option<(f64, f64)> {
    match values {
        [.., prev, last] => Some((*prev, *last)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_zone_boundaries() {
        assert_eq!(rsi_zone(70.0), Zone::Overbought);
        assert_eq!(rsi_zone(69.99), Zone::Neutral);
        assert_eq!(rsi_zone(30.0), Zone::Oversold);
        assert_eq!(rsi_zone(30.01), Zone::Neutral);
    }

    #[test]
    fn test_macd_bullish_crossover() {
        assert_eq!(macd_crossover(-1.0, -0.5, 0.2, 0.1), Crossover::BullishCrossover);
    }

    #[test]
    fn test_macd_bearish_crossover() {
        assert_eq!(macd_crossover(0.3, 0.1, -0.1, 0.0), Crossover::BearishCrossover);
    }

    #[test]
    fn test_no_crossover_when_already_above() {
        assert_eq!(macd_crossover(0.5, 0.1, 0.6, 0.2), Crossover::None);
        // Touching without crossing is not a signal
        assert_eq!(macd_crossover(-0.5, 0.0, 0.0, 0.0), Crossover::None);
    }

    #[test]
    fn test_crossover_from_equal() {
        assert_eq!(crossover(1.0, 1.0, 1.1, 1.0), Crossover::BullishCrossover);
        assert_eq!(crossover(1.0, 1.0, 0.9, 1.0), Crossover::BearishCrossover);
    }

    #[test]
    fn test_golden_and_death_cross() {
        assert_eq!(ma_cross(99.0, 100.0, 101.0, 100.5), MaCross::GoldenCross);
        assert_eq!(ma_cross(101.0, 100.0, 99.0, 100.5), MaCross::DeathCross);
        assert_eq!(ma_cross(101.0, 100.0, 102.0, 100.5), MaCross::None);
    }

    #[test]
    fn test_stochastic_reading() {
        let reading = stochastic_reading(15.0, 18.0, 19.0, 17.0);
        assert_eq!(reading.zone, Zone::Oversold);
        assert_eq!(reading.crossover, Crossover::BullishCrossover);

        let reading = stochastic_reading(85.0, 84.0, 82.0, 83.0);
        assert_eq!(reading.zone, Zone::Overbought);
        assert_eq!(reading.crossover, Crossover::BearishCrossover);
    }

    #[test]
    fn test_trend_strength() {
        assert_eq!(trend_strength(45.0, 30.0, 10.0), TrendStrength::StrongBullish);
        assert_eq!(trend_strength(45.0, 10.0, 30.0), TrendStrength::StrongBearish);
        assert_eq!(trend_strength(40.0, 30.0, 10.0), TrendStrength::WeakTrend);
        assert_eq!(trend_strength(20.0, 30.0, 10.0), TrendStrength::WeakTrend);
        assert_eq!(trend_strength(19.9, 30.0, 10.0), TrendStrength::NoTrend);
    }

    #[test]
    fn test_cci_and_williams_extremes() {
        assert_eq!(cci_zone(150.0), Zone::Overbought);
        assert_eq!(cci_zone(-150.0), Zone::Oversold);
        assert_eq!(cci_zone(100.0), Zone::Neutral);
        assert_eq!(williams_zone(-10.0), Zone::Overbought);
        assert_eq!(williams_zone(-90.0), Zone::Oversold);
        assert_eq!(williams_zone(-50.0), Zone::Neutral);
    }

    #[test]
    fn test_serializes_as_snake_case() {
        let json = serde_json::to_string(&Crossover::BullishCrossover).unwrap();
        assert_eq!(json, "\"bullish_crossover\"");
    }

    #[test]
    fn test_last_pair() {
        assert_eq!(last_pair(&[1.0, 2.0, 3.0]), Some((2.0, 3.0)));
        assert_eq!(last_pair(&[1.0]), None);
    }
}
