use analysis_core::{HistogramColor, SignalStrength, TrendSignal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::indicators::SarTrend;
use crate::signals::{Crossover, MaCross, StochasticReading, TrendStrength, Zone};

/// Latest value of every indicator for one instrument plus the derived
/// signals. `None` means the history was too short for that indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub symbol: String,
    /// Timestamp of the most recent bar.
    pub timestamp: DateTime<Utc>,
    pub bar_count: usize,
    pub current_price: f64,

    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<MacdSnapshot>,
    pub bollinger: Option<BollingerSnapshot>,
    pub stochastic: Option<StochasticSnapshot>,
    pub atr: Option<f64>,
    pub adx: Option<AdxSnapshot>,
    pub cci: Option<f64>,
    pub williams_r: Option<f64>,
    pub parabolic_sar: Option<ParabolicSarSnapshot>,
    pub obv: Option<f64>,
    pub vwap: Option<f64>,
    pub volume_sma_20: Option<f64>,

    pub signals: SignalSummary,
    pub trend_signal: TrendSignal,
    pub overall_signal: SignalStrength,
    /// Composite score behind `overall_signal`.
    pub score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdSnapshot {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    pub color: HistogramColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerSnapshot {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// (upper - lower) / middle
    pub width: f64,
    /// Position of price inside the bands, 0 at lower and 1 at upper.
    pub percent_b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticSnapshot {
    pub k: f64,
    pub d: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdxSnapshot {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParabolicSarSnapshot {
    pub sar: f64,
    pub trend: SarTrend,
}

/// Discrete readings from the signal detector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalSummary {
    pub rsi: Option<Zone>,
    pub macd_crossover: Option<Crossover>,
    /// SMA 50 against SMA 200.
    pub ma_cross: Option<MaCross>,
    pub stochastic: Option<StochasticReading>,
    pub trend_strength: Option<TrendStrength>,
    pub cci: Option<Zone>,
    pub williams_r: Option<Zone>,
}
