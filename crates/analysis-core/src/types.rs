use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Largest of high-low, |high-prev_close| and |low-prev_close|.
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let high_low = self.high - self.low;
        let high_close = (self.high - prev_close).abs();
        let low_close = (self.low - prev_close).abs();
        high_low.max(high_close).max(low_close)
    }
}

/// Sign-based classification of a MACD histogram bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistogramColor {
    Green,
    Red,
    Gray,
}

impl HistogramColor {
    pub fn from_value(value: f64) -> Self {
        if value > 0.0 {
            HistogramColor::Green
        } else if value < 0.0 {
            HistogramColor::Red
        } else {
            HistogramColor::Gray
        }
    }
}

/// One value of an indicator series, aligned to the bar it was computed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HistogramColor>,
}

impl IndicatorPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value, color: None }
    }

    pub fn histogram(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            color: Some(HistogramColor::from_value(value)),
        }
    }
}

/// Direction derived from the trend vote of the composite evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSignal {
    Bullish,
    Bearish,
    Neutral,
}

/// Overall five-level signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStrength {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl SignalStrength {
    /// Map an accumulated composite score onto the five levels.
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 3 => SignalStrength::StrongBuy,
            s if s >= 1 => SignalStrength::Buy,
            s if s <= -3 => SignalStrength::StrongSell,
            s if s <= -1 => SignalStrength::Sell,
            _ => SignalStrength::Hold,
        }
    }

    /// Human-readable label for the signal
    pub fn to_label(&self) -> &'static str {
        match self {
            SignalStrength::StrongBuy => "Strong Buy",
            SignalStrength::Buy => "Buy",
            SignalStrength::Hold => "Hold",
            SignalStrength::Sell => "Sell",
            SignalStrength::StrongSell => "Strong Sell",
        }
    }
}
