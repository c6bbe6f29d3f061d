//! Timestamp-aligned views over the raw indicator vectors.
//!
//! Every raw indicator output covers a suffix of the input bars; these helpers
//! pair each value with the timestamp of the bar it was computed at.

use analysis_core::{Bar, IndicatorPoint};
use serde::Serialize;

use crate::indicators;

/// Pair `values` with the timestamps of the last `values.len()` bars.
pub fn align(bars: &[Bar], values: &[f64]) -> Vec<IndicatorPoint> {
    let offset = bars.len().saturating_sub(values.len());
    bars[offset..]
        .iter()
        .zip(values)
        .map(|(bar, &value)| IndicatorPoint::new(bar.timestamp, value))
        .collect()
}

/// Like [`align`], tagging each point with its histogram color.
pub fn align_histogram(bars: &[Bar], values: &[f64]) -> Vec<IndicatorPoint> {
    let offset = bars.len().saturating_sub(values.len());
    bars[offset..]
        .iter()
        .zip(values)
        .map(|(bar, &value)| IndicatorPoint::histogram(bar.timestamp, value))
        .collect()
}

/// Output of one indicator computation, shaped by indicator family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorSeries {
    Single {
        values: Vec<IndicatorPoint>,
    },
    Bands {
        upper: Vec<IndicatorPoint>,
        middle: Vec<IndicatorPoint>,
        lower: Vec<IndicatorPoint>,
    },
    Macd {
        macd: Vec<IndicatorPoint>,
        signal: Vec<IndicatorPoint>,
        histogram: Vec<IndicatorPoint>,
    },
    Stochastic {
        k: Vec<IndicatorPoint>,
        d: Vec<IndicatorPoint>,
    },
    Adx {
        adx: Vec<IndicatorPoint>,
        plus_di: Vec<IndicatorPoint>,
        minus_di: Vec<IndicatorPoint>,
    },
}

impl IndicatorSeries {
    /// True when the input was too short to produce any value.
    pub fn is_empty(&self) -> bool {
        match self {
            IndicatorSeries::Single { values } => values.is_empty(),
            IndicatorSeries::Bands { middle, .. } => middle.is_empty(),
            IndicatorSeries::Macd { macd, .. } => macd.is_empty(),
            IndicatorSeries::Stochastic { k, .. } => k.is_empty(),
            IndicatorSeries::Adx { plus_di, .. } => plus_di.is_empty(),
        }
    }

    /// The main line's most recent value.
    pub fn latest(&self) -> Option<f64> {
        let primary = match self {
            IndicatorSeries::Single { values } => values,
            IndicatorSeries::Bands { middle, .. } => middle,
            IndicatorSeries::Macd { macd, .. } => macd,
            IndicatorSeries::Stochastic { k, .. } => k,
            IndicatorSeries::Adx { adx, .. } => adx,
        };
        primary.last().map(|p| p.value)
    }
}

pub fn sma_series(bars: &[Bar], period: usize) -> Vec<IndicatorPoint> {
    align(bars, &indicators::sma(&closes(bars), period))
}

pub fn ema_series(bars: &[Bar], period: usize) -> Vec<IndicatorPoint> {
    align(bars, &indicators::ema(&closes(bars), period))
}

pub fn rsi_series(bars: &[Bar], period: usize) -> Vec<IndicatorPoint> {
    align(bars, &indicators::rsi(&closes(bars), period))
}

pub fn bollinger_series(bars: &[Bar], period: usize, k: f64) -> IndicatorSeries {
    let bb = indicators::bollinger_bands(&closes(bars), period, k);
    IndicatorSeries::Bands {
        upper: align(bars, &bb.upper),
        middle: align(bars, &bb.middle),
        lower: align(bars, &bb.lower),
    }
}

pub fn macd_series(bars: &[Bar], fast: usize, slow: usize, signal: usize) -> IndicatorSeries {
    let result = indicators::macd(&closes(bars), fast, slow, signal);
    IndicatorSeries::Macd {
        macd: align(bars, &result.macd_line),
        signal: align(bars, &result.signal_line),
        histogram: align_histogram(bars, &result.histogram),
    }
}

pub fn stochastic_series(bars: &[Bar], k_period: usize, d_period: usize) -> IndicatorSeries {
    let result = indicators::stochastic(bars, k_period, d_period);
    IndicatorSeries::Stochastic {
        k: align(bars, &result.k),
        d: align(bars, &result.d),
    }
}

pub fn adx_series(bars: &[Bar], period: usize) -> IndicatorSeries {
    let result = indicators::adx(bars, period);
    IndicatorSeries::Adx {
        adx: align(bars, &result.adx),
        plus_di: align(bars, &result.plus_di),
        minus_di: align(bars, &result.minus_di),
    }
}

pub(crate) fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
