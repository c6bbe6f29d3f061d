use analysis_core::{AnalysisError, Bar};
use serde::{Deserialize, Serialize};

use crate::indicators;
use crate::series::{self, align, IndicatorSeries};

/// Per-indicator configuration. Each variant carries only the fields its
/// indicator uses; constructors reject invalid values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "indicator", rename_all = "snake_case")]
pub enum IndicatorParams {
    Sma { period: usize },
    Ema { period: usize },
    Bollinger { period: usize, k: f64 },
    Rsi { period: usize },
    Macd { fast: usize, slow: usize, signal: usize },
    Stochastic { k_period: usize, d_period: usize },
    Atr { period: usize },
    Adx { period: usize },
    Cci { period: usize },
    WilliamsR { period: usize },
    ParabolicSar { accel_step: f64, accel_max: f64 },
    Obv,
    Vwap,
    VolumeSma { period: usize },
}

fn check_period(name: &str, period: usize) -> Result<(), AnalysisError> {
    if period == 0 {
        return Err(AnalysisError::validation(format!(
            "{} period must be positive",
            name
        )));
    }
    Ok(())
}

impl IndicatorParams {
    pub fn sma(period: usize) -> Result<Self, AnalysisError> {
        Self::Sma { period }.validated()
    }

    pub fn ema(period: usize) -> Result<Self, AnalysisError> {
        Self::Ema { period }.validated()
    }

    pub fn bollinger(period: usize, k: f64) -> Result<Self, AnalysisError> {
        Self::Bollinger { period, k }.validated()
    }

    pub fn rsi(period: usize) -> Result<Self, AnalysisError> {
        Self::Rsi { period }.validated()
    }

    pub fn macd(fast: usize, slow: usize, signal: usize) -> Result<Self, AnalysisError> {
        Self::Macd { fast, slow, signal }.validated()
    }

    pub fn stochastic(k_period: usize, d_period: usize) -> Result<Self, AnalysisError> {
        Self::Stochastic { k_period, d_period }.validated()
    }

    pub fn atr(period: usize) -> Result<Self, AnalysisError> {
        Self::Atr { period }.validated()
    }

    pub fn adx(period: usize) -> Result<Self, AnalysisError> {
        Self::Adx { period }.validated()
    }

    pub fn cci(period: usize) -> Result<Self, AnalysisError> {
        Self::Cci { period }.validated()
    }

    pub fn williams_r(period: usize) -> Result<Self, AnalysisError> {
        Self::WilliamsR { period }.validated()
    }

    pub fn parabolic_sar(accel_step: f64, accel_max: f64) -> Result<Self, AnalysisError> {
        Self::ParabolicSar { accel_step, accel_max }.validated()
    }

    pub fn volume_sma(period: usize) -> Result<Self, AnalysisError> {
        Self::VolumeSma { period }.validated()
    }

    fn validated(self) -> Result<Self, AnalysisError> {
        self.validate()?;
        Ok(self)
    }

    /// Re-check invariants, e.g. after deserializing.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        match *self {
            IndicatorParams::Sma { period }
            | IndicatorParams::Ema { period }
            | IndicatorParams::Rsi { period }
            | IndicatorParams::Atr { period }
            | IndicatorParams::Adx { period }
            | IndicatorParams::Cci { period }
            | IndicatorParams::WilliamsR { period }
            | IndicatorParams::VolumeSma { period } => check_period(self.name(), period),
            IndicatorParams::Bollinger { period, k } => {
                check_period(self.name(), period)?;
                if !k.is_finite() || k <= 0.0 {
                    return Err(AnalysisError::validation(format!(
                        "bollinger band width must be a positive number, got {}",
                        k
                    )));
                }
                Ok(())
            }
            IndicatorParams::Macd { fast, slow, signal } => {
                check_period("macd fast", fast)?;
                check_period("macd slow", slow)?;
                check_period("macd signal", signal)?;
                if fast >= slow {
                    return Err(AnalysisError::validation(format!(
                        "macd fast period ({}) must be shorter than slow period ({})",
                        fast, slow
                    )));
                }
                Ok(())
            }
            IndicatorParams::Stochastic { k_period, d_period } => {
                check_period("stochastic %K", k_period)?;
                check_period("stochastic %D", d_period)
            }
            IndicatorParams::ParabolicSar { accel_step, accel_max } => {
                if !accel_step.is_finite() || accel_step <= 0.0 {
                    return Err(AnalysisError::validation(
                        "parabolic sar acceleration step must be positive",
                    ));
                }
                if !accel_max.is_finite() || accel_max < accel_step {
                    return Err(AnalysisError::validation(format!(
                        "parabolic sar max acceleration ({}) must be >= step ({})",
                        accel_max, accel_step
                    )));
                }
                Ok(())
            }
            IndicatorParams::Obv | IndicatorParams::Vwap => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IndicatorParams::Sma { .. } => "sma",
            IndicatorParams::Ema { .. } => "ema",
            IndicatorParams::Bollinger { .. } => "bollinger",
            IndicatorParams::Rsi { .. } => "rsi",
            IndicatorParams::Macd { .. } => "macd",
            IndicatorParams::Stochastic { .. } => "stochastic",
            IndicatorParams::Atr { .. } => "atr",
            IndicatorParams::Adx { .. } => "adx",
            IndicatorParams::Cci { .. } => "cci",
            IndicatorParams::WilliamsR { .. } => "williams_r",
            IndicatorParams::ParabolicSar { .. } => "parabolic_sar",
            IndicatorParams::Obv => "obv",
            IndicatorParams::Vwap => "vwap",
            IndicatorParams::VolumeSma { .. } => "volume_sma",
        }
    }

    /// Fewest bars that yield at least one value of the main line.
    pub fn min_bars(&self) -> usize {
        match *self {
            IndicatorParams::Sma { period }
            | IndicatorParams::Ema { period }
            | IndicatorParams::Bollinger { period, .. }
            | IndicatorParams::Cci { period }
            | IndicatorParams::WilliamsR { period }
            | IndicatorParams::VolumeSma { period } => period,
            IndicatorParams::Rsi { period } | IndicatorParams::Atr { period } => period + 1,
            IndicatorParams::Adx { period } => 2 * period + 1,
            IndicatorParams::Macd { slow, .. } => slow,
            IndicatorParams::Stochastic { k_period, .. } => k_period,
            IndicatorParams::ParabolicSar { .. } => 2,
            IndicatorParams::Obv | IndicatorParams::Vwap => 1,
        }
    }

    /// Validate, then compute the aligned series. Short input yields an empty
    /// series, not an error.
    pub fn compute(&self, bars: &[Bar]) -> Result<IndicatorSeries, AnalysisError> {
        self.validate()?;
        let closes = series::closes(bars);

        let output = match *self {
            IndicatorParams::Sma { period } => single(bars, &indicators::sma(&closes, period)),
            IndicatorParams::Ema { period } => single(bars, &indicators::ema(&closes, period)),
            IndicatorParams::Bollinger { period, k } => series::bollinger_series(bars, period, k),
            IndicatorParams::Rsi { period } => single(bars, &indicators::rsi(&closes, period)),
            IndicatorParams::Macd { fast, slow, signal } => {
                series::macd_series(bars, fast, slow, signal)
            }
            IndicatorParams::Stochastic { k_period, d_period } => {
                series::stochastic_series(bars, k_period, d_period)
            }
            IndicatorParams::Atr { period } => single(bars, &indicators::atr(bars, period)),
            IndicatorParams::Adx { period } => series::adx_series(bars, period),
            IndicatorParams::Cci { period } => single(bars, &indicators::cci(bars, period)),
            IndicatorParams::WilliamsR { period } => {
                single(bars, &indicators::williams_r(bars, period))
            }
            IndicatorParams::ParabolicSar { accel_step, accel_max } => {
                single(bars, &indicators::parabolic_sar(bars, accel_step, accel_max))
            }
            IndicatorParams::Obv => single(bars, &indicators::obv(bars)),
            IndicatorParams::Vwap => single(bars, &indicators::vwap(bars)),
            IndicatorParams::VolumeSma { period } => {
                single(bars, &indicators::volume_sma(bars, period))
            }
        };

        Ok(output)
    }
}

fn single(bars: &[Bar], values: &[f64]) -> IndicatorSeries {
    IndicatorSeries::Single {
        values: align(bars, values),
    }
}
