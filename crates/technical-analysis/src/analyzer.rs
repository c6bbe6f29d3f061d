use analysis_core::{AnalysisError, Bar, HistogramColor, SignalStrength, TrendSignal};
use rayon::prelude::*;

use crate::indicators::*;
use crate::signals::{self, last_pair};
use crate::snapshot::*;

/// Fewest bars the composite evaluator accepts.
pub const MIN_SNAPSHOT_BARS: usize = 50;

/// Periods used when building a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotSettings {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub atr_period: usize,
    pub adx_period: usize,
    pub cci_period: usize,
    pub williams_period: usize,
    pub sar_step: f64,
    pub sar_max: f64,
    pub volume_period: usize,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_k: 2.0,
            stochastic_k: 14,
            stochastic_d: 3,
            atr_period: 14,
            adx_period: 14,
            cci_period: 20,
            williams_period: 14,
            sar_step: 0.02,
            sar_max: 0.2,
            volume_period: 20,
        }
    }
}

pub struct TechnicalAnalysisEngine {
    settings: SnapshotSettings,
}

impl TechnicalAnalysisEngine {
    pub fn new() -> Self {
        Self {
            settings: SnapshotSettings::default(),
        }
    }

    pub fn with_settings(settings: SnapshotSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SnapshotSettings {
        &self.settings
    }

    /// Build a fresh snapshot from the latest indicator values. Fewer than
    /// [`MIN_SNAPSHOT_BARS`] bars reports the indicators as unavailable.
    pub fn evaluate(&self, symbol: &str, bars: &[Bar]) -> Result<TechnicalSnapshot, AnalysisError> {
        if bars.len() < MIN_SNAPSHOT_BARS {
            return Err(AnalysisError::InsufficientData {
                required: MIN_SNAPSHOT_BARS,
                available: bars.len(),
            });
        }
        let last_bar = &bars[bars.len() - 1];
        if !last_bar.close.is_finite() {
            return Err(AnalysisError::InvalidData(format!(
                "{}: last close is not a finite number",
                symbol
            )));
        }

        let s = &self.settings;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let current_price = last_bar.close;

        let sma_20 = sma(&closes, 20);
        let sma_50 = sma(&closes, 50);
        let sma_200 = sma(&closes, 200);
        let ema_12 = ema(&closes, 12);
        let ema_26 = ema(&closes, 26);
        let rsi_values = rsi(&closes, s.rsi_period);
        let macd_result = macd(&closes, s.macd_fast, s.macd_slow, s.macd_signal);
        let bb = bollinger_bands(&closes, s.bollinger_period, s.bollinger_k);
        let stoch = stochastic(bars, s.stochastic_k, s.stochastic_d);
        let atr_values = atr(bars, s.atr_period);
        let adx_result = adx(bars, s.adx_period);
        let cci_values = cci(bars, s.cci_period);
        let williams = williams_r(bars, s.williams_period);
        let sar = parabolic_sar_states(bars, s.sar_step, s.sar_max);
        let obv_values = obv(bars);
        let vwap_values = vwap(bars);
        let volume_avg = volume_sma(bars, s.volume_period);

        let macd_snapshot = match (
            macd_result.macd_line.last(),
            macd_result.signal_line.last(),
            macd_result.histogram.last(),
        ) {
            (Some(&m), Some(&sig), Some(&hist)) => Some(MacdSnapshot {
                macd: m,
                signal: sig,
                histogram: hist,
                color: HistogramColor::from_value(hist),
            }),
            _ => None,
        };

        let bollinger = match (bb.upper.last(), bb.middle.last(), bb.lower.last()) {
            (Some(&upper), Some(&middle), Some(&lower)) => Some(BollingerSnapshot {
                upper,
                middle,
                lower,
                width: if middle != 0.0 { (upper - lower) / middle } else { 0.0 },
                percent_b: if upper != lower {
                    (current_price - lower) / (upper - lower)
                } else {
                    0.5
                },
            }),
            _ => None,
        };

        let adx_snapshot = match (
            adx_result.adx.last(),
            adx_result.plus_di.last(),
            adx_result.minus_di.last(),
        ) {
            (Some(&a), Some(&p), Some(&m)) => Some(AdxSnapshot {
                adx: a,
                plus_di: p,
                minus_di: m,
            }),
            _ => None,
        };

        let signal_summary = SignalSummary {
            rsi: rsi_values.last().map(|&r| signals::rsi_zone(r)),
            macd_crossover: match (
                last_pair(&macd_result.macd_line[macd_result.macd_line.len() - macd_result.signal_line.len()..]),
                last_pair(&macd_result.signal_line),
            ) {
                (Some((pm, m)), Some((ps, sig))) => Some(signals::macd_crossover(pm, ps, m, sig)),
                _ => None,
            },
            ma_cross: match (
                last_pair(&sma_50[sma_50.len() - sma_200.len()..]),
                last_pair(&sma_200),
            ) {
                (Some((p50, c50)), Some((p200, c200))) => {
                    Some(signals::ma_cross(p50, p200, c50, c200))
                }
                _ => None,
            },
            stochastic: match (
                last_pair(&stoch.k[stoch.k.len() - stoch.d.len()..]),
                last_pair(&stoch.d),
            ) {
                (Some((pk, k)), Some((pd, d))) => Some(signals::stochastic_reading(pk, pd, k, d)),
                _ => None,
            },
            trend_strength: adx_snapshot
                .map(|a| signals::trend_strength(a.adx, a.plus_di, a.minus_di)),
            cci: cci_values.last().map(|&c| signals::cci_zone(c)),
            williams_r: williams.last().map(|&w| signals::williams_zone(w)),
        };

        let histogram = macd_snapshot.map(|m| m.histogram);
        let trend_signal = trend_vote(
            current_price,
            sma_50.last().copied(),
            sma_200.last().copied(),
            histogram,
        );
        let rsi_last = rsi_values.last().copied();
        let score = composite_score(rsi_last, histogram, trend_signal);
        let overall_signal = SignalStrength::from_score(score);

        tracing::debug!(
            symbol,
            bars = bars.len(),
            rsi = ?rsi_last,
            histogram = ?histogram,
            trend = ?trend_signal,
            score,
            "technical snapshot evaluated"
        );

        Ok(TechnicalSnapshot {
            symbol: symbol.to_string(),
            timestamp: last_bar.timestamp,
            bar_count: bars.len(),
            current_price,
            sma_20: sma_20.last().copied(),
            sma_50: sma_50.last().copied(),
            sma_200: sma_200.last().copied(),
            ema_12: ema_12.last().copied(),
            ema_26: ema_26.last().copied(),
            rsi: rsi_last,
            macd: macd_snapshot,
            bollinger,
            stochastic: stoch.k.last().map(|&k| StochasticSnapshot {
                k,
                d: stoch.d.last().copied(),
            }),
            atr: atr_values.last().copied(),
            adx: adx_snapshot,
            cci: cci_values.last().copied(),
            williams_r: williams.last().copied(),
            parabolic_sar: sar.last().map(|state| ParabolicSarSnapshot {
                sar: state.sar,
                trend: state.trend,
            }),
            obv: obv_values.last().copied(),
            vwap: vwap_values.last().copied(),
            volume_sma_20: volume_avg.last().copied(),
            signals: signal_summary,
            trend_signal,
            overall_signal,
            score,
        })
    }

    /// Evaluate independent instruments in parallel. Results keep input order.
    pub fn evaluate_many(
        &self,
        inputs: &[(String, Vec<Bar>)],
    ) -> Vec<(String, Result<TechnicalSnapshot, AnalysisError>)> {
        inputs
            .par_iter()
            .map(|(symbol, bars)| (symbol.clone(), self.evaluate(symbol, bars)))
            .collect()
    }
}

impl Default for TechnicalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Majority vote of price vs SMA50, price vs SMA200 and the MACD histogram
/// sign. Missing inputs and exact ties abstain.
pub fn trend_vote(
    price: f64,
    sma_50: Option<f64>,
    sma_200: Option<f64>,
    macd_histogram: Option<f64>,
) -> TrendSignal {
    let votes = [
        sma_50.map(|m| price - m),
        sma_200.map(|m| price - m),
        macd_histogram,
    ];
    let bullish = votes.iter().flatten().filter(|&&v| v > 0.0).count();
    let bearish = votes.iter().flatten().filter(|&&v| v < 0.0).count();

    if bullish >= 2 {
        TrendSignal::Bullish
    } else if bearish >= 2 {
        TrendSignal::Bearish
    } else {
        TrendSignal::Neutral
    }
}

/// RSI < 30 +2, < 40 +1, > 70 -2, > 60 -1; MACD histogram > 0 +1 else -1;
/// trend bullish +1, bearish -1.
pub fn composite_score(rsi: Option<f64>, macd_histogram: Option<f64>, trend: TrendSignal) -> i32 {
    let mut score = 0;

    if let Some(rsi) = rsi {
        if rsi < 30.0 {
            score += 2;
        } else if rsi < 40.0 {
            score += 1;
        } else if rsi > 70.0 {
            score -= 2;
        } else if rsi > 60.0 {
            score -= 1;
        }
    }

    if let Some(hist) = macd_histogram {
        score += if hist > 0.0 { 1 } else { -1 };
    }

    score += match trend {
        TrendSignal::Bullish => 1,
        TrendSignal::Bearish => -1,
        TrendSignal::Neutral => 0,
    };

    score
}
