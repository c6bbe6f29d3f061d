use analysis_core::Bar;
use serde::{Deserialize, Serialize};

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Exponential Moving Average, seeded with the SMA of the first `period`
/// values. The first output lines up with `data[period - 1]`.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len() - period + 1);

    let mut ema_val = data[..period].iter().sum::<f64>() / period as f64;
    result.push(ema_val);

    for &value in &data[period..] {
        ema_val = (value - ema_val) * multiplier + ema_val;
        result.push(ema_val);
    }

    result
}

/// Relative Strength Index (Wilder). The first output lines up with
/// `data[period]` and is computed from the seed averages.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut rsi_values = Vec::with_capacity(data.len() - period);
    rsi_values.push(rsi_from_averages(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        rsi_values.push(rsi_from_averages(avg_gain, avg_loss));
    }

    rsi_values
}

/// Zero average loss saturates RSI at 100 instead of dividing by zero.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0)
}

/// MACD (Moving Average Convergence Divergence)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdResult {
    /// Starts at `data[slow_period - 1]`.
    pub macd_line: Vec<f64>,
    /// Starts at `data[slow_period + signal_period - 2]`.
    pub signal_line: Vec<f64>,
    /// Same alignment as `signal_line`.
    pub histogram: Vec<f64>,
}

pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    if fast_period == 0 || signal_period == 0 || slow_period <= fast_period {
        return MacdResult::default();
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);
    if ema_slow.is_empty() {
        return MacdResult::default();
    }

    let offset = slow_period - fast_period;
    let macd_line: Vec<f64> = ema_slow
        .iter()
        .enumerate()
        .map(|(i, slow)| ema_fast[i + offset] - slow)
        .collect();

    let signal_line = ema(&macd_line, signal_period);

    let hist_offset = macd_line.len() - signal_line.len();
    let histogram = signal_line
        .iter()
        .enumerate()
        .map(|(i, signal)| macd_line[i + hist_offset] - signal)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Bollinger Bands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bands use the population standard deviation of the window.
pub fn bollinger_bands(data: &[f64], period: usize, std_dev: f64) -> BollingerBands {
    if period == 0 || data.len() < period {
        return BollingerBands::default();
    }

    let middle = sma(data, period);
    let mut upper = Vec::with_capacity(middle.len());
    let mut lower = Vec::with_capacity(middle.len());

    for i in period - 1..data.len() {
        let slice = &data[i + 1 - period..=i];
        let mean = middle[i + 1 - period];
        let variance: f64 = slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let band = std_dev.abs() * variance.sqrt();

        upper.push(mean + band);
        lower.push(mean - band);
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

/// Average True Range. The first output lines up with `bars[period]`.
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period + 1 {
        return vec![];
    }

    let true_ranges: Vec<f64> = bars
        .windows(2)
        .map(|w| w[1].true_range(w[0].close))
        .collect();

    let mut atr_values = Vec::with_capacity(true_ranges.len() - period + 1);
    let mut atr = true_ranges[..period].iter().sum::<f64>() / period as f64;
    atr_values.push(atr);

    for tr in &true_ranges[period..] {
        atr = (atr * (period - 1) as f64 + tr) / period as f64;
        atr_values.push(atr);
    }

    atr_values
}

/// Stochastic Oscillator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StochasticResult {
    /// Starts at `bars[k_period - 1]`.
    pub k: Vec<f64>,
    /// Starts at `bars[k_period + d_period - 2]`.
    pub d: Vec<f64>,
}

pub fn stochastic(bars: &[Bar], k_period: usize, d_period: usize) -> StochasticResult {
    if k_period == 0 || bars.len() < k_period {
        return StochasticResult::default();
    }

    let mut k_values = Vec::with_capacity(bars.len() - k_period + 1);

    for i in k_period - 1..bars.len() {
        let (highest, lowest) = high_low(&bars[i + 1 - k_period..=i]);

        let k = if highest == lowest {
            50.0
        } else {
            100.0 * (bars[i].close - lowest) / (highest - lowest)
        };

        k_values.push(k.clamp(0.0, 100.0));
    }

    let d_values = sma(&k_values, d_period);

    StochasticResult {
        k: k_values,
        d: d_values,
    }
}

/// Williams %R over the trailing `period` bars, in [-100, 0].
pub fn williams_r(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period {
        return vec![];
    }

    (period - 1..bars.len())
        .map(|i| {
            let (highest, lowest) = high_low(&bars[i + 1 - period..=i]);
            if highest == lowest {
                -50.0
            } else {
                ((highest - bars[i].close) / (highest - lowest) * -100.0).clamp(-100.0, 0.0)
            }
        })
        .collect()
}

/// Commodity Channel Index using the 0.015 Lambert constant.
pub fn cci(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period {
        return vec![];
    }

    let typical: Vec<f64> = bars.iter().map(Bar::typical_price).collect();
    let tp_sma = sma(&typical, period);

    tp_sma
        .iter()
        .enumerate()
        .map(|(j, &mean)| {
            let i = j + period - 1;
            let window = &typical[j..=i];
            let mean_dev = window.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / period as f64;
            if mean_dev == 0.0 {
                0.0
            } else {
                (typical[i] - mean) / (0.015 * mean_dev)
            }
        })
        .collect()
}

fn high_low(window: &[Bar]) -> (f64, f64) {
    let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    (highest, lowest)
}

/// On-Balance Volume
pub fn obv(bars: &[Bar]) -> Vec<f64> {
    if bars.is_empty() {
        return vec![];
    }

    let mut obv_values = Vec::with_capacity(bars.len());
    obv_values.push(bars[0].volume);

    for i in 1..bars.len() {
        let prev_obv = obv_values[i - 1];
        let new_obv = if bars[i].close > bars[i - 1].close {
            prev_obv + bars[i].volume
        } else if bars[i].close < bars[i - 1].close {
            prev_obv - bars[i].volume
        } else {
            prev_obv
        };
        obv_values.push(new_obv);
    }

    obv_values
}

/// Average Directional Index (ADX) — measures trend strength (0-100)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdxResult {
    /// Starts at `bars[2 * period]`.
    pub adx: Vec<f64>,
    /// Starts at `bars[period + 1]`.
    pub plus_di: Vec<f64>,
    /// Starts at `bars[period + 1]`.
    pub minus_di: Vec<f64>,
}

pub fn adx(bars: &[Bar], period: usize) -> AdxResult {
    if period == 0 || bars.len() < period * 2 + 1 {
        return AdxResult::default();
    }

    // Calculate +DM, -DM and TR
    let mut plus_dm = Vec::with_capacity(bars.len() - 1);
    let mut minus_dm = Vec::with_capacity(bars.len() - 1);
    let mut true_range = Vec::with_capacity(bars.len() - 1);

    for i in 1..bars.len() {
        let up_move = bars[i].high - bars[i - 1].high;
        let down_move = bars[i - 1].low - bars[i].low;

        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
        true_range.push(bars[i].true_range(bars[i - 1].close));
    }

    // Smoothed sums using Wilder's method
    let mut smoothed_plus_dm = plus_dm[..period].iter().sum::<f64>();
    let mut smoothed_minus_dm = minus_dm[..period].iter().sum::<f64>();
    let mut smoothed_tr = true_range[..period].iter().sum::<f64>();

    let mut plus_di_values = Vec::with_capacity(plus_dm.len() - period);
    let mut minus_di_values = Vec::with_capacity(plus_dm.len() - period);
    let mut dx_values = Vec::with_capacity(plus_dm.len() - period);

    for i in period..plus_dm.len() {
        smoothed_plus_dm = smoothed_plus_dm - smoothed_plus_dm / period as f64 + plus_dm[i];
        smoothed_minus_dm = smoothed_minus_dm - smoothed_minus_dm / period as f64 + minus_dm[i];
        smoothed_tr = smoothed_tr - smoothed_tr / period as f64 + true_range[i];

        let pdi = if smoothed_tr > 0.0 { 100.0 * smoothed_plus_dm / smoothed_tr } else { 0.0 };
        let mdi = if smoothed_tr > 0.0 { 100.0 * smoothed_minus_dm / smoothed_tr } else { 0.0 };

        plus_di_values.push(pdi);
        minus_di_values.push(mdi);

        let di_sum = pdi + mdi;
        let dx = if di_sum > 0.0 { 100.0 * (pdi - mdi).abs() / di_sum } else { 0.0 };
        dx_values.push(dx);
    }

    // Smooth DX into ADX
    let mut adx_values = Vec::with_capacity(dx_values.len() - period + 1);
    let mut adx_val = dx_values[..period].iter().sum::<f64>() / period as f64;
    adx_values.push(adx_val);

    for dx in &dx_values[period..] {
        adx_val = (adx_val * (period - 1) as f64 + dx) / period as f64;
        adx_values.push(adx_val);
    }

    AdxResult {
        adx: adx_values,
        plus_di: plus_di_values,
        minus_di: minus_di_values,
    }
}

/// Parabolic SAR trend direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SarTrend {
    Up,
    Down,
}

/// Running state of the Parabolic SAR fold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SarState {
    pub trend: SarTrend,
    pub sar: f64,
    pub extreme_point: f64,
    pub accel_factor: f64,
}

impl SarState {
    /// Seed from the first bar; the initial direction comes from the first
    /// two closes.
    pub fn initial(first: &Bar, second: &Bar, accel_step: f64) -> Self {
        if second.close >= first.close {
            SarState {
                trend: SarTrend::Up,
                sar: first.low,
                extreme_point: first.high,
                accel_factor: accel_step,
            }
        } else {
            SarState {
                trend: SarTrend::Down,
                sar: first.high,
                extreme_point: first.low,
                accel_factor: accel_step,
            }
        }
    }

    /// Advance the state by one bar.
    pub fn step(self, bar: &Bar, accel_step: f64, accel_max: f64) -> SarState {
        let sar = self.sar + self.accel_factor * (self.extreme_point - self.sar);

        match self.trend {
            SarTrend::Up if bar.low < sar => SarState {
                trend: SarTrend::Down,
                sar: self.extreme_point,
                extreme_point: bar.low,
                accel_factor: accel_step,
            },
            SarTrend::Down if bar.high > sar => SarState {
                trend: SarTrend::Up,
                sar: self.extreme_point,
                extreme_point: bar.high,
                accel_factor: accel_step,
            },
            SarTrend::Up if bar.high > self.extreme_point => SarState {
                sar,
                extreme_point: bar.high,
                accel_factor: (self.accel_factor + accel_step).min(accel_max),
                ..self
            },
            SarTrend::Down if bar.low < self.extreme_point => SarState {
                sar,
                extreme_point: bar.low,
                accel_factor: (self.accel_factor + accel_step).min(accel_max),
                ..self
            },
            _ => SarState { sar, ..self },
        }
    }
}

/// Parabolic SAR states, one per bar starting at `bars[1]`. Must be computed
/// as a single left-to-right pass.
pub fn parabolic_sar_states(bars: &[Bar], accel_step: f64, accel_max: f64) -> Vec<SarState> {
    if bars.len() < 2 || accel_step <= 0.0 || accel_max < accel_step {
        return vec![];
    }

    let seed = SarState::initial(&bars[0], &bars[1], accel_step);
    bars[1..]
        .iter()
        .scan(seed, |state, bar| {
            *state = state.step(bar, accel_step, accel_max);
            Some(*state)
        })
        .collect()
}

/// Parabolic SAR values starting at `bars[1]`.
pub fn parabolic_sar(bars: &[Bar], accel_step: f64, accel_max: f64) -> Vec<f64> {
    parabolic_sar_states(bars, accel_step, accel_max)
        .into_iter()
        .map(|s| s.sar)
        .collect()
}

/// Volume-Weighted Average Price over a single session. No automatic reset.
pub fn vwap(bars: &[Bar]) -> Vec<f64> {
    let mut vwap_values = Vec::with_capacity(bars.len());
    let mut cumulative_tpv = 0.0;
    let mut cumulative_volume = 0.0;

    for bar in bars {
        let typical_price = bar.typical_price();
        cumulative_tpv += typical_price * bar.volume;
        cumulative_volume += bar.volume;

        let vwap = if cumulative_volume > 0.0 {
            cumulative_tpv / cumulative_volume
        } else {
            typical_price
        };

        vwap_values.push(vwap);
    }

    vwap_values
}

/// VWAP that restarts whenever the caller-supplied session key changes
/// between consecutive bars.
pub fn session_vwap<K, F>(bars: &[Bar], session_key: F) -> Vec<f64>
where
    K: PartialEq,
    F: Fn(&Bar) -> K,
{
    let mut values = Vec::with_capacity(bars.len());
    let mut start = 0;

    for i in 1..=bars.len() {
        if i == bars.len() || session_key(&bars[i]) != session_key(&bars[i - 1]) {
            values.extend(vwap(&bars[start..i]));
            start = i;
        }
    }

    values
}

/// Moving average of volume.
pub fn volume_sma(bars: &[Bar], period: usize) -> Vec<f64> {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    sma(&volumes, period)
}
