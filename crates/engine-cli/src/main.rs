//! engine-cli: run the indicator, risk and rebalancing engines over local files.
//!
//! Usage:
//!   engine-cli snapshot --symbol AAPL [--data-dir DIR]
//!   engine-cli indicator --symbol AAPL --indicator rsi --period 14
//!   engine-cli risk --snapshots snapshots.json
//!   engine-cli rebalance --holdings holdings.json --strategy sector_balanced --max-sector 30

mod config;
mod csv_source;

use anyhow::{bail, Context, Result};
use analysis_core::BarSource;
use chrono::Duration;
use config::EngineConfig;
use csv_source::CsvBarSource;
use portfolio_manager::{
    shared_math, PortfolioHolding, PortfolioSnapshot, RebalanceCalculator, RebalanceStrategy,
    RiskCalculator,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use technical_analysis::{IndicatorParams, SnapshotService};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "engine_cli=info,technical_analysis=warn,portfolio_manager=warn".into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = EngineConfig::from_env()?;
    if let Some(dir) = arg_value(&args, "--data-dir") {
        config.data_dir = PathBuf::from(dir);
    }

    match args.first().map(String::as_str) {
        Some("snapshot") => run_snapshot(&config, &args),
        Some("indicator") => run_indicator(&config, &args),
        Some("risk") => run_risk(&args),
        Some("rebalance") => run_rebalance(&config, &args),
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  engine-cli snapshot --symbol SYM                      Technical snapshot from DATA_DIR/SYM.csv");
    eprintln!("  engine-cli indicator --symbol SYM --indicator NAME    One aligned indicator series");
    eprintln!("  engine-cli risk --snapshots FILE.json                 Risk metrics for a snapshot history");
    eprintln!("  engine-cli rebalance --holdings FILE.json --strategy NAME");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --data-dir DIR       Bar files directory (default: $ENGINE_DATA_DIR or ./data)");
    eprintln!("  --period N           Indicator period");
    eprintln!("  --fast/--slow/--signal N, --k X, --d-period N, --step X, --max X");
    eprintln!("  --targets FILE.json  Symbol -> percent map for the custom strategy");
    eprintln!("  --max-sector PCT     Sector ceiling for sector_balanced");
}

fn run_snapshot(config: &EngineConfig, args: &[String]) -> Result<()> {
    let symbol = required(args, "--symbol")?;
    let service = SnapshotService::new(
        CsvBarSource::new(&config.data_dir),
        Duration::seconds(config.bar_cache_ttl_secs),
    );
    let snapshot = service
        .snapshot(symbol)
        .with_context(|| format!("snapshot for {}", symbol))?;
    tracing::info!(
        symbol,
        signal = snapshot.overall_signal.to_label(),
        score = snapshot.score,
        "snapshot ready"
    );
    print_json(&snapshot)
}

#[derive(Serialize)]
struct IndicatorOutput<'a> {
    symbol: &'a str,
    params: IndicatorParams,
    #[serde(flatten)]
    series: technical_analysis::IndicatorSeries,
}

fn run_indicator(config: &EngineConfig, args: &[String]) -> Result<()> {
    let symbol = required(args, "--symbol")?;
    let params = indicator_params(args)?;
    let service = SnapshotService::new(
        CsvBarSource::new(&config.data_dir),
        Duration::seconds(config.bar_cache_ttl_secs),
    );
    let series = service
        .indicator(symbol, &params)
        .with_context(|| format!("{} for {}", params.name(), symbol))?;
    if series.is_empty() {
        tracing::warn!(symbol, indicator = params.name(), min_bars = params.min_bars(), "not enough bars for any value");
    }
    print_json(&IndicatorOutput {
        symbol,
        params,
        series,
    })
}

fn run_risk(args: &[String]) -> Result<()> {
    let path = required(args, "--snapshots")?;
    let snapshots: Vec<PortfolioSnapshot> = read_json(Path::new(path))?;
    let metrics = RiskCalculator::compute(&snapshots);
    tracing::info!(data_points = metrics.data_points, "risk metrics computed");
    print_json(&metrics)
}

fn run_rebalance(config: &EngineConfig, args: &[String]) -> Result<()> {
    let holdings: Vec<PortfolioHolding> = read_json(Path::new(required(args, "--holdings")?))?;
    let name = required(args, "--strategy")?;

    let strategy = match normalized(name).as_str() {
        "custom" => {
            let targets: HashMap<String, f64> =
                read_json(Path::new(required(args, "--targets")?))?;
            RebalanceStrategy::Custom { targets }
        }
        "sector_balanced" => RebalanceStrategy::SectorBalanced {
            max_sector_percent: match arg_value(args, "--max-sector") {
                Some(v) => v.parse().context("--max-sector must be a number")?,
                None => config.max_sector_percent,
            },
        },
        "risk_parity" => RebalanceStrategy::RiskParity {
            volatilities: estimate_volatilities(&CsvBarSource::new(&config.data_dir), &holdings),
        },
        _ => RebalanceStrategy::from_name(name)?,
    };

    let plan = RebalanceCalculator::plan_with_deadband(&holdings, &strategy, &config.deadband())?;
    print_json(&plan)
}

/// Annualised volatility per held symbol from its bar file, where one exists.
/// Symbols without usable history fall back to the sector heuristic.
fn estimate_volatilities(source: &CsvBarSource, holdings: &[PortfolioHolding]) -> HashMap<String, f64> {
    let mut volatilities = HashMap::new();
    for h in holdings {
        if !source.has_symbol(&h.symbol) {
            continue;
        }
        match source.fetch_bars(&h.symbol) {
            Ok(bars) => {
                let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
                match shared_math::annualized_volatility_from_prices(&closes) {
                    Some(vol) if vol > 0.0 => {
                        volatilities.insert(h.symbol.clone(), vol);
                    }
                    _ => tracing::warn!(symbol = %h.symbol, "not enough price history for volatility"),
                }
            }
            Err(e) => tracing::warn!(symbol = %h.symbol, error = %e, "skipping bar file"),
        }
    }
    volatilities
}

fn indicator_params(args: &[String]) -> Result<IndicatorParams> {
    let name = required(args, "--indicator")?;
    let period = |default: usize| -> Result<usize> { parsed(args, "--period", default) };

    let params = match normalized(name).as_str() {
        "sma" => IndicatorParams::sma(period(20)?)?,
        "ema" => IndicatorParams::ema(period(20)?)?,
        "rsi" => IndicatorParams::rsi(period(14)?)?,
        "atr" => IndicatorParams::atr(period(14)?)?,
        "adx" => IndicatorParams::adx(period(14)?)?,
        "cci" => IndicatorParams::cci(period(20)?)?,
        "williams_r" => IndicatorParams::williams_r(period(14)?)?,
        "volume_sma" => IndicatorParams::volume_sma(period(20)?)?,
        "bollinger" => IndicatorParams::bollinger(period(20)?, parsed(args, "--k", 2.0)?)?,
        "macd" => IndicatorParams::macd(
            parsed(args, "--fast", 12)?,
            parsed(args, "--slow", 26)?,
            parsed(args, "--signal", 9)?,
        )?,
        "stochastic" => IndicatorParams::stochastic(period(14)?, parsed(args, "--d-period", 3)?)?,
        "parabolic_sar" => {
            IndicatorParams::parabolic_sar(parsed(args, "--step", 0.02)?, parsed(args, "--max", 0.2)?)?
        }
        "obv" => IndicatorParams::Obv,
        "vwap" => IndicatorParams::Vwap,
        other => bail!("Unknown indicator '{}'", other),
    };
    Ok(params)
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn required<'a>(args: &'a [String], flag: &str) -> Result<&'a str> {
    arg_value(args, flag).with_context(|| format!("missing required {} argument", flag))
}

fn parsed<T>(args: &[String], flag: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match arg_value(args, flag) {
        Some(v) => v
            .parse()
            .with_context(|| format!("invalid value '{}' for {}", v, flag)),
        None => Ok(default),
    }
}

fn normalized(name: &str) -> String {
    name.trim().to_lowercase().replace('-', "_")
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
