pub mod error;
pub mod models;
pub mod rebalancing;
pub mod risk_metrics;
pub mod shared_math;
pub mod snapshot;

pub use error::PortfolioError;
pub use models::*;
pub use rebalancing::{
    default_sector_volatility, Deadband, RebalanceCalculator, RebalanceStrategy,
    DEFAULT_MAX_SECTOR_PERCENT,
};
pub use risk_metrics::RiskCalculator;
