use std::sync::Arc;

use analysis_core::{AnalysisError, Bar, BarSource, Clock, SystemClock, TtlCache};
use chrono::Duration;

use crate::analyzer::TechnicalAnalysisEngine;
use crate::params::IndicatorParams;
use crate::series::IndicatorSeries;
use crate::snapshot::TechnicalSnapshot;

/// Default lifetime of cached bar history.
pub const DEFAULT_BAR_TTL_SECS: i64 = 300;

/// Fetches bars through a [`BarSource`], keeps them in a TTL cache and builds
/// fresh snapshots from them. Snapshots themselves are never cached.
pub struct SnapshotService<S, C = SystemClock>
where
    S: BarSource,
    C: Clock,
{
    source: S,
    engine: TechnicalAnalysisEngine,
    bars_cache: TtlCache<String, Arc<Vec<Bar>>, C>,
}

impl<S: BarSource> SnapshotService<S, SystemClock> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self::with_clock(source, ttl, SystemClock)
    }
}

impl<S: BarSource, C: Clock> SnapshotService<S, C> {
    pub fn with_clock(source: S, ttl: Duration, clock: C) -> Self {
        Self {
            source,
            engine: TechnicalAnalysisEngine::new(),
            bars_cache: TtlCache::with_clock(ttl, clock),
        }
    }

    pub fn with_engine(mut self, engine: TechnicalAnalysisEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Bars for `symbol`, from cache when fresh. A miss also evicts every
    /// other expired entry.
    pub fn bars(&self, symbol: &str) -> Result<Arc<Vec<Bar>>, AnalysisError> {
        let key = symbol.to_uppercase();
        self.bars_cache.get_or_try_insert_with(key, || {
            let purged = self.bars_cache.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "expired bar histories evicted");
            }
            let bars = self.source.fetch_bars(symbol)?;
            check_ordering(symbol, &bars)?;
            tracing::debug!(symbol, bars = bars.len(), "bars loaded from source");
            Ok(Arc::new(bars))
        })
    }

    pub fn snapshot(&self, symbol: &str) -> Result<TechnicalSnapshot, AnalysisError> {
        let bars = self.bars(symbol)?;
        self.engine.evaluate(&symbol.to_uppercase(), &bars)
    }

    pub fn indicator(
        &self,
        symbol: &str,
        params: &IndicatorParams,
    ) -> Result<IndicatorSeries, AnalysisError> {
        params.validate()?;
        let bars = self.bars(symbol)?;
        params.compute(&bars)
    }

    /// Drop cached bars, e.g. after new data arrived.
    pub fn invalidate(&self, symbol: &str) {
        self.bars_cache.invalidate(&symbol.to_uppercase());
    }

    pub fn purge_expired(&self) -> usize {
        self.bars_cache.purge_expired()
    }

    pub fn cached_symbols(&self) -> usize {
        self.bars_cache.len()
    }
}

fn check_ordering(symbol: &str, bars: &[Bar]) -> Result<(), AnalysisError> {
    if let Some(i) = bars.windows(2).position(|w| w[1].timestamp <= w[0].timestamp) {
        return Err(AnalysisError::InvalidData(format!(
            "{}: bars not strictly ascending at index {}",
            symbol,
            i + 1
        )));
    }
    Ok(())
}
