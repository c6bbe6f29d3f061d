use std::sync::Arc;

use crate::{AnalysisError, Bar};

/// Port for the historical-data collaborator. Implementations must return bars
/// ascending by timestamp, one per trading session.
pub trait BarSource: Send + Sync {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, AnalysisError>;
}

impl<S: BarSource + ?Sized> BarSource for Arc<S> {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, AnalysisError> {
        (**self).fetch_bars(symbol)
    }
}
