use analysis_core::{AnalysisError, Bar, BarSource};
use std::path::{Path, PathBuf};

/// Reads daily bars from `<data_dir>/<SYMBOL>.csv` with the header
/// `timestamp,open,high,low,close,volume` (RFC 3339 timestamps).
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    data_dir: PathBuf,
}

impl CsvBarSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", symbol.to_uppercase()))
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.path_for(symbol).is_file()
    }
}

impl BarSource for CsvBarSource {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, AnalysisError> {
        let path = self.path_for(symbol);
        read_bars(&path)
    }
}

pub fn read_bars(path: &Path) -> Result<Vec<Bar>, AnalysisError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AnalysisError::Source(format!("{}: {}", path.display(), e)))?;

    let mut bars = Vec::new();
    for (i, record) in reader.deserialize::<Bar>().enumerate() {
        let bar = record.map_err(|e| {
            AnalysisError::InvalidData(format!("{} row {}: {}", path.display(), i + 1, e))
        })?;
        bars.push(bar);
    }

    tracing::debug!(path = %path.display(), bars = bars.len(), "bar file read");
    Ok(bars)
}
