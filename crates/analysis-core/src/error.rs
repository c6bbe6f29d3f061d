use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Not enough history to produce a result. Raw indicator functions never
    /// return this; they return an empty series instead.
    #[error("Indicators unavailable: need at least {required} bars, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Data source error: {0}")]
    Source(String),
}

impl AnalysisError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AnalysisError::Validation(msg.into())
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, AnalysisError::InsufficientData { .. })
    }
}
