use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("Validation error: {0}")]
    Validation(String),
}

impl PortfolioError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PortfolioError::Validation(msg.into())
    }
}
