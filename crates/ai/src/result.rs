use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiError {
    #[error("invalid job input: {0}")]
    InvalidInput(String),

    /// Fitting or predicting failed for one group (degenerate or non-finite data).
    #[error("model fit failed: {0}")]
    ModelFit(String),
}

impl AiError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn model_fit(msg: impl Into<String>) -> Self {
        Self::ModelFit(msg.into())
    }
}
