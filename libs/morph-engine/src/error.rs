use morph_api::error::{ConfigError, ConvertError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("record not registered: {0}")]
    UnknownRecord(String),

    #[error("field '{field}' of record '{record}' has no conversion metadata")]
    UnknownField { record: String, field: String },
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For wrapped api errors, context is added to the inner error.
    /// For other variants, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Config(e) => EngineError::Config(e.with_context(ctx)),
            EngineError::Convert(e) => EngineError::Convert(e.with_context(ctx)),
            EngineError::UnknownRecord(msg) => EngineError::UnknownRecord(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}
