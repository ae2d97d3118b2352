use std::fmt;

/// Field metadata is structurally invalid, or names a kind or type that is
/// not registered.
///
/// Raised at registration/resolution time — a record carrying the field
/// cannot be marshalled, but unrelated fields are unaffected.
#[derive(Debug, Clone)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { message: msg.into() }
    }

    /// Add context to the error.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            message: format!("{ctx}: {}", self.message),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConfigError {}

/// A specific value failed to serialize, or a stored representation failed
/// to parse back into the target type.
///
/// Conversion is deterministic — retrying the same input is pointless — so
/// the error propagates to the caller unchanged, with the underlying codec
/// failure attached as `source`.
#[derive(Debug)]
pub struct ConvertError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ConvertError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            source: None,
        }
    }

    /// Wrap the underlying codec failure. The cause is never swallowed;
    /// callers reach it through `std::error::Error::source`.
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Add context to the error, preserving the source chain.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            message: format!("{ctx}: {}", self.message),
            source: self.source,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}
