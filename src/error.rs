//! Error types.
//!
//! Library code returns [`EngineError`]; the asset loaders and the runtime
//! entry point use `anyhow::Result` and convert at the boundary.

use thiserror::Error;

/// A label resource (font file) could not be fetched or parsed.
///
/// Cloneable because one cached font future is shared by every label that
/// uses the same path.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to load resource `{path}`: {reason}")]
pub struct ResourceLoadError {
    pub path: String,
    pub reason: String,
}

impl ResourceLoadError {
    pub fn new(path: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("at most {max} point lights are supported, got {got}")]
    TooManyPointLights { max: usize, got: usize },

    #[error("invalid pass chain: {0}")]
    InvalidPassChain(String),

    #[error(transparent)]
    ResourceLoad(#[from] ResourceLoadError),

    #[error("label index {0} is out of range")]
    UnknownLabel(usize),

    #[error("GPU setup failed: {0}")]
    Gpu(String),
}
