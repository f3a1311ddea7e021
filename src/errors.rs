//! Error types for the PaperScout research pipeline
//!
//! Provides comprehensive error handling with context propagation.
//! Errors are split by retry policy: capability failures on read-only
//! calls are transient, routing/alignment contract breaches are fatal.

use thiserror::Error;

/// Main error type for the research pipeline
#[derive(Error, Debug)]
pub enum ResearchError {
    /// Router returned a value outside the closed route enum.
    /// Fatal configuration error, never retried.
    #[error("Router returned invalid route {value:?}: expected one of research, general, more_info")]
    InvalidRoute { value: String },

    /// Aligner referenced a fact index outside the evidence range.
    /// Fatal configuration error, never retried.
    #[error("Alignment for step {step} references fact {fact_index} but only {fact_count} facts exist")]
    InvalidAlignment {
        step: usize,
        fact_index: usize,
        fact_count: usize,
    },

    /// An external capability call failed
    #[error("Capability '{capability}' failed: {message}")]
    Capability { capability: String, message: String },

    /// Run was cancelled at a node boundary
    #[error("Run cancelled")]
    Cancelled,

    /// JSON parsing errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("Pipeline error: {0}")]
    Generic(String),
}

impl ResearchError {
    /// Convenience constructor for capability failures
    pub fn capability(capability: &str, message: impl Into<String>) -> Self {
        ResearchError::Capability {
            capability: capability.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ResearchError>;

/// Convert anyhow errors to ResearchError
impl From<anyhow::Error> for ResearchError {
    fn from(err: anyhow::Error) -> Self {
        ResearchError::Generic(err.to_string())
    }
}
