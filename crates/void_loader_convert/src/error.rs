//! Error types for loader conversion

use std::path::PathBuf;

use thiserror::Error;

use crate::rule::Stage;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors that can occur while building rules or converting files
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Failed to read or write a file
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration parse error
    #[error("TOML parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// A rewrite pattern failed to compile
    #[error("Invalid pattern for rule '{rule}': {source}")]
    Pattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// A rule was added out of pipeline order
    #[error("Rule '{rule}' belongs to stage {stage:?} but follows stage {previous:?}")]
    StageOrder {
        rule: String,
        stage: Stage,
        previous: Stage,
    },

    /// Required setting missing
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Report could not be written
    #[error("Report serialization failed: {0}")]
    Report(#[from] serde_json::Error),
}

impl ConvertError {
    /// Create an IO error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}
