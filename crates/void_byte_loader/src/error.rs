//! Error types for byte loading

use thiserror::Error;

/// Result type for byte loader operations
pub type Result<T> = std::result::Result<T, ByteLoaderError>;

/// Result type for decoders
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Errors that can occur while locating, registering or dispatching loaders
#[derive(Debug, Error)]
pub enum ByteLoaderError {
    /// No resource matched the bytes file name
    #[error("Couldn't find bytes file '{file}' in module '{module}'")]
    ResourceNotFound {
        module: String,
        file: String,
    },

    /// More than one resource matched a suffix lookup
    #[error("Bytes file '{file}' is ambiguous in module '{module}': {candidates:?}")]
    AmbiguousResource {
        module: String,
        file: String,
        candidates: Vec<String>,
    },

    /// The matched resource had no content
    #[error("Resource '{0}' is empty")]
    EmptyResource(String),

    /// A loader with the same name is already registered
    #[error("Loader '{0}' is already registered")]
    DuplicateLoader(String),

    /// Two loaders would compete for the same resource under suffix matching
    #[error("Bytes file '{file}' of loader '{loader}' collides with '{other_file}' of loader '{other}'")]
    SuffixCollision {
        loader: String,
        file: String,
        other: String,
        other_file: String,
    },

    /// The background worker could not be started
    #[error("Failed to spawn load task for '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("TOML parse error: {0}")]
    Config(#[from] toml::de::Error),
}

impl ByteLoaderError {
    /// Create a resource not found error
    pub fn not_found(module: impl Into<String>, file: impl Into<String>) -> Self {
        ByteLoaderError::ResourceNotFound {
            module: module.into(),
            file: file.into(),
        }
    }

    /// Whether this error means the resource could not be acquired
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(
            self,
            ByteLoaderError::ResourceNotFound { .. }
                | ByteLoaderError::AmbiguousResource { .. }
                | ByteLoaderError::EmptyResource(_)
                | ByteLoaderError::Io(_)
        )
    }
}

/// Errors raised by a model decoder
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Ran past the end of the buffer
    #[error("Unexpected end of data at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A length prefix was malformed or negative
    #[error("Invalid length {length} at offset {offset}")]
    InvalidLength {
        offset: usize,
        length: i64,
    },

    /// String payload was not UTF-8
    #[error("Invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 {
        offset: usize,
    },

    /// Object table index out of range or already taken
    #[error("No object at index {0}")]
    MissingObject(usize),

    /// Object table entry had an unexpected type
    #[error("Object at index {index} is not a {expected}")]
    ObjectType {
        index: usize,
        expected: &'static str,
    },

    /// Decoder-specific failure
    #[error("{0}")]
    Custom(String),
}

impl DecodeError {
    /// Create a custom decode error
    pub fn custom(message: impl Into<String>) -> Self {
        DecodeError::Custom(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ByteLoaderError::not_found("MyMod", "GameModel.bytes");
        assert_eq!(
            err.to_string(),
            "Couldn't find bytes file 'GameModel.bytes' in module 'MyMod'"
        );
        assert!(err.is_acquisition_failure());
    }

    #[test]
    fn test_duplicate_is_not_acquisition_failure() {
        assert!(!ByteLoaderError::DuplicateLoader("a".into()).is_acquisition_failure());
    }
}
