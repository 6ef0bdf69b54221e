//! Error types for portico

use thiserror::Error;

/// Result type alias using portico's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Template registry error types
#[derive(Error, Debug)]
pub enum Error {
    /// Directory failed structural template validation
    #[error("Invalid template '{name}': {reason}")]
    InvalidTemplate { name: String, reason: String },

    /// Required descriptor key absent
    #[error("Descriptor for template '{name}' is missing required key: {key}")]
    MissingDescriptorKey { name: String, key: String },

    /// Descriptor file unreadable or corrupt
    #[error("Failed to parse descriptor at {path}: {message}")]
    DescriptorParse { path: String, message: String },

    /// Descriptor rewrite could not be persisted
    #[error("Failed to persist descriptor at {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor serialization error
    #[error("Descriptor serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid template error
    pub fn invalid_template(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing descriptor key error
    pub fn missing_descriptor_key(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingDescriptorKey {
            name: name.into(),
            key: key.into(),
        }
    }

    /// Create a descriptor parse error
    pub fn descriptor_parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DescriptorParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a persist error
    pub fn persist(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }
}
