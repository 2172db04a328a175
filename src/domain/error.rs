//! Error taxonomy (spec.md §7).

use thiserror::Error;

/// Result type alias for operations that can fail.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the indexing and retrieval core.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Storage errors: I/O failures, schema corruption, integrity violations.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// Configuration errors: missing API key, unknown provider, invalid dimensions.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// Extraction errors: malformed source files. Callers should log and skip
    /// the offending file rather than propagate this past the extractor.
    #[error("extraction error in {file}: {message}")]
    Extraction {
        /// File that failed to extract.
        file: String,
        /// Description of the failure.
        message: String,
    },

    /// Embedding provider errors: request failures, bad responses.
    #[error("embedding provider error: {message}")]
    Embedding {
        /// Description of the failure.
        message: String,
    },

    /// Retrieval errors that aren't locally recoverable (FTS syntax errors
    /// are sanitized and retried, not surfaced as this variant).
    #[error("retrieval error: {message}")]
    Retrieval {
        /// Description of the failure.
        message: String,
    },

    /// A resource could not be found.
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// Invalid argument supplied by a caller.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Operation was cancelled via a cancellation token.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Construct a storage error.
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Construct a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Construct an extraction error scoped to a single file.
    pub fn extraction<F: Into<String>, S: Into<String>>(file: F, message: S) -> Self {
        Self::Extraction {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Construct an embedding-provider error.
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Construct a retrieval error.
    pub fn retrieval<S: Into<String>>(message: S) -> Self {
        Self::Retrieval {
            message: message.into(),
        }
    }

    /// Construct a not-found error.
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Construct an invalid-argument error.
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Embedding {
            message: err.to_string(),
        }
    }
}
