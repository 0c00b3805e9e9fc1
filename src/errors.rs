//! Error types for codecflow

use thiserror::Error;

/// Main error type for codecflow
///
/// Codec failures wrap the underlying library error transparently so the
/// parser's own message and kind reach the caller unchanged.
#[derive(Error, Debug)]
pub enum CodecflowError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("parse error on line 1, column {column}: {message}")]
    CsvSyntax {
        column: usize,
        message: String,
    },

    #[error("no codec registered for identifier {0:?}")]
    UnknownFormat(String),

    #[error("end of stream")]
    EndOfStream,

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl CodecflowError {
    /// Create a malformed input error
    pub fn malformed(msg: impl Into<String>) -> Self {
        CodecflowError::Malformed(msg.into())
    }

    /// Whether this error is a registry lookup miss
    pub fn is_unknown_format(&self) -> bool {
        matches!(self, CodecflowError::UnknownFormat(_))
    }

    /// Whether this error was produced by an expired or cancelled context
    pub fn is_context_error(&self) -> bool {
        matches!(self, CodecflowError::Cancelled | CodecflowError::DeadlineExceeded)
    }
}

pub type Result<T> = std::result::Result<T, CodecflowError>;
