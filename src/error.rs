use std::path::PathBuf;

/// Everything that can go wrong between a file path and a published dataset.
///
/// A cache miss is not an error; lookups return `Option`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unrecognized file content: {}", .0.display())]
    FormatUnrecognized(PathBuf),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Ingestion error: {0}")]
    Ingestion(String),
    #[error("Invalid GTI list: {0}")]
    InvalidGti(String),
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Short label for the error kind, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::FormatUnrecognized(_) => "FormatUnrecognized",
            Error::Parse(_) => "ParseError",
            Error::Ingestion(_) => "IngestionError",
            Error::InvalidGti(_) => "InvalidGti",
            Error::NotFound { .. } => "NotFound",
            Error::Config(_) => "ConfigError",
            Error::Io(_) => "IoError",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
