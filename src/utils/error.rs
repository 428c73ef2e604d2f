use std::time::Duration;
use thiserror::Error;

/// Failures raised by a persistence adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage task failed: {0}")]
    Task(String),

    #[error("Corrupt row {id}: {message}")]
    Corrupt { id: i64, message: String },

    #[error("Storage connection lock poisoned")]
    Poisoned,

    #[error("Storage call cancelled")]
    Cancelled,

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures raised by an enrichment provider adapter.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("Provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Provider answered with status {status}, expected 200")]
    UnexpectedStatus { status: u16 },

    #[error("Provider body could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Error, Debug)]
pub enum SongError {
    #[error("Song {id} not found")]
    NotFound { id: i64 },

    #[error("{operation}: enrichment provider failed: {source}")]
    Dependency {
        operation: &'static str,
        #[source]
        source: EnrichmentError,
    },

    #[error("{operation}: storage failed: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{operation} did not complete within {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// Coarse classification used by callers to map failures onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Dependency,
    Persistence,
    Timeout,
    Validation,
    Config,
}

impl SongError {
    pub fn persistence(operation: &'static str, source: StoreError) -> Self {
        SongError::Persistence { operation, source }
    }

    pub fn dependency(operation: &'static str, source: EnrichmentError) -> Self {
        SongError::Dependency { operation, source }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        SongError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SongError::NotFound { .. } => ErrorCategory::NotFound,
            SongError::Dependency { .. } => ErrorCategory::Dependency,
            SongError::Persistence { .. } => ErrorCategory::Persistence,
            SongError::Timeout { .. } => ErrorCategory::Timeout,
            SongError::Validation { .. } => ErrorCategory::Validation,
            SongError::Config { .. } => ErrorCategory::Config,
        }
    }

    /// Process exit code for the command-line front end.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::NotFound => 2,
            ErrorCategory::Dependency => 3,
            ErrorCategory::Persistence => 4,
            ErrorCategory::Timeout => 5,
            ErrorCategory::Validation | ErrorCategory::Config => 1,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SongError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, SongError>;
