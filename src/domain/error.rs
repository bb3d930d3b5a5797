use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Failure kinds of a single comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompareError {
    SourceUnreadable { path: PathBuf, reason: String },
    MissingColumn { path: PathBuf, column: String },
    TimestampParseFailure { path: PathBuf, row: usize, value: String },
    OutputWriteFailure { path: PathBuf, reason: String },
}

impl CompareError {
    pub fn source_unreadable(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        CompareError::SourceUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn output_write_failure(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        CompareError::OutputWriteFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable snake_case label, matching the serialized `kind` tag
    pub fn kind(&self) -> &'static str {
        match self {
            CompareError::SourceUnreadable { .. } => "source_unreadable",
            CompareError::MissingColumn { .. } => "missing_column",
            CompareError::TimestampParseFailure { .. } => "timestamp_parse_failure",
            CompareError::OutputWriteFailure { .. } => "output_write_failure",
        }
    }
}

impl fmt::Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareError::SourceUnreadable { path, reason } => {
                write!(f, "Cannot read {}: {}", path.display(), reason)
            }
            CompareError::MissingColumn { path, column } => {
                write!(f, "Column '{}' not found in {}", column, path.display())
            }
            CompareError::TimestampParseFailure { path, row, value } => write!(
                f,
                "Cannot parse sign-in date '{}' at row {} of {}",
                value,
                row,
                path.display()
            ),
            CompareError::OutputWriteFailure { path, reason } => {
                write!(f, "Cannot write {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for CompareError {}

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    ConfigError(String),
    ValidationError(String),
    IoError(String),
    Compare(CompareError),
}

impl AppError {
    /// Label reported to front ends next to the message
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal",
            AppError::ConfigError(_) => "config_error",
            AppError::ValidationError(_) => "validation_error",
            AppError::IoError(_) => "io_error",
            AppError::Compare(err) => err.kind(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::Compare(err) => write!(f, "{}", err),
        }
    }
}

// Implement std::error::Error so front ends can box and chain it
impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<CompareError> for AppError {
    fn from(err: CompareError) -> Self {
        AppError::Compare(err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
