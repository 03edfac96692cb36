//! Error types for the Grid Engine model

use std::num::{ParseFloatError, ParseIntError};
use std::process::ExitStatus;

use thiserror::Error;

/// Result type for Grid Engine operations
pub type Result<T> = std::result::Result<T, GridError>;

/// Broad failure category, so callers can branch without matching every variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed numeric or text content
    Parse,
    /// A requested resource key is absent
    NotFound,
    /// The input does not satisfy the operation's precondition
    Domain,
    /// Retrieval of the scheduler document failed
    Upstream,
}

/// Errors that can occur while decoding or querying a qstat snapshot
#[derive(Debug, Error)]
pub enum GridError {
    /// Text that should hold a base-10 integer
    #[error("Invalid integer {value:?}: {source}")]
    InvalidInteger {
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// Text that should hold a decimal float
    #[error("Invalid float {value:?}: {source}")]
    InvalidFloat {
        value: String,
        #[source]
        source: ParseFloatError,
    },

    /// Storage string with nothing to parse
    #[error("Invalid storage value {value:?}")]
    InvalidStorageValue { value: String },

    /// Timestamp not in the scheduler's ISO-8601 form
    #[error("Invalid timestamp {value:?}")]
    InvalidTime { value: String },

    /// The qstat XML could not be decoded
    #[error("Malformed qstat document: {0}")]
    Document(#[from] quick_xml::DeError),

    /// Resource key missing from a resource list
    #[error("Resource not found: {key}")]
    ResourceNotFound { key: String },

    /// Expansion requested on a job without a task range
    #[error("Job task field {tasks:?} does not describe a range of tasks")]
    NotATaskRange { tasks: String },

    /// Task range with a zero or negative step
    #[error("Task range step must be positive, got {step}")]
    NonPositiveStep { step: i64 },

    /// Task range whose start lies past its end
    #[error("Task range {start}-{end} is empty")]
    EmptyTaskRange { start: i64, end: i64 },

    /// Task range that would expand past `limit` jobs
    #[error("Task range {start}-{end}:{step} expands to more than {limit} tasks")]
    TaskRangeTooLarge {
        start: i64,
        end: i64,
        step: i64,
        limit: i64,
    },

    /// The scheduler tool could not be started or read
    #[error("Failed to run {program}: {source}")]
    Command {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The scheduler tool exited unsuccessfully
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// A snapshot file could not be read
    #[error("Failed to read snapshot {path}: {source}")]
    Snapshot {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl GridError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GridError::InvalidInteger { .. }
            | GridError::InvalidFloat { .. }
            | GridError::InvalidStorageValue { .. }
            | GridError::InvalidTime { .. }
            | GridError::Document(_) => ErrorKind::Parse,
            GridError::ResourceNotFound { .. } => ErrorKind::NotFound,
            GridError::NotATaskRange { .. }
            | GridError::NonPositiveStep { .. }
            | GridError::EmptyTaskRange { .. }
            | GridError::TaskRangeTooLarge { .. } => ErrorKind::Domain,
            GridError::Command { .. }
            | GridError::CommandFailed { .. }
            | GridError::Snapshot { .. } => ErrorKind::Upstream,
        }
    }

    pub(crate) fn invalid_integer(value: &str, source: ParseIntError) -> Self {
        GridError::InvalidInteger {
            value: value.to_string(),
            source,
        }
    }

    pub(crate) fn invalid_float(value: &str, source: ParseFloatError) -> Self {
        GridError::InvalidFloat {
            value: value.to_string(),
            source,
        }
    }
}
