//! Errors that fail an invocation.

use query_engine_execution::Error as ExecutionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to decode the lifecycle event: {0}")]
    Decode(#[source] serde_json::Error),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("unable to serialize the response: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// What went wrong, independent of where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Decode,
    Connection,
    ReferenceResolution,
    StatementExecution,
    Serialization,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Decode => "DecodeError",
            ErrorKind::Connection => "ConnectionError",
            ErrorKind::ReferenceResolution => "ReferenceResolutionError",
            ErrorKind::StatementExecution => "StatementExecutionError",
            ErrorKind::Serialization => "SerializationError",
        };
        write!(f, "{name}")
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Decode(_) => ErrorKind::Decode,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Execution(err) => match err.root() {
                ExecutionError::Connection(_) | ExecutionError::InvalidConnection(_) => {
                    ErrorKind::Connection
                }
                ExecutionError::Reference(_) => ErrorKind::ReferenceResolution,
                ExecutionError::Database(_) | ExecutionError::Statement { .. } => {
                    ErrorKind::StatementExecution
                }
                ExecutionError::UnsupportedColumn { .. } | ExecutionError::ColumnDecode { .. } => {
                    ErrorKind::Serialization
                }
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
