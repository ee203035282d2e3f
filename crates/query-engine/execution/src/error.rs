//! Errors we might encounter while connecting and executing statements.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to connect to the database: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("invalid connection: {0}")]
    InvalidConnection(String),
    #[error(transparent)]
    Reference(#[from] query_engine_references::Error),
    #[error("{0}")]
    Database(#[from] sqlx::Error),
    #[error("statement {index} failed: {source}")]
    Statement {
        index: usize,
        #[source]
        source: Box<Error>,
    },
    #[error("column '{column}' has type {type_name}, which cannot be represented in the response")]
    UnsupportedColumn { column: String, type_name: String },
    #[error("unable to read column '{column}': {source}")]
    ColumnDecode {
        column: String,
        #[source]
        source: sqlx::Error,
    },
}

impl Error {
    /// The error itself, or the underlying error of a failed statement.
    pub fn root(&self) -> &Error {
        match self {
            Error::Statement { source, .. } => source.root(),
            other => other,
        }
    }

    /// The index of the failed statement, if the error happened while running one.
    pub fn statement_index(&self) -> Option<usize> {
        match self {
            Error::Statement { index, .. } => Some(*index),
            _ => None,
        }
    }
}
