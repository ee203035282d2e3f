//! A connector that records what it is asked to do instead of talking to a database.
//!
//! Connection descriptors go through the real resolution path, so the recording
//! shows resolved credentials and the driver's placeholder style.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use query_engine_execution::connection::{connect_target, ConnectTarget};
use query_engine_execution::results::count_row;
use query_engine_execution::{Connection, Connector, Error, StatementResult, Transaction};
use query_engine_references::ReferenceResolver;
use query_engine_sql::sql::string::{PlaceholderStyle, SQL};
use sql_run_configuration::ConnectionDescriptor;

/// Everything that happened on connections opened by a [`RecordingConnector`].
#[derive(Debug, Default)]
pub struct Recording {
    pub targets: Vec<ConnectTarget>,
    /// Statements executed, committed or not, in order.
    pub executed: Vec<SQL>,
    /// Statements whose transaction committed.
    pub committed: Vec<SQL>,
    pub commits: usize,
    pub rollbacks: usize,
    pub closes: usize,
}

#[derive(Debug, Default)]
pub struct RecordingConnector {
    recording: Arc<Mutex<Recording>>,
    results: HashMap<usize, StatementResult>,
    fail_at: Option<usize>,
    refuse_connections: bool,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the `index`th executed statement with `rows`. Other statements report
    /// one affected row.
    #[must_use]
    pub fn with_result(mut self, index: usize, rows: StatementResult) -> Self {
        self.results.insert(index, rows);
        self
    }

    /// Fail the `index`th executed statement.
    #[must_use]
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Resolve the descriptor, then refuse to connect.
    #[must_use]
    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    pub fn recording(&self) -> MutexGuard<'_, Recording> {
        self.recording.lock().unwrap()
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        resolver: &dyn ReferenceResolver,
    ) -> Result<Box<dyn Connection>, Error> {
        let (driver, target) = connect_target(descriptor, resolver).await?;
        self.recording().targets.push(target);
        if self.refuse_connections {
            return Err(Error::Connection(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))));
        }
        Ok(Box::new(RecordingConnection {
            recording: self.recording.clone(),
            results: self.results.clone(),
            fail_at: self.fail_at,
            placeholder_style: driver.placeholder_style,
        }))
    }
}

struct RecordingConnection {
    recording: Arc<Mutex<Recording>>,
    results: HashMap<usize, StatementResult>,
    fail_at: Option<usize>,
    placeholder_style: PlaceholderStyle,
}

#[async_trait]
impl Connection for RecordingConnection {
    fn placeholder_style(&self) -> PlaceholderStyle {
        self.placeholder_style
    }

    async fn begin<'c>(&'c mut self) -> Result<Box<dyn Transaction + 'c>, Error> {
        Ok(Box::new(RecordingTransaction {
            connection: self,
            pending: vec![],
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), Error> {
        self.recording.lock().unwrap().closes += 1;
        Ok(())
    }
}

struct RecordingTransaction<'c> {
    connection: &'c mut RecordingConnection,
    pending: Vec<SQL>,
}

#[async_trait]
impl<'c> Transaction for RecordingTransaction<'c> {
    async fn execute(&mut self, statement: &SQL) -> Result<StatementResult, Error> {
        let mut recording = self.connection.recording.lock().unwrap();
        let index = recording.executed.len();
        recording.executed.push(statement.clone());
        if self.connection.fail_at == Some(index) {
            return Err(Error::Database(sqlx::Error::Protocol(format!(
                "statement {index} rejected"
            ))));
        }
        self.pending.push(statement.clone());
        Ok(self
            .connection
            .results
            .get(&index)
            .cloned()
            .unwrap_or_else(|| vec![count_row(1)]))
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        let this = *self;
        let mut recording = this.connection.recording.lock().unwrap();
        recording.commits += 1;
        recording.committed.extend(this.pending);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), Error> {
        self.connection.recording.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}
