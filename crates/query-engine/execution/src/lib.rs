//! Statement execution against MySQL and PostgreSQL databases.
//!
//! A batch runs on one connection inside one transaction: statements are resolved,
//! formatted for the driver, bound and executed in order, and the whole batch is
//! committed or rolled back.

pub mod connection;
pub mod drivers;
pub mod error;
pub mod execution;
pub mod results;

pub use connection::{Connection, Connector, DatabaseConnector, Transaction};
pub use error::Error;
pub use results::{Row, StatementResult};
