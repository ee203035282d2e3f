//! Wire model of the `Custom::SqlRun` resource properties, and the settings the
//! handler runtime reads from its environment.

pub mod configuration;
pub mod connection_settings;
pub mod settings;
pub mod values;

pub use configuration::{properties_schema, ResourceProperties, SqlStatement, StatementBatch};
pub use connection_settings::{ConnectionDescriptor, DriverType, DriverTypeHostPort, JdbcUrl};
pub use settings::{LogFormat, RuntimeSettings};
pub use values::{ParameterValue, Port};
