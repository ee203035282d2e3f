//! Common functions used across test cases.

use std::sync::Arc;

use sql_run::Handler;
use sql_run_configuration::{ConnectionDescriptor, DriverType, RuntimeSettings};
use tests_common::recording::RecordingConnector;
use tests_common::stores::{InMemoryParameterStore, InMemorySecretStore};

pub const DATABASE_SECRET_ARN: &str =
    "arn:aws:secretsmanager:eu-west-1:123456789012:secret:developmentDatabaseSecret-RHxIoH";
pub const USER_SECRET_ARN: &str =
    "arn:aws:secretsmanager:eu-west-1:123456789012:secret:SomePassword-AbCdEf";

/// The collaborators of a handler under test, kept around for inspection.
pub struct Harness {
    pub handler: Handler,
    pub connector: Arc<RecordingConnector>,
    pub secrets: Arc<InMemorySecretStore>,
    pub parameters: Arc<InMemoryParameterStore>,
}

pub fn harness(connector: RecordingConnector) -> Harness {
    harness_with_secrets(connector, InMemorySecretStore::new())
}

pub fn harness_with_secrets(
    connector: RecordingConnector,
    secrets: InMemorySecretStore,
) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();

    let connector = Arc::new(connector);
    let secrets = Arc::new(secrets);
    let parameters = Arc::new(InMemoryParameterStore::new().with_parameter("/db/host", "db.internal"));
    let handler = Handler::new(
        connector.clone(),
        secrets.clone(),
        parameters.clone(),
        RuntimeSettings::default(),
    );
    Harness {
        handler,
        connector,
        secrets,
        parameters,
    }
}

/// A PostgreSQL connection with literal credentials.
pub fn postgres_connection() -> ConnectionDescriptor {
    ConnectionDescriptor::host_port(DriverType::Postgresql, "localhost", "app", "admin", "secret")
}

/// A MySQL connection whose password lives in the secrets manager.
pub fn mysql_connection_with_secret_password() -> ConnectionDescriptor {
    ConnectionDescriptor::host_port(
        DriverType::Mysql,
        "development-backend.eu-west-1.rds.amazonaws.com",
        "relevo",
        "relevo_admin",
        format!("{{{{resolve:secretsmanager:{DATABASE_SECRET_ARN}:SecretString:password::}}}}"),
    )
}
