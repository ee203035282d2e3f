//! Database connection settings.

use enum_iterator::Sequence;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::values::Port;

/// The database engines statements can be run against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema, Sequence,
)]
#[serde(rename_all = "lowercase")]
pub enum DriverType {
    Mysql,
    Postgresql,
}

impl std::fmt::Display for DriverType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DriverType::Mysql => write!(f, "mysql"),
            DriverType::Postgresql => write!(f, "postgresql"),
        }
    }
}

/// How to reach the database. Credentials may contain dynamic references; they are
/// resolved right before the connection is opened.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "type")]
pub enum ConnectionDescriptor {
    #[serde(rename = "driverTypeHostPort")]
    DriverTypeHostPort(DriverTypeHostPort),
    #[serde(rename = "jdbcUrl")]
    JdbcUrl(JdbcUrl),
}

/// A connection assembled from a driver type and host coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverTypeHostPort {
    pub driver_type: DriverType,
    pub username: String,
    pub password: String,
    pub database: String,
    pub host: String,
    /// Defaults to the driver's well-known port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,
    /// Appended to the connection URL as query options, in order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, String>,
}

/// A complete `jdbc:<scheme>://host:port/database?options` URL. The driver is picked
/// from the scheme.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JdbcUrl {
    pub jdbc_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ConnectionDescriptor {
    /// Host coordinates for a database reachable under a driver's defaults.
    pub fn host_port(
        driver_type: DriverType,
        host: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        ConnectionDescriptor::DriverTypeHostPort(DriverTypeHostPort {
            driver_type,
            username: username.into(),
            password: password.into(),
            database: database.into(),
            host: host.into(),
            port: None,
            options: IndexMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_driver_type_host_port_with_string_port() {
        let descriptor: ConnectionDescriptor = serde_json::from_str(
            r#"{
                "password": "{{resolve:secretsmanager:arn:aws:secretsmanager:eu-west-1:123456789012:secret:db-RHxIoH:SecretString:password::}}",
                "database": "relevo",
                "port": "3306",
                "host": "development-backend.eu-west-1.rds.amazonaws.com",
                "type": "driverTypeHostPort",
                "driverType": "mysql",
                "username": "relevo_admin"
            }"#,
        )
        .unwrap();

        let ConnectionDescriptor::DriverTypeHostPort(host_port) = descriptor else {
            panic!("expected a driverTypeHostPort connection");
        };
        assert_eq!(host_port.driver_type, DriverType::Mysql);
        assert_eq!(host_port.port, Some(Port(3306)));
        assert!(host_port.options.is_empty());
    }

    #[test]
    fn options_keep_their_order() {
        let descriptor: ConnectionDescriptor = serde_json::from_str(
            r#"{
                "type": "driverTypeHostPort",
                "driverType": "postgresql",
                "username": "u",
                "password": "p",
                "database": "d",
                "host": "h",
                "options": { "sslmode": "require", "application_name": "sql-run" }
            }"#,
        )
        .unwrap();

        let ConnectionDescriptor::DriverTypeHostPort(host_port) = descriptor else {
            panic!("expected a driverTypeHostPort connection");
        };
        let keys: Vec<&str> = host_port.options.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["sslmode", "application_name"]);
    }

    #[test]
    fn decodes_jdbc_url() {
        let descriptor: ConnectionDescriptor = serde_json::from_str(
            r#"{ "type": "jdbcUrl", "jdbcUrl": "jdbc:postgresql://localhost:5432/test" }"#,
        )
        .unwrap();

        assert_eq!(
            descriptor,
            ConnectionDescriptor::JdbcUrl(JdbcUrl {
                jdbc_url: "jdbc:postgresql://localhost:5432/test".to_string(),
                username: None,
                password: None,
            })
        );
    }

    #[test]
    fn rejects_unknown_connection_types() {
        let result = serde_json::from_str::<ConnectionDescriptor>(
            r#"{ "type": "rds", "instance": "db-1" }"#,
        );
        assert!(result.is_err());
    }
}
