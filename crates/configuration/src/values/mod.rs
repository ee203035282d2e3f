//! Scalar values that appear in resource properties.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A TCP port. The orchestrator stringifies scalar properties, so both `5432` and
/// `"5432"` are accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "PortRepr", into = "u16")]
pub struct Port(pub u16);

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub(crate) enum PortRepr {
    Number(u16),
    Text(String),
}

#[derive(Debug, Error)]
#[error("invalid port '{0}', expected a number between 0 and 65535")]
pub struct InvalidPort(String);

impl TryFrom<PortRepr> for Port {
    type Error = InvalidPort;

    fn try_from(value: PortRepr) -> Result<Self, Self::Error> {
        match value {
            PortRepr::Number(port) => Ok(Port(port)),
            PortRepr::Text(text) => text
                .trim()
                .parse()
                .map(Port)
                .map_err(|_| InvalidPort(text)),
        }
    }
}

impl From<Port> for u16 {
    fn from(value: Port) -> Self {
        value.0
    }
}

impl From<u16> for Port {
    fn from(value: u16) -> Self {
        Port(value)
    }
}

impl JsonSchema for Port {
    fn schema_name() -> String {
        "Port".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        PortRepr::json_schema(gen)
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let Port(port) = self;
        write!(f, "{port}")
    }
}

/// A literal value bound to a named statement parameter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum ParameterValue {
    Null,
    Boolean(bool),
    Number(serde_json::Number),
    String(String),
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Boolean(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Number(value.into())
    }
}
