//! Custom resource lifecycle events, as sent by the orchestrator.

use serde::{Deserialize, Serialize};
use sql_run_configuration::ResourceProperties;

/// One lifecycle event. Unknown `RequestType`s fail to decode.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "RequestType")]
pub enum LifecycleEvent {
    Create(CreateEvent),
    Update(UpdateEvent),
    Delete(DeleteEvent),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CreateEvent {
    #[serde(flatten)]
    pub common: EventCommon,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    pub physical_resource_id: String,
    pub old_resource_properties: ResourceProperties,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    pub physical_resource_id: String,
}

/// Fields every lifecycle event carries.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventCommon {
    pub service_token: String,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub resource_type: String,
    pub resource_properties: ResourceProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RequestType::Create => write!(f, "Create"),
            RequestType::Update => write!(f, "Update"),
            RequestType::Delete => write!(f, "Delete"),
        }
    }
}

impl LifecycleEvent {
    pub fn common(&self) -> &EventCommon {
        match self {
            LifecycleEvent::Create(CreateEvent { common })
            | LifecycleEvent::Update(UpdateEvent { common, .. })
            | LifecycleEvent::Delete(DeleteEvent { common, .. }) => common,
        }
    }

    pub fn request_type(&self) -> RequestType {
        match self {
            LifecycleEvent::Create(_) => RequestType::Create,
            LifecycleEvent::Update(_) => RequestType::Update,
            LifecycleEvent::Delete(_) => RequestType::Delete,
        }
    }

    /// The properties the resource has after this event.
    pub fn resource_properties(&self) -> &ResourceProperties {
        &self.common().resource_properties
    }

    /// The id assigned by a previous create, if this event refers to one.
    pub fn physical_resource_id(&self) -> Option<&str> {
        match self {
            LifecycleEvent::Create(_) => None,
            LifecycleEvent::Update(UpdateEvent {
                physical_resource_id,
                ..
            })
            | LifecycleEvent::Delete(DeleteEvent {
                physical_resource_id,
                ..
            }) => Some(physical_resource_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use sql_run_configuration::{ConnectionDescriptor, DriverType, ParameterValue, Port};

    use super::*;

    const CREATE_EVENT: &str = r#"{
        "RequestType": "Create",
        "ServiceToken": "arn:aws:lambda:eu-west-1:123456789012:function:SqlRunExample-Provider",
        "ResponseURL": "https://cloudformation-custom-resource-response-euwest1.s3-eu-west-1.amazonaws.com/response",
        "StackId": "arn:aws:cloudformation:eu-west-1:123456789012:stack/SqlRunExample/guid",
        "RequestId": "122848b4-eccc-4146-8826-94db7e940bb2",
        "LogicalResourceId": "CreateDatabaseUser582E230D",
        "ResourceType": "Custom::SqlRun",
        "ResourceProperties": {
            "ServiceToken": "arn:aws:lambda:eu-west-1:123456789012:function:SqlRunExample-Provider",
            "connection": {
                "password": "{{resolve:secretsmanager:arn:aws:secretsmanager:eu-west-1:123456789012:secret:developmentDatabaseSecret-RHxIoH:SecretString:password::}}",
                "database": "relevo",
                "port": "3306",
                "host": "development-backend.eu-west-1.rds.amazonaws.com",
                "type": "driverTypeHostPort",
                "driverType": "mysql",
                "username": "relevo_admin"
            },
            "up": {
                "run": [
                    {
                        "parameters": {
                            "password": "{{resolve:secretsmanager:arn:aws:secretsmanager:eu-west-1:123456789012:secret:SomePassword-AbCdEf:SecretString:::}}"
                        },
                        "sql": "CREATE USER 'myDatabaseUser'@'%' IDENTIFIED BY :password"
                    }
                ]
            },
            "down": {
                "run": [
                    { "sql": "DROP USER 'myDatabaseUser'@'%'" }
                ]
            }
        }
    }"#;

    #[test]
    fn decodes_create_event() {
        let event: LifecycleEvent = serde_json::from_str(CREATE_EVENT).unwrap();

        assert_eq!(event.request_type(), RequestType::Create);
        assert_eq!(event.physical_resource_id(), None);
        let properties = event.resource_properties();
        assert_eq!(properties.up.run.len(), 1);
        assert!(matches!(
            properties.up.run[0]
                .parameters
                .as_ref()
                .and_then(|parameters| parameters.get("password")),
            Some(ParameterValue::String(_))
        ));
        assert_eq!(properties.down.as_ref().map(|down| down.run.len()), Some(1));
        let ConnectionDescriptor::DriverTypeHostPort(connection) = &properties.connection else {
            panic!("expected a driverTypeHostPort connection");
        };
        assert_eq!(connection.driver_type, DriverType::Mysql);
        assert_eq!(connection.port, Some(Port(3306)));
    }

    #[test]
    fn decodes_update_event() {
        let mut raw: serde_json::Value = serde_json::from_str(CREATE_EVENT).unwrap();
        raw["RequestType"] = "Update".into();
        raw["PhysicalResourceId"] = "5c8e5a8e-0f9f-4d43-a0b8-0b0f9ad52b9c".into();
        raw["OldResourceProperties"] = raw["ResourceProperties"].clone();

        let event: LifecycleEvent = serde_json::from_value(raw).unwrap();

        assert_eq!(event.request_type(), RequestType::Update);
        assert_eq!(
            event.physical_resource_id(),
            Some("5c8e5a8e-0f9f-4d43-a0b8-0b0f9ad52b9c")
        );
    }

    #[test]
    fn update_requires_old_properties() {
        let mut raw: serde_json::Value = serde_json::from_str(CREATE_EVENT).unwrap();
        raw["RequestType"] = "Update".into();
        raw["PhysicalResourceId"] = "id".into();

        assert!(serde_json::from_value::<LifecycleEvent>(raw).is_err());
    }

    #[test]
    fn rejects_unknown_request_types() {
        let mut raw: serde_json::Value = serde_json::from_str(CREATE_EVENT).unwrap();
        raw["RequestType"] = "Replace".into();

        assert!(serde_json::from_value::<LifecycleEvent>(raw).is_err());
    }
}
