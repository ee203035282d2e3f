//! Lifecycle events, in their wire form.

use serde_json::json;
use sql_run_configuration::{ConnectionDescriptor, ResourceProperties, SqlStatement};

pub const SERVICE_TOKEN: &str = "test.serviceToken";
pub const RESPONSE_URL: &str = "test.responseURL";
pub const STACK_ID: &str = "test.stackId";
pub const REQUEST_ID: &str = "test.requestId";
pub const LOGICAL_RESOURCE_ID: &str = "test.logicalResourceId";
pub const RESOURCE_TYPE: &str = "test.resourceType";

/// Resource properties running `up` on create and `down` on delete.
pub fn properties(
    connection: ConnectionDescriptor,
    up: Vec<SqlStatement>,
    down: Option<Vec<SqlStatement>>,
) -> ResourceProperties {
    ResourceProperties {
        service_token: Some(SERVICE_TOKEN.to_string()),
        connection,
        up: up.into(),
        down: down.map(Into::into),
    }
}

fn event(request_type: &str, properties: &ResourceProperties) -> serde_json::Value {
    json!({
        "RequestType": request_type,
        "ServiceToken": SERVICE_TOKEN,
        "ResponseURL": RESPONSE_URL,
        "StackId": STACK_ID,
        "RequestId": REQUEST_ID,
        "LogicalResourceId": LOGICAL_RESOURCE_ID,
        "ResourceType": RESOURCE_TYPE,
        "ResourceProperties": properties,
    })
}

pub fn create_event(properties: &ResourceProperties) -> serde_json::Value {
    event("Create", properties)
}

pub fn update_event(
    physical_resource_id: &str,
    properties: &ResourceProperties,
    old_properties: &ResourceProperties,
) -> serde_json::Value {
    let mut event = event("Update", properties);
    event["PhysicalResourceId"] = json!(physical_resource_id);
    event["OldResourceProperties"] = json!(old_properties);
    event
}

pub fn delete_event(
    physical_resource_id: &str,
    properties: &ResourceProperties,
) -> serde_json::Value {
    let mut event = event("Delete", properties);
    event["PhysicalResourceId"] = json!(physical_resource_id);
    event
}
