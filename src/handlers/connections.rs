//! Database connection functions. Unlike groups and folders there is
//! no find-or-create here; repeated create calls for the same name are
//! handed to the remote platform as-is.

use serde_json::Value;

use crate::models::Status;
use crate::platform::DbConnection;

use super::event::str_field;
use super::{failure, ok_base, operation_failure, sdk_unavailable, FunctionHandler};

impl FunctionHandler {
    pub(super) async fn create_connection(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let body: DbConnection = match serde_json::from_value(event.clone()) {
            Ok(body) => body,
            Err(e) => {
                return failure(
                    Status::ValidationError,
                    &project_id,
                    "",
                    format!("malformed connection: {e}"),
                );
            }
        };
        if body.name.is_empty() {
            return failure(Status::ValidationError, &project_id, "", "missing connection name");
        }
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        match provisioner.create_connection(&body).await {
            Ok(name) => {
                let mut map = ok_base(&project_id, "");
                map.insert("connectionName".to_string(), Value::String(name));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }

    pub(super) async fn test_connection(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let name = str_field(event, "connectionName");
        if name.is_empty() {
            return failure(Status::ValidationError, &project_id, "", "missing connectionName");
        }
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        match provisioner.test_connection(&name).await {
            Ok(outcome) => {
                let mut map = ok_base(&project_id, "");
                map.insert("connectionName".to_string(), Value::String(name));
                map.insert("success".to_string(), Value::Bool(outcome.success));
                if let Some(status) = outcome.status {
                    map.insert("testStatus".to_string(), Value::String(status));
                }
                if let Some(message) = outcome.message {
                    map.insert("message".to_string(), Value::String(message));
                }
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }

    pub(super) async fn update_connection(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let name = str_field(event, "connectionName");
        if name.is_empty() {
            return failure(Status::ValidationError, &project_id, "", "missing connectionName");
        }
        let Some(updates) = event.get("updates") else {
            return failure(Status::ValidationError, &project_id, "", "missing updates");
        };
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        match provisioner.update_connection(&name, updates).await {
            Ok(name) => {
                let mut map = ok_base(&project_id, "");
                map.insert("connectionName".to_string(), Value::String(name));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }

    pub(super) async fn delete_connection(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let name = str_field(event, "connectionName");
        if name.is_empty() {
            return failure(Status::ValidationError, &project_id, "", "missing connectionName");
        }
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        match provisioner.delete_connection(&name).await {
            Ok(deleted) => {
                let mut map = ok_base(&project_id, "");
                map.insert("connectionName".to_string(), Value::String(name));
                map.insert("deleted".to_string(), Value::Bool(deleted));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }

    pub(super) async fn list_connections(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        match provisioner.list_connections().await {
            Ok(connections) => {
                let mut map = ok_base(&project_id, "");
                let rendered = serde_json::to_value(&connections).unwrap_or_default();
                map.insert("connections".to_string(), rendered);
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }
}
