//! User-scoped single-operation functions.

use serde_json::Value;

use crate::models::Status;
use crate::provisioner::BulkUserSpec;

use super::event::{i64_field, str_field};
use super::{failure, ok_base, operation_failure, sdk_unavailable, FunctionHandler};

impl FunctionHandler {
    pub(super) async fn create_user(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let email = str_field(event, "email");
        if email.is_empty() {
            return failure(Status::ValidationError, &project_id, "", "missing email");
        }
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        let first_name = str_field(event, "firstName");
        let last_name = str_field(event, "lastName");
        let role_ids: Option<Vec<i64>> = event
            .get("roleIds")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_i64).collect());

        match provisioner
            .create_user(&email, &first_name, &last_name, role_ids.as_deref())
            .await
        {
            Ok(user_id) => {
                let mut map = ok_base(&project_id, "");
                map.insert("userId".to_string(), Value::from(user_id));
                map.insert("email".to_string(), Value::String(email));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }

    pub(super) async fn bulk_provision_users(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let group_email = str_field(event, "groupEmail");
        let users: Vec<BulkUserSpec> = match event.get("users") {
            Some(raw) => match serde_json::from_value(raw.clone()) {
                Ok(users) => users,
                Err(e) => {
                    return failure(
                        Status::ValidationError,
                        &project_id,
                        &group_email,
                        format!("malformed users list: {e}"),
                    );
                }
            },
            None => {
                return failure(
                    Status::ValidationError,
                    &project_id,
                    &group_email,
                    "missing users list",
                );
            }
        };
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, &group_email);
        };

        let group_id = i64_field(event, "groupId");
        match provisioner.bulk_provision_users(&users, group_id).await {
            Ok(user_ids) => {
                let mut map = ok_base(&project_id, &group_email);
                map.insert("userIds".to_string(), Value::from(user_ids));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, &group_email, e),
        }
    }
}
