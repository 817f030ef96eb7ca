//! Group-scoped single-operation functions.

use serde_json::Value;

use crate::models::Status;

use super::event::{i64_field, str_field};
use super::{failure, ok_base, operation_failure, sdk_unavailable, FunctionHandler};

impl FunctionHandler {
    /// Ensure the group exists and is mapped in the SAML configuration.
    pub(super) async fn add_group_to_saml(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let group_email = str_field(event, "groupEmail");
        if group_email.is_empty() {
            return failure(Status::ValidationError, &project_id, "", "missing groupEmail");
        }
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, &group_email);
        };

        let group_id = match provisioner.ensure_group(&group_email).await {
            Ok(id) => id,
            Err(e) => return operation_failure(&project_id, &group_email, e),
        };
        if let Err(e) = provisioner.ensure_saml_group_mapping(group_id, &group_email).await {
            return operation_failure(&project_id, &group_email, e);
        }
        let mut map = ok_base(&project_id, &group_email);
        map.insert("groupId".to_string(), Value::from(group_id));
        Value::Object(map)
    }

    pub(super) async fn add_user_to_group(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let group_email = str_field(event, "groupEmail");
        let (Some(group_id), Some(user_id)) =
            (i64_field(event, "groupId"), i64_field(event, "userId"))
        else {
            return failure(
                Status::ValidationError,
                &project_id,
                &group_email,
                "missing groupId or userId",
            );
        };
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, &group_email);
        };

        match provisioner.add_user_to_group(group_id, user_id).await {
            Ok(added) => {
                let mut map = ok_base(&project_id, &group_email);
                map.insert("groupId".to_string(), Value::from(group_id));
                map.insert("userId".to_string(), Value::from(user_id));
                map.insert("added".to_string(), Value::Bool(added));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, &group_email, e),
        }
    }
}
