//! Folder, dashboard, and schedule single-operation functions.

use serde_json::Value;

use crate::models::Status;
use crate::provisioner::ScheduledDeliverySpec;
use crate::templates::TokenSubstituter;

use super::event::{i64_field, str_field};
use super::{failure, ok_base, operation_failure, sdk_unavailable, FunctionHandler};

impl FunctionHandler {
    pub(super) async fn create_project_folder(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let group_email = str_field(event, "groupEmail");
        if project_id.is_empty() {
            return failure(Status::ValidationError, "", &group_email, "missing projectId");
        }
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, &group_email);
        };

        let parent_id = i64_field(event, "parentId");
        match provisioner.ensure_project_folder(&project_id, parent_id).await {
            Ok(folder_id) => {
                let mut map = ok_base(&project_id, &group_email);
                map.insert("folderId".to_string(), Value::from(folder_id));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, &group_email, e),
        }
    }

    pub(super) async fn create_dashboard_from_template(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let group_email = str_field(event, "groupEmail");
        let (Some(template_id), Some(folder_id)) = (
            i64_field(event, "templateDashboardId"),
            i64_field(event, "folderId"),
        ) else {
            return failure(
                Status::ValidationError,
                &project_id,
                &group_email,
                "missing templateDashboardId or folderId",
            );
        };
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, &group_email);
        };

        let substituter = event
            .get("tokens")
            .and_then(|raw| serde_json::from_value(raw.clone()).ok())
            .map(TokenSubstituter::new);
        match provisioner
            .clone_dashboard_if_missing(template_id, folder_id, &project_id, substituter.as_ref())
            .await
        {
            Ok(dashboard_id) => {
                let mut map = ok_base(&project_id, &group_email);
                map.insert("dashboardIds".to_string(), Value::from(vec![dashboard_id]));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, &group_email, e),
        }
    }

    pub(super) async fn move_dashboard(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let (Some(dashboard_id), Some(folder_id)) = (
            i64_field(event, "dashboardId"),
            i64_field(event, "folderId"),
        ) else {
            return failure(
                Status::ValidationError,
                &project_id,
                "",
                "missing dashboardId or folderId",
            );
        };
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        match provisioner.move_dashboard(dashboard_id, folder_id).await {
            Ok(_) => {
                let mut map = ok_base(&project_id, "");
                map.insert("dashboardIds".to_string(), Value::from(vec![dashboard_id]));
                map.insert("folderId".to_string(), Value::from(folder_id));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }

    pub(super) async fn create_scheduled_delivery(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let spec: ScheduledDeliverySpec = match serde_json::from_value(event.clone()) {
            Ok(spec) => spec,
            Err(e) => {
                return failure(
                    Status::ValidationError,
                    &project_id,
                    "",
                    format!("malformed delivery spec: {e}"),
                );
            }
        };
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        match provisioner.create_scheduled_plan(&spec).await {
            Ok(plan_id) => {
                let mut map = ok_base(&project_id, "");
                map.insert("scheduledPlanId".to_string(), Value::from(plan_id));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }
}
