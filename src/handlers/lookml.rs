//! Modeling project functions.

use serde_json::Value;

use crate::models::Status;

use super::event::str_field;
use super::{failure, ok_base, operation_failure, sdk_unavailable, FunctionHandler};

impl FunctionHandler {
    pub(super) async fn create_lookml_project(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let name = str_field(event, "name");
        if name.is_empty() {
            return failure(Status::ValidationError, &project_id, "", "missing name");
        }
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        let git_remote_url = str_field(event, "gitRemoteUrl");
        let git_service_name = str_field(event, "gitServiceName");
        match provisioner
            .create_lookml_project(&name, &git_remote_url, &git_service_name)
            .await
        {
            Ok(lookml_project_id) => {
                let mut map = ok_base(&project_id, "");
                map.insert("lookmlProjectId".to_string(), Value::String(lookml_project_id));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }

    pub(super) async fn deploy_lookml_project(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let lookml_project_id = str_field(event, "lookmlProjectId");
        if lookml_project_id.is_empty() {
            return failure(Status::ValidationError, &project_id, "", "missing lookmlProjectId");
        }
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        match provisioner.deploy_project_to_production(&lookml_project_id).await {
            Ok(_) => {
                let mut map = ok_base(&project_id, "");
                map.insert("lookmlProjectId".to_string(), Value::String(lookml_project_id));
                map.insert("deployed".to_string(), Value::Bool(true));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }

    pub(super) async fn validate_lookml_project(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let lookml_project_id = str_field(event, "lookmlProjectId");
        if lookml_project_id.is_empty() {
            return failure(Status::ValidationError, &project_id, "", "missing lookmlProjectId");
        }
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        match provisioner.validate_lookml_project(&lookml_project_id).await {
            Ok(outcome) => {
                let mut map = ok_base(&project_id, "");
                map.insert("lookmlProjectId".to_string(), Value::String(lookml_project_id));
                map.insert("valid".to_string(), Value::Bool(outcome.valid));
                map.insert("errors".to_string(), Value::Array(outcome.errors));
                map.insert("warnings".to_string(), Value::Array(outcome.warnings));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }

    pub(super) async fn create_lookml_branch(&self, event: &Value) -> Value {
        let project_id = str_field(event, "projectId");
        let lookml_project_id = str_field(event, "lookmlProjectId");
        let branch_name = str_field(event, "branchName");
        if lookml_project_id.is_empty() || branch_name.is_empty() {
            return failure(
                Status::ValidationError,
                &project_id,
                "",
                "missing lookmlProjectId or branchName",
            );
        }
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&project_id, "");
        };

        match provisioner.create_git_branch(&lookml_project_id, &branch_name).await {
            Ok(branch) => {
                let mut map = ok_base(&project_id, "");
                map.insert("lookmlProjectId".to_string(), Value::String(lookml_project_id));
                map.insert("branchName".to_string(), Value::String(branch));
                Value::Object(map)
            }
            Err(e) => operation_failure(&project_id, "", e),
        }
    }
}
