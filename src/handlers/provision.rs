//! The two orchestrated entrypoints: provision and decommission.
//!
//! Unlike the single-operation functions these run inside a spawned
//! task so that a panic anywhere below surfaces as `unknown_error`
//! instead of tearing down the invocation.

use std::sync::Arc;

use serde_json::Value;
use tracing::error;

use crate::error::ProvisionError;
use crate::models::{
    DecommissionRequest, ProvisionRequest, ProvisionResponse, Status,
};

use super::event::str_field;
use super::{failure, ok_base, sdk_unavailable, FunctionHandler};

fn render(response: &ProvisionResponse) -> Value {
    serde_json::to_value(response).unwrap_or_else(|e| {
        failure(
            Status::UnknownError,
            &response.project_id,
            &response.group_email,
            format!("response serialization failed: {e}"),
        )
    })
}

impl FunctionHandler {
    pub(super) async fn provision(&self, event: &Value) -> Value {
        // Echo whatever identifiers the raw event carries even when it
        // fails to parse into the typed request.
        let echo_project = str_field(event, "projectId");
        let echo_email = str_field(event, "groupEmail");

        let request: ProvisionRequest = match serde_json::from_value(event.clone()) {
            Ok(request) => request,
            Err(e) => {
                return render(&ProvisionResponse::failure(
                    Status::ValidationError,
                    &echo_project,
                    &echo_email,
                    format!("malformed request: {e}"),
                ));
            }
        };
        if let Err(message) = request.validate() {
            return render(&ProvisionResponse::failure(
                Status::ValidationError,
                &request.project_id,
                &request.group_email,
                message,
            ));
        }
        let Some(provisioner) = self.provisioner() else {
            return render(&ProvisionResponse::sdk_unavailable(
                &request.project_id,
                &request.group_email,
            ));
        };

        let template_ids = match self.resolve_template_ids(provisioner, &request).await {
            Ok(ids) => ids,
            Err(e) => {
                return render(&ProvisionResponse::failure(
                    Status::ProvisioningError,
                    &request.project_id,
                    &request.group_email,
                    e.to_string(),
                ));
            }
        };

        let provisioner = Arc::clone(provisioner);
        let project_id = request.project_id.clone();
        let group_email = request.group_email.clone();
        let tokens = request.tokens.clone();
        let task = tokio::spawn(async move {
            provisioner
                .provision(&project_id, &group_email, &template_ids, &tokens)
                .await
        });
        let response = match task.await {
            Ok(Ok(outcome)) => ProvisionResponse::ok(outcome),
            Ok(Err(ProvisionError::Validation(message))) => ProvisionResponse::failure(
                Status::ValidationError,
                &request.project_id,
                &request.group_email,
                format!("validation failed: {message}"),
            ),
            Ok(Err(e @ ProvisionError::Provisioning { .. })) => ProvisionResponse::failure(
                Status::ProvisioningError,
                &request.project_id,
                &request.group_email,
                e.to_string(),
            ),
            Err(join_error) => {
                error!(
                    event = "provision.panic",
                    project_id = %request.project_id,
                    error = %join_error,
                    "provision task aborted"
                );
                ProvisionResponse::failure(
                    Status::UnknownError,
                    &request.project_id,
                    &request.group_email,
                    "internal error".to_string(),
                )
            }
        };
        render(&response)
    }

    /// Template dashboard ids. Anything named on the request wins over
    /// the configured defaults: explicit ids first, then the request's
    /// template folder, then the configured id list, then the
    /// configured folder.
    async fn resolve_template_ids(
        &self,
        provisioner: &Arc<crate::provisioner::Provisioner>,
        request: &ProvisionRequest,
    ) -> Result<Vec<i64>, ProvisionError> {
        if let Some(ids) = &request.template_dashboard_ids {
            return Ok(ids.clone());
        }
        if let Some(folder_id) = request.template_folder_id {
            return provisioner.template_dashboard_ids_in_folder(folder_id).await;
        }
        if !self.default_template_dashboard_ids.is_empty() {
            return Ok(self.default_template_dashboard_ids.clone());
        }
        if let Some(folder_id) = self.default_template_folder_id {
            return provisioner.template_dashboard_ids_in_folder(folder_id).await;
        }
        Ok(Vec::new())
    }

    pub(super) async fn decommission(&self, event: &Value) -> Value {
        let echo_project = str_field(event, "projectId");
        let request: DecommissionRequest = match serde_json::from_value(event.clone()) {
            Ok(request) => request,
            Err(e) => {
                return failure(
                    Status::ValidationError,
                    &echo_project,
                    "",
                    format!("malformed request: {e}"),
                );
            }
        };
        if request.project_id.is_empty() {
            return failure(Status::ValidationError, "", "", "missing projectId");
        }
        let Some(provisioner) = self.provisioner() else {
            return sdk_unavailable(&request.project_id, "");
        };

        let provisioner = Arc::clone(provisioner);
        let req = request.clone();
        let task = tokio::spawn(async move {
            provisioner
                .decommission_project(
                    &req.project_id,
                    req.archive_folder,
                    req.delete_dashboards,
                    req.delete_schedules,
                )
                .await
        });
        match task.await {
            Ok(Ok(outcome)) => {
                let mut map = ok_base(&outcome.project_id, "");
                map.insert("archived_folder".to_string(), Value::Bool(outcome.archived_folder));
                map.insert(
                    "deleted_dashboards".to_string(),
                    Value::from(outcome.deleted_dashboards),
                );
                map.insert(
                    "deleted_schedules".to_string(),
                    Value::from(outcome.deleted_schedules),
                );
                Value::Object(map)
            }
            Ok(Err(ProvisionError::Validation(message))) => failure(
                Status::ValidationError,
                &request.project_id,
                "",
                format!("validation failed: {message}"),
            ),
            Ok(Err(e @ ProvisionError::Provisioning { .. })) => {
                failure(Status::ProvisioningError, &request.project_id, "", e.to_string())
            }
            Err(join_error) => {
                error!(
                    event = "decommission.panic",
                    project_id = %request.project_id,
                    error = %join_error,
                    "decommission task aborted"
                );
                failure(Status::UnknownError, &request.project_id, "", "internal error")
            }
        }
    }
}
