//! Function entrypoints, shared by the HTTP routes and the `invoke` CLI.
//!
//! Every handler returns a well-formed JSON response with a `status`
//! field; remote failures never escape as a transport error. The
//! response always carries `projectId` and `groupEmail` (possibly
//! empty), and `error` exactly when the status is a failure other than
//! `sdk_unavailable`.

mod connections;
mod content;
pub mod event;
mod groups;
mod lookml;
mod provision;
mod users;

use std::sync::Arc;

use axum::response::Json;
use serde_json::{Map, Value};

use crate::config::AppConfig;
use crate::error::ProvisionError;
use crate::models::{ServiceInfo, Status};
use crate::provisioner::Provisioner;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Shared handler state. `provisioner` is `None` when the remote client
/// could not be initialized at startup; every function then answers
/// `sdk_unavailable` without attempting a remote call.
pub struct FunctionHandler {
    provisioner: Option<Arc<Provisioner>>,
    default_template_dashboard_ids: Vec<i64>,
    default_template_folder_id: Option<i64>,
}

impl FunctionHandler {
    pub fn new(provisioner: Option<Arc<Provisioner>>, config: &AppConfig) -> Self {
        Self {
            provisioner,
            default_template_dashboard_ids: config.default_template_dashboard_ids.clone(),
            default_template_folder_id: config.default_template_folder_id,
        }
    }

    fn provisioner(&self) -> Option<&Arc<Provisioner>> {
        self.provisioner.as_ref()
    }

    /// Route a logical function name to its handler. The raw event is
    /// envelope-decoded first; a bad envelope is a validation error no
    /// matter which function was addressed.
    pub async fn dispatch(&self, function: &str, raw_event: &Value) -> Value {
        let event = match event::decode_envelope(raw_event) {
            Ok(event) => event,
            Err(message) => return failure(Status::ValidationError, "", "", message),
        };
        match function {
            "provision" => self.provision(&event).await,
            "decommission" => self.decommission(&event).await,
            "add-group-to-saml" => self.add_group_to_saml(&event).await,
            "add-user-to-group" => self.add_user_to_group(&event).await,
            "create-user" => self.create_user(&event).await,
            "bulk-provision-users" => self.bulk_provision_users(&event).await,
            "create-project-folder" => self.create_project_folder(&event).await,
            "create-dashboard-from-template" => self.create_dashboard_from_template(&event).await,
            "move-dashboard" => self.move_dashboard(&event).await,
            "create-scheduled-delivery" => self.create_scheduled_delivery(&event).await,
            "connections/create" => self.create_connection(&event).await,
            "connections/test" => self.test_connection(&event).await,
            "connections/update" => self.update_connection(&event).await,
            "connections/delete" => self.delete_connection(&event).await,
            "connections/list" => self.list_connections(&event).await,
            "lookml/create" => self.create_lookml_project(&event).await,
            "lookml/deploy" => self.deploy_lookml_project(&event).await,
            "lookml/validate" => self.validate_lookml_project(&event).await,
            "lookml/create-branch" => self.create_lookml_branch(&event).await,
            other => failure(
                Status::ValidationError,
                "",
                "",
                format!("unknown function: {other}"),
            ),
        }
    }
}

/// Response skeleton every handler builds on.
pub(crate) fn response_base(status: Status, project_id: &str, group_email: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("status".to_string(), Value::String(status.as_str().to_string()));
    map.insert("projectId".to_string(), Value::String(project_id.to_string()));
    map.insert("groupEmail".to_string(), Value::String(group_email.to_string()));
    map
}

pub(crate) fn ok_base(project_id: &str, group_email: &str) -> Map<String, Value> {
    response_base(Status::Ok, project_id, group_email)
}

pub(crate) fn failure(
    status: Status,
    project_id: &str,
    group_email: &str,
    error: impl Into<String>,
) -> Value {
    let mut map = response_base(status, project_id, group_email);
    map.insert("error".to_string(), Value::String(error.into()));
    Value::Object(map)
}

pub(crate) fn sdk_unavailable(project_id: &str, group_email: &str) -> Value {
    Value::Object(response_base(Status::SdkUnavailable, project_id, group_email))
}

/// Map an operation error to the single-operation failure statuses.
/// The orchestrated provision path maps `Provisioning` to its own
/// status in `provision.rs` instead of going through here.
pub(crate) fn operation_failure(project_id: &str, group_email: &str, error: ProvisionError) -> Value {
    let status = match &error {
        ProvisionError::Validation(_) => Status::ValidationError,
        ProvisionError::Provisioning { .. } => Status::Error,
    };
    failure(status, project_id, group_email, error.to_string())
}
