//! Request and response DTOs for the function surface.
//!
//! Field names follow the external camelCase contract of the inbound
//! events; the `status` taxonomy is snake_case. Validation happens here,
//! before any remote call is attempted.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lowercase letter, then 4-61 lowercase/digit/hyphen chars, then one
/// lowercase/digit char; 6-63 total.
static PROJECT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]{4,61}[a-z0-9]$").expect("valid pattern"));

/// Terminal status of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    /// Generic failure status used by the single-operation functions.
    Error,
    ValidationError,
    ProvisioningError,
    /// The remote client could not be initialized; no remote call was
    /// attempted.
    SdkUnavailable,
    UnknownError,
    /// CLI argument was not valid JSON.
    InvalidInput,
}

impl Status {
    /// Wire form, matching the serde rename.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Error => "error",
            Status::ValidationError => "validation_error",
            Status::ProvisioningError => "provisioning_error",
            Status::SdkUnavailable => "sdk_unavailable",
            Status::UnknownError => "unknown_error",
            Status::InvalidInput => "invalid_input",
        }
    }
}

/// Validated inbound request for the orchestrated provision workflow.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    pub project_id: String,
    pub group_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestry_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dashboard_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_folder_id: Option<i64>,
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
}

impl ProvisionRequest {
    /// Check field formats; returns the first problem found. Runs before
    /// any remote call so a malformed request never produces partial
    /// remote side effects.
    pub fn validate(&self) -> Result<(), String> {
        if !PROJECT_ID_RE.is_match(&self.project_id) {
            return Err(format!("invalid projectId format: '{}'", self.project_id));
        }
        if !is_valid_email(&self.group_email) {
            return Err(format!("invalid groupEmail: '{}'", self.group_email));
        }
        if let Some(ids) = &self.template_dashboard_ids
            && ids.iter().any(|id| *id <= 0)
        {
            return Err("templateDashboardIds must be positive".to_string());
        }
        if let Some(id) = self.template_folder_id
            && id <= 0
        {
            return Err("templateFolderId must be positive".to_string());
        }
        Ok(())
    }
}

/// Inbound request for the decommission workflow.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecommissionRequest {
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_true")]
    pub archive_folder: bool,
    #[serde(default)]
    pub delete_dashboards: bool,
    #[serde(default)]
    pub delete_schedules: bool,
}

fn default_true() -> bool {
    true
}

/// Successful orchestration output, merged into the response on `ok`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionOutcome {
    pub project_id: String,
    pub group_email: String,
    pub group_id: i64,
    pub folder_id: i64,
    pub dashboard_ids: Vec<i64>,
    pub correlation_id: String,
}

/// Decommission counts and flags. The count keys keep their historical
/// snake_case names; `projectId` stays camelCase like the other DTOs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DecommissionOutcome {
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub archived_folder: bool,
    pub deleted_dashboards: u64,
    pub deleted_schedules: u64,
}

impl DecommissionOutcome {
    pub fn empty(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            archived_folder: false,
            deleted_dashboards: 0,
            deleted_schedules: 0,
        }
    }
}

/// Structured response returned by every invocation, whatever the
/// outcome. Invariant: `projectId` and `groupEmail` are always present
/// (possibly empty), and `error` is present exactly when the status is
/// neither `ok` nor `sdk_unavailable`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResponse {
    pub status: Status,
    pub project_id: String,
    pub group_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub dashboard_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProvisionResponse {
    pub fn ok(outcome: ProvisionOutcome) -> Self {
        Self {
            status: Status::Ok,
            project_id: outcome.project_id,
            group_email: outcome.group_email,
            group_id: Some(outcome.group_id),
            folder_id: Some(outcome.folder_id),
            dashboard_ids: outcome.dashboard_ids,
            correlation_id: Some(outcome.correlation_id),
            error: None,
        }
    }

    pub fn bare(status: Status, project_id: &str, group_email: &str) -> Self {
        Self {
            status,
            project_id: project_id.to_string(),
            group_email: group_email.to_string(),
            group_id: None,
            folder_id: None,
            dashboard_ids: Vec::new(),
            correlation_id: None,
            error: None,
        }
    }

    pub fn failure(status: Status, project_id: &str, group_email: &str, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::bare(status, project_id, group_email)
        }
    }

    pub fn sdk_unavailable(project_id: &str, group_email: &str) -> Self {
        Self::bare(Status::SdkUnavailable, project_id, group_email)
    }
}

/// Basic service information for the root endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub status: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: "ok".to_string(),
        }
    }
}

/// Minimal email shape check: non-empty local part, non-empty dotted
/// domain. The remote platform is the final authority.
pub fn is_valid_email(candidate: &str) -> bool {
    let parts: Vec<&str> = candidate.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(project_id: &str, email: &str) -> ProvisionRequest {
        ProvisionRequest {
            project_id: project_id.to_string(),
            group_email: email.to_string(),
            ancestry_path: None,
            template_dashboard_ids: None,
            template_folder_id: None,
            tokens: BTreeMap::new(),
        }
    }

    #[test]
    fn accepts_well_formed_request() {
        assert!(request("demo-project", "analysts@company.com").validate().is_ok());
    }

    #[test]
    fn rejects_bad_project_ids() {
        for bad in ["", "short", "Uppercase-start", "1numeric-start", "ends-with-hyphen-"] {
            assert!(request(bad, "a@b.co").validate().is_err(), "{bad}");
        }
        // 64 chars exceeds the 63 maximum.
        let too_long = format!("a{}", "b".repeat(63));
        assert!(request(&too_long, "a@b.co").validate().is_err());
    }

    #[test]
    fn rejects_bad_emails() {
        for bad in ["no-at-sign", "@missing-local.com", "missing-domain@", "two@@ats.com", "dotless@domain"] {
            assert!(!is_valid_email(bad), "{bad}");
        }
        assert!(is_valid_email("analysts@company.com"));
    }

    #[test]
    fn rejects_non_positive_template_ids() {
        let mut req = request("demo-project", "analysts@company.com");
        req.template_dashboard_ids = Some(vec![1, 0]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn decommission_defaults() {
        let req: DecommissionRequest =
            serde_json::from_value(json!({ "projectId": "demo-project" })).unwrap();
        assert!(req.archive_folder);
        assert!(!req.delete_dashboards);
        assert!(!req.delete_schedules);
    }

    #[test]
    fn response_serializes_camel_case_status_snake_case() {
        let response = ProvisionResponse::failure(
            Status::ProvisioningError,
            "demo-project",
            "analysts@company.com",
            "create_group failed".to_string(),
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "provisioning_error");
        assert_eq!(value["projectId"], "demo-project");
        assert_eq!(value["groupEmail"], "analysts@company.com");
        assert_eq!(value["error"], "create_group failed");
        assert!(value.get("groupId").is_none());
    }
}
