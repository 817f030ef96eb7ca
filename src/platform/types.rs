//! Remote entity models for the BI platform's admin API.
//!
//! All entities are owned by the remote platform; these structs are just
//! wire shapes. Identifiers are optional because the platform's create
//! responses are not trusted to include them; callers must check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user group; `name` is overloaded to store the tenant's group email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

/// A user's membership record inside a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserBody {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// A content folder. Project folders follow the `"Project: {projectId}"`
/// naming convention; archived ones are renamed to `"Archived: {name}"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderBody {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Search filter for dashboards; exactly one of the fields is set per
/// query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
}

impl DashboardQuery {
    pub fn by_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            folder_id: None,
        }
    }

    pub fn in_folder(folder_id: i64) -> Self {
        Self {
            title: None,
            folder_id: Some(folder_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyDashboardBody {
    pub name: String,
    pub folder_id: i64,
}

/// Partial dashboard update; only set fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The singleton SAML configuration's group-mapping list. Updates write
/// the full list back, not a delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamlConfig {
    #[serde(default)]
    pub groups: Vec<SamlGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamlGroup {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub dashboard_id: i64,
    pub crontab: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub scheduled_plan_destination: Vec<ScheduledPlanDestination>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPlanDestination {
    pub format: String,
    #[serde(rename = "type")]
    pub destination_type: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// A database connection; the remote side keys these by `name`, not by a
/// synthetic id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConnection {
    pub name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub dialect_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_json: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A LookML-style modeling project backed by a git repository. Remote
/// project ids are strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookmlProject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_remote_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_service_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectValidation {
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    #[serde(default)]
    pub warnings: Vec<serde_json::Value>,
}
