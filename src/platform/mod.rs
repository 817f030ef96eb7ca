//! Remote resource client for the BI platform's administrative API.
//!
//! [`PlatformApi`] is a capability-oriented interface: pure
//! request/response, no retry and no idempotency logic. Those concerns
//! live one layer up, in [`crate::provisioner`]. Tests substitute an
//! in-memory fake for the trait; production uses [`rest::RestPlatform`].

use async_trait::async_trait;
use thiserror::Error;

pub mod rest;
pub mod types;

pub use rest::RestPlatform;
pub use types::*;

/// Errors surfaced by the remote client. Callers treat every variant as
/// opaque and wrap it uniformly.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform returned status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed platform response: {0}")]
    Decode(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Capability surface of the remote admin API consumed by this system.
///
/// All calls are synchronous request/response from the caller's point of
/// view; any failure is a structured [`PlatformError`].
#[async_trait]
pub trait PlatformApi: Send + Sync {
    // Groups
    async fn search_groups(&self, name: &str) -> PlatformResult<Vec<Group>>;
    async fn create_group(&self, name: &str) -> PlatformResult<Group>;
    async fn delete_group(&self, group_id: i64) -> PlatformResult<()>;
    async fn group_users(&self, group_id: i64) -> PlatformResult<Vec<GroupUser>>;
    async fn add_group_user(&self, group_id: i64, user_id: i64) -> PlatformResult<()>;
    async fn remove_group_user(&self, group_id: i64, user_id: i64) -> PlatformResult<()>;

    // Users
    async fn create_user(&self, body: &CreateUserBody) -> PlatformResult<User>;
    async fn set_user_roles(&self, user_id: i64, role_ids: &[i64]) -> PlatformResult<()>;
    async fn disable_user(&self, user_id: i64) -> PlatformResult<()>;
    async fn delete_user(&self, user_id: i64) -> PlatformResult<()>;

    // Folders
    async fn search_folders(&self, name: &str) -> PlatformResult<Vec<Folder>>;
    async fn create_folder(&self, body: &CreateFolderBody) -> PlatformResult<Folder>;
    async fn rename_folder(&self, folder_id: i64, name: &str) -> PlatformResult<Folder>;

    // Dashboards
    async fn dashboard(&self, dashboard_id: i64) -> PlatformResult<Dashboard>;
    async fn search_dashboards(&self, query: &DashboardQuery) -> PlatformResult<Vec<Dashboard>>;
    async fn copy_dashboard(
        &self,
        dashboard_id: i64,
        body: &CopyDashboardBody,
    ) -> PlatformResult<Dashboard>;
    async fn update_dashboard(
        &self,
        dashboard_id: i64,
        patch: &DashboardPatch,
    ) -> PlatformResult<Dashboard>;
    async fn delete_dashboard(&self, dashboard_id: i64) -> PlatformResult<()>;

    // SAML configuration (singleton)
    async fn saml_config(&self) -> PlatformResult<SamlConfig>;
    async fn update_saml_config(&self, groups: &[SamlGroup]) -> PlatformResult<()>;

    // Scheduled plans
    async fn create_scheduled_plan(&self, plan: &ScheduledPlan) -> PlatformResult<ScheduledPlan>;
    async fn scheduled_plans_for_dashboard(
        &self,
        dashboard_id: i64,
    ) -> PlatformResult<Vec<ScheduledPlan>>;
    async fn delete_scheduled_plan(&self, plan_id: i64) -> PlatformResult<()>;

    // Database connections (keyed by name)
    async fn create_connection(&self, body: &DbConnection) -> PlatformResult<DbConnection>;
    async fn all_connections(&self) -> PlatformResult<Vec<DbConnection>>;
    async fn update_connection(
        &self,
        name: &str,
        patch: &serde_json::Value,
    ) -> PlatformResult<DbConnection>;
    async fn delete_connection(&self, name: &str) -> PlatformResult<()>;
    async fn test_connection(&self, name: &str) -> PlatformResult<ConnectionTestResult>;

    // LookML projects
    async fn create_project(&self, body: &LookmlProject) -> PlatformResult<LookmlProject>;
    async fn deploy_to_production(&self, project_id: &str) -> PlatformResult<()>;
    async fn validate_project(&self, project_id: &str) -> PlatformResult<ProjectValidation>;
    async fn create_git_branch(&self, project_id: &str, branch: &str) -> PlatformResult<()>;
}
