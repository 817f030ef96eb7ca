//! LookML-style modeling project operations: create from git, deploy,
//! validate, branch. All passthrough with uniform error wrapping.

use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::error::ProvisionError;
use crate::platform::LookmlProject;

use super::Provisioner;

/// Summarized project validation result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<serde_json::Value>,
    pub warnings: Vec<serde_json::Value>,
}

impl Provisioner {
    /// Create a modeling project from a git repository. Returns the
    /// remote project id.
    pub async fn create_lookml_project(
        &self,
        name: &str,
        git_remote_url: &str,
        git_service_name: &str,
    ) -> Result<String, ProvisionError> {
        self.retry
            .run("create_project", || async move {
                let body = LookmlProject {
                    id: None,
                    name: name.to_string(),
                    git_remote_url: Some(git_remote_url.to_string()),
                    git_service_name: Some(git_service_name.to_string()),
                };
                let project = self
                    .platform
                    .create_project(&body)
                    .await
                    .map_err(|e| ProvisionError::remote("create_project", e))?;
                let project_id = project.id.ok_or_else(|| {
                    ProvisionError::missing_id("create_project", format!("project {name}"))
                })?;
                info!(event = "project.create", project_id, "created modeling project");
                Ok(project_id)
            })
            .await
    }

    pub async fn deploy_project_to_production(
        &self,
        project_id: &str,
    ) -> Result<bool, ProvisionError> {
        self.retry
            .run("deploy_to_production", || async move {
                self.platform
                    .deploy_to_production(project_id)
                    .await
                    .map_err(|e| ProvisionError::remote("deploy_to_production", e))?;
                info!(event = "project.deploy", project_id, "deployed project to production");
                Ok(true)
            })
            .await
    }

    pub async fn validate_lookml_project(
        &self,
        project_id: &str,
    ) -> Result<ValidationOutcome, ProvisionError> {
        self.retry
            .run("validate_project", || async move {
                let result = self
                    .platform
                    .validate_project(project_id)
                    .await
                    .map_err(|e| ProvisionError::remote("validate_project", e))?;
                info!(
                    event = "project.validate",
                    project_id,
                    error_count = result.errors.len(),
                    warning_count = result.warnings.len(),
                    "validated project"
                );
                Ok(ValidationOutcome {
                    valid: result.errors.is_empty(),
                    errors: result.errors,
                    warnings: result.warnings,
                })
            })
            .await
    }

    pub async fn create_git_branch(
        &self,
        project_id: &str,
        branch_name: &str,
    ) -> Result<String, ProvisionError> {
        self.retry
            .run("create_git_branch", || async move {
                self.platform
                    .create_git_branch(project_id, branch_name)
                    .await
                    .map_err(|e| ProvisionError::remote("create_git_branch", e))?;
                info!(
                    event = "project.branch.create",
                    project_id,
                    branch = branch_name,
                    "created git branch"
                );
                Ok(branch_name.to_string())
            })
            .await
    }
}
