//! Project folder provisioning with the `"Project: {projectId}"` naming
//! convention. The exact-match name search is the idempotency key.

use tracing::info;

use crate::error::ProvisionError;
use crate::platform::CreateFolderBody;

use super::Provisioner;

/// Folder naming convention for a tenant project.
pub fn project_folder_name(project_id: &str) -> String {
    format!("Project: {project_id}")
}

/// Name of a folder after decommission archival. The rename is not
/// reversible by this system.
pub fn archived_folder_name(original: &str) -> String {
    format!("Archived: {original}")
}

impl Provisioner {
    /// Find or create the project folder. Returns the folder id. The
    /// create body carries `parent_id` only when supplied.
    pub async fn ensure_project_folder(
        &self,
        project_id: &str,
        parent_id: Option<i64>,
    ) -> Result<i64, ProvisionError> {
        self.retry
            .run("ensure_project_folder", || {
                self.ensure_project_folder_once(project_id, parent_id)
            })
            .await
    }

    async fn ensure_project_folder_once(
        &self,
        project_id: &str,
        parent_id: Option<i64>,
    ) -> Result<i64, ProvisionError> {
        let folder_name = project_folder_name(project_id);
        let existing = self
            .platform
            .search_folders(&folder_name)
            .await
            .map_err(|e| ProvisionError::remote("search_folders", e))?;

        if let Some(folder) = existing.first() {
            let folder_id = folder.id.ok_or_else(|| {
                ProvisionError::missing_id("search_folders", format!("folder {folder_name}"))
            })?;
            info!(event = "folder.reuse", folder_id, "reusing folder");
            return Ok(folder_id);
        }

        let body = CreateFolderBody {
            name: folder_name.clone(),
            parent_id,
        };
        let created = self
            .platform
            .create_folder(&body)
            .await
            .map_err(|e| ProvisionError::remote("create_folder", e))?;
        let folder_id = created.id.ok_or_else(|| {
            ProvisionError::missing_id("create_folder", format!("folder {folder_name}"))
        })?;
        info!(event = "folder.create", folder_id, "created folder");
        Ok(folder_id)
    }
}
