//! User provisioning. Users are keyed remotely by synthetic id, so there
//! is no find-or-create here; creation is unconditional.

use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::error::ProvisionError;
use crate::platform::CreateUserBody;

use super::Provisioner;

/// One user entry in a bulk-provisioning request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkUserSpec {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_ids: Option<Vec<i64>>,
}

impl Provisioner {
    /// Create a user and optionally assign roles. Returns the user id.
    pub async fn create_user(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        role_ids: Option<&[i64]>,
    ) -> Result<i64, ProvisionError> {
        self.retry
            .run("create_user", || {
                self.create_user_once(email, first_name, last_name, role_ids)
            })
            .await
    }

    async fn create_user_once(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        role_ids: Option<&[i64]>,
    ) -> Result<i64, ProvisionError> {
        let body = CreateUserBody {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        let user = self
            .platform
            .create_user(&body)
            .await
            .map_err(|e| ProvisionError::remote("create_user", e))?;
        let user_id = user
            .id
            .ok_or_else(|| ProvisionError::missing_id("create_user", format!("user {email}")))?;

        if let Some(roles) = role_ids
            && !roles.is_empty()
        {
            self.platform
                .set_user_roles(user_id, roles)
                .await
                .map_err(|e| ProvisionError::remote("set_user_roles", e))?;
        }

        info!(event = "user.create", user_id, email, "created user");
        Ok(user_id)
    }

    /// Provision multiple users sequentially, optionally adding each to
    /// a group. The first failure aborts the run; users created so far
    /// are left in place (fail-forward).
    pub async fn bulk_provision_users(
        &self,
        users: &[BulkUserSpec],
        group_id: Option<i64>,
    ) -> Result<Vec<i64>, ProvisionError> {
        let mut user_ids = Vec::with_capacity(users.len());
        for spec in users {
            let user_id = self
                .create_user(
                    &spec.email,
                    &spec.first_name,
                    &spec.last_name,
                    spec.role_ids.as_deref(),
                )
                .await?;
            user_ids.push(user_id);

            if let Some(group_id) = group_id {
                self.add_user_to_group(group_id, user_id).await?;
            }
        }
        info!(event = "users.bulk_provision", count = user_ids.len(), "bulk provisioned users");
        Ok(user_ids)
    }

    /// Disable a user account (soft delete).
    pub async fn disable_user(&self, user_id: i64) -> Result<bool, ProvisionError> {
        self.retry
            .run("disable_user", || async move {
                self.platform
                    .disable_user(user_id)
                    .await
                    .map_err(|e| ProvisionError::remote("disable_user", e))?;
                info!(event = "user.disable", user_id, "disabled user");
                Ok(true)
            })
            .await
    }

    /// Delete a user account (hard delete).
    pub async fn delete_user(&self, user_id: i64) -> Result<bool, ProvisionError> {
        self.retry
            .run("delete_user", || async move {
                self.platform
                    .delete_user(user_id)
                    .await
                    .map_err(|e| ProvisionError::remote("delete_user", e))?;
                info!(event = "user.delete", user_id, "deleted user");
                Ok(true)
            })
            .await
    }
}
