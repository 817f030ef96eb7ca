//! Group provisioning: find-or-create by name and membership management.
//!
//! Group names are overloaded to store the tenant's group email, so the
//! exact-match name search is the idempotency key. Two concurrent
//! invocations can both observe "not found" and both create; the
//! platform may then hold two groups with the same name. That race is
//! accepted; there is no distributed lock.

use tracing::info;

use crate::error::ProvisionError;

use super::Provisioner;

impl Provisioner {
    /// Find or create a group by email/name. Returns the group id.
    pub async fn ensure_group(&self, group_email: &str) -> Result<i64, ProvisionError> {
        self.retry
            .run("ensure_group", || self.ensure_group_once(group_email))
            .await
    }

    async fn ensure_group_once(&self, group_email: &str) -> Result<i64, ProvisionError> {
        let existing = self
            .platform
            .search_groups(group_email)
            .await
            .map_err(|e| ProvisionError::remote("search_groups", e))?;

        if let Some(group) = existing.first() {
            let group_id = group.id.ok_or_else(|| {
                ProvisionError::missing_id("search_groups", format!("group {group_email}"))
            })?;
            info!(event = "group.reuse", group_email, group_id, "reusing group");
            return Ok(group_id);
        }

        let created = self
            .platform
            .create_group(group_email)
            .await
            .map_err(|e| ProvisionError::remote("create_group", e))?;
        let group_id = created.id.ok_or_else(|| {
            ProvisionError::missing_id("create_group", format!("group {group_email}"))
        })?;
        info!(event = "group.create", group_email, group_id, "created group");
        Ok(group_id)
    }

    /// Add a user to a group. Returns `true` if the user was added,
    /// `false` if already a member (idempotent success, not an error).
    pub async fn add_user_to_group(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<bool, ProvisionError> {
        self.retry
            .run("add_user_to_group", || {
                self.add_user_to_group_once(group_id, user_id)
            })
            .await
    }

    async fn add_user_to_group_once(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<bool, ProvisionError> {
        let members = self
            .platform
            .group_users(group_id)
            .await
            .map_err(|e| ProvisionError::remote("group_users", e))?;
        if members.iter().any(|m| m.id == Some(user_id)) {
            info!(event = "group.user.exists", group_id, user_id, "user already in group");
            return Ok(false);
        }

        self.platform
            .add_group_user(group_id, user_id)
            .await
            .map_err(|e| ProvisionError::remote("add_group_user", e))?;
        info!(event = "group.user.add", group_id, user_id, "added user to group");
        Ok(true)
    }

    /// Remove a user from a group; unconditional.
    pub async fn remove_user_from_group(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<bool, ProvisionError> {
        self.retry
            .run("remove_user_from_group", || async move {
                self.platform
                    .remove_group_user(group_id, user_id)
                    .await
                    .map_err(|e| ProvisionError::remote("remove_group_user", e))?;
                info!(event = "group.user.remove", group_id, user_id, "removed user from group");
                Ok(true)
            })
            .await
    }

    pub async fn delete_group(&self, group_id: i64) -> Result<bool, ProvisionError> {
        self.retry
            .run("delete_group", || async move {
                self.platform
                    .delete_group(group_id)
                    .await
                    .map_err(|e| ProvisionError::remote("delete_group", e))?;
                info!(event = "group.delete", group_id, "deleted group");
                Ok(true)
            })
            .await
    }
}
