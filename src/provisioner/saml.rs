//! SAML group-mapping maintenance on the singleton SAML configuration.
//!
//! Idempotency is by name membership in the configuration's group list.
//! Updates are append-only read-modify-write of the FULL list: two
//! concurrent invocations can both read the same list and the second
//! write clobbers the first's append. Known lost-update hazard; there is
//! no locking here.

use tracing::info;

use crate::error::ProvisionError;
use crate::platform::SamlGroup;

use super::Provisioner;

impl Provisioner {
    /// Add a group to the SAML configuration unless already mapped.
    pub async fn ensure_saml_group_mapping(
        &self,
        group_id: i64,
        group_email: &str,
    ) -> Result<(), ProvisionError> {
        self.retry
            .run("ensure_saml_group_mapping", || {
                self.ensure_saml_group_mapping_once(group_id, group_email)
            })
            .await
    }

    async fn ensure_saml_group_mapping_once(
        &self,
        group_id: i64,
        group_email: &str,
    ) -> Result<(), ProvisionError> {
        let config = self
            .platform
            .saml_config()
            .await
            .map_err(|e| ProvisionError::remote("saml_config", e))?;

        if config.groups.iter().any(|g| g.name == group_email) {
            info!(event = "saml.group.reuse", group_email, "reusing SAML mapping");
            return Ok(());
        }

        let mut groups = config.groups;
        groups.push(SamlGroup {
            name: group_email.to_string(),
            id: Some(group_id),
        });
        self.platform
            .update_saml_config(&groups)
            .await
            .map_err(|e| ProvisionError::remote("update_saml_config", e))?;
        info!(event = "saml.group.add", group_email, "added SAML group mapping");
        Ok(())
    }
}
