//! Database connection management: direct passthrough, keyed by name on
//! the remote side.
//!
//! Unlike groups/folders/dashboards there is NO find-or-create wrapper
//! here; calling create twice with the same name is the remote
//! platform's problem. Callers that need deduplication must check
//! [`Provisioner::list_connections`] first.

use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::error::ProvisionError;
use crate::platform::DbConnection;

use super::Provisioner;

/// Slimmed listing row for `list_connections`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectionSummary {
    pub name: String,
    pub dialect: String,
    pub host: String,
}

/// Result of a remote connection test.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectionTestOutcome {
    pub status: Option<String>,
    pub message: Option<String>,
    pub success: bool,
}

impl Provisioner {
    /// Create a database connection. Returns the connection name (the
    /// remote primary key).
    pub async fn create_connection(&self, body: &DbConnection) -> Result<String, ProvisionError> {
        self.retry
            .run("create_connection", || async move {
                let created = self
                    .platform
                    .create_connection(body)
                    .await
                    .map_err(|e| ProvisionError::remote("create_connection", e))?;
                info!(
                    event = "connection.create",
                    connection_name = %created.name,
                    "created connection"
                );
                Ok(created.name)
            })
            .await
    }

    pub async fn test_connection(
        &self,
        connection_name: &str,
    ) -> Result<ConnectionTestOutcome, ProvisionError> {
        self.retry
            .run("test_connection", || async move {
                let result = self
                    .platform
                    .test_connection(connection_name)
                    .await
                    .map_err(|e| ProvisionError::remote("test_connection", e))?;
                info!(
                    event = "connection.test",
                    connection_name,
                    status = result.status.as_deref().unwrap_or(""),
                    "tested connection"
                );
                let success = result.status.as_deref() == Some("success");
                Ok(ConnectionTestOutcome {
                    status: result.status,
                    message: result.message,
                    success,
                })
            })
            .await
    }

    pub async fn update_connection(
        &self,
        connection_name: &str,
        updates: &serde_json::Value,
    ) -> Result<String, ProvisionError> {
        self.retry
            .run("update_connection", || async move {
                self.platform
                    .update_connection(connection_name, updates)
                    .await
                    .map_err(|e| ProvisionError::remote("update_connection", e))?;
                info!(event = "connection.update", connection_name, "updated connection");
                Ok(connection_name.to_string())
            })
            .await
    }

    pub async fn delete_connection(&self, connection_name: &str) -> Result<bool, ProvisionError> {
        self.retry
            .run("delete_connection", || async move {
                self.platform
                    .delete_connection(connection_name)
                    .await
                    .map_err(|e| ProvisionError::remote("delete_connection", e))?;
                info!(event = "connection.delete", connection_name, "deleted connection");
                Ok(true)
            })
            .await
    }

    pub async fn list_connections(&self) -> Result<Vec<ConnectionSummary>, ProvisionError> {
        self.retry
            .run("all_connections", || async move {
                let connections = self
                    .platform
                    .all_connections()
                    .await
                    .map_err(|e| ProvisionError::remote("all_connections", e))?;
                Ok(connections
                    .into_iter()
                    .map(|c| ConnectionSummary {
                        name: c.name,
                        dialect: c.dialect_name,
                        host: c.host,
                    })
                    .collect())
            })
            .await
    }
}
