//! Dashboard cloning and content management.
//!
//! A clone is keyed by its derived title `"{templateTitle} (project:
//! {projectId})"`, the sole de-duplication key. The check is a remote
//! title search, never a local record.

use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::error::ProvisionError;
use crate::platform::{
    CopyDashboardBody, DashboardPatch, DashboardQuery, ScheduledPlan, ScheduledPlanDestination,
};
use crate::templates::TokenSubstituter;

use super::Provisioner;

/// Derived title for a dashboard cloned from a template into a project.
pub(crate) fn clone_title(template_title: &str, project_id: &str) -> String {
    format!("{template_title} (project: {project_id})")
}

/// Inbound spec for a scheduled dashboard delivery.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledDeliverySpec {
    pub dashboard_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cron_schedule: String,
    #[serde(default)]
    pub destination_emails: Vec<String>,
    #[serde(default = "default_pdf_paper_size")]
    pub pdf_paper_size: String,
}

fn default_pdf_paper_size() -> String {
    "letter".to_string()
}

/// Result of the retried find-or-create step. `description` is carried
/// only for a fresh clone; a reused clone is never rewritten.
struct CloneOutcome {
    dashboard_id: i64,
    fresh: bool,
    description: Option<String>,
}

impl Provisioner {
    /// Clone a template dashboard into the target folder unless a clone
    /// for this (template, project) pair already exists. Failure to
    /// fetch the template is fatal; there is no fallback.
    pub async fn clone_dashboard_if_missing(
        &self,
        template_dashboard_id: i64,
        target_folder_id: i64,
        project_id: &str,
        tokens: Option<&TokenSubstituter>,
    ) -> Result<i64, ProvisionError> {
        let clone = self
            .retry
            .run("clone_dashboard_if_missing", || {
                self.clone_dashboard_once(template_dashboard_id, target_folder_id, project_id)
            })
            .await?;

        // Substitution runs under its own retry, outside the
        // find-or-create one. A retried find-or-create would rediscover
        // the fresh clone by title, take the reuse path, and never
        // revisit a failed description update.
        if clone.fresh
            && let Some(tokens) = tokens.filter(|t| !t.is_empty())
            && let Some(description) = clone.description.as_deref()
        {
            let substituted = tokens.substitute(description);
            if substituted != description {
                self.substitute_clone_description(clone.dashboard_id, substituted)
                    .await?;
            }
        }
        Ok(clone.dashboard_id)
    }

    async fn clone_dashboard_once(
        &self,
        template_dashboard_id: i64,
        target_folder_id: i64,
        project_id: &str,
    ) -> Result<CloneOutcome, ProvisionError> {
        let template = self
            .platform
            .dashboard(template_dashboard_id)
            .await
            .map_err(|e| ProvisionError::remote("dashboard fetch", e))?;
        let desired_title = clone_title(&template.title, project_id);

        let existing = self
            .platform
            .search_dashboards(&DashboardQuery::by_title(&desired_title))
            .await
            .map_err(|e| ProvisionError::remote("search_dashboards", e))?;
        if let Some(dashboard) = existing.first() {
            let dashboard_id = dashboard.id.ok_or_else(|| {
                ProvisionError::missing_id("search_dashboards", format!("dashboard {desired_title}"))
            })?;
            info!(event = "dashboard.reuse", dashboard_id, "reusing dashboard");
            return Ok(CloneOutcome {
                dashboard_id,
                fresh: false,
                description: None,
            });
        }

        let body = CopyDashboardBody {
            name: desired_title.clone(),
            folder_id: target_folder_id,
        };
        let cloned = self
            .platform
            .copy_dashboard(template_dashboard_id, &body)
            .await
            .map_err(|e| ProvisionError::remote("copy_dashboard", e))?;
        let dashboard_id = cloned.id.ok_or_else(|| {
            ProvisionError::missing_id("copy_dashboard", format!("dashboard {desired_title}"))
        })?;
        info!(event = "dashboard.clone", dashboard_id, "cloned dashboard");

        Ok(CloneOutcome {
            dashboard_id,
            fresh: true,
            description: cloned.description.or(template.description),
        })
    }

    /// Rewrite a fresh clone's description. Only the description is
    /// patched; the derived title is the idempotency key and must stay
    /// byte-exact.
    async fn substitute_clone_description(
        &self,
        dashboard_id: i64,
        description: String,
    ) -> Result<(), ProvisionError> {
        let patch = DashboardPatch {
            folder_id: None,
            description: Some(description),
        };
        let patch = &patch;
        self.retry
            .run("substitute_clone_description", || async move {
                self.platform
                    .update_dashboard(dashboard_id, patch)
                    .await
                    .map_err(|e| ProvisionError::remote("update_dashboard", e))?;
                info!(event = "dashboard.tokens", dashboard_id, "applied token substitution");
                Ok(())
            })
            .await
    }

    /// Ids of every dashboard living in the template folder, in the
    /// order the platform returns them. Used when a provision request
    /// names a template folder instead of explicit template ids.
    pub async fn template_dashboard_ids_in_folder(
        &self,
        folder_id: i64,
    ) -> Result<Vec<i64>, ProvisionError> {
        self.retry
            .run("template_dashboard_ids_in_folder", || async move {
                let dashboards = self
                    .platform
                    .search_dashboards(&DashboardQuery::in_folder(folder_id))
                    .await
                    .map_err(|e| ProvisionError::remote("search_dashboards", e))?;
                Ok(dashboards.iter().filter_map(|d| d.id).collect())
            })
            .await
    }

    /// Move a dashboard to a different folder.
    pub async fn move_dashboard(
        &self,
        dashboard_id: i64,
        target_folder_id: i64,
    ) -> Result<bool, ProvisionError> {
        self.retry
            .run("move_dashboard", || async move {
                let patch = DashboardPatch {
                    folder_id: Some(target_folder_id),
                    description: None,
                };
                self.platform
                    .update_dashboard(dashboard_id, &patch)
                    .await
                    .map_err(|e| ProvisionError::remote("update_dashboard", e))?;
                info!(
                    event = "dashboard.move",
                    dashboard_id, target_folder_id, "moved dashboard"
                );
                Ok(true)
            })
            .await
    }

    /// Create a scheduled dashboard delivery. No deduplication; every
    /// call creates a new plan.
    pub async fn create_scheduled_plan(
        &self,
        spec: &ScheduledDeliverySpec,
    ) -> Result<i64, ProvisionError> {
        self.retry
            .run("create_scheduled_plan", || self.create_scheduled_plan_once(spec))
            .await
    }

    async fn create_scheduled_plan_once(
        &self,
        spec: &ScheduledDeliverySpec,
    ) -> Result<i64, ProvisionError> {
        let plan = ScheduledPlan {
            id: None,
            name: spec.name.clone(),
            dashboard_id: spec.dashboard_id,
            crontab: spec.cron_schedule.clone(),
            enabled: true,
            scheduled_plan_destination: spec
                .destination_emails
                .iter()
                .map(|email| ScheduledPlanDestination {
                    format: "pdf".to_string(),
                    destination_type: "email".to_string(),
                    address: email.clone(),
                    parameters: Some(serde_json::json!({
                        "pdf_paper_size": spec.pdf_paper_size,
                    })),
                })
                .collect(),
        };
        let created = self
            .platform
            .create_scheduled_plan(&plan)
            .await
            .map_err(|e| ProvisionError::remote("create_scheduled_plan", e))?;
        let plan_id = created.id.ok_or_else(|| {
            ProvisionError::missing_id("create_scheduled_plan", format!("plan {}", spec.name))
        })?;
        info!(
            event = "scheduled_plan.create",
            plan_id,
            dashboard_id = spec.dashboard_id,
            "created scheduled plan"
        );
        Ok(plan_id)
    }
}
