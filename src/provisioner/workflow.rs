//! Orchestrated provisioning and decommissioning workflows.
//!
//! Steps are strictly ordered and there is no rollback: a failure leaves
//! earlier steps' remote side effects in place (fail-forward), and a
//! second invocation with the same inputs resumes via the idempotent
//! find-or-create checks instead of duplicating work.

use std::collections::BTreeMap;

use metrics::counter;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ProvisionError;
use crate::models::{DecommissionOutcome, ProvisionOutcome};
use crate::platform::DashboardQuery;
use crate::telemetry::{self, TraceContext};
use crate::templates::TokenSubstituter;

use super::folders::{archived_folder_name, project_folder_name};
use super::Provisioner;

impl Provisioner {
    /// Complete tenant provisioning: group, SAML mapping, project
    /// folder and dashboard clones, in that order, each step feeding
    /// the next.
    pub async fn provision(
        &self,
        project_id: &str,
        group_email: &str,
        template_dashboard_ids: &[i64],
        tokens: &BTreeMap<String, String>,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        // Gate before any remote call: a malformed request must not
        // produce partial remote side effects from this path.
        if project_id.is_empty() || group_email.is_empty() {
            return Err(ProvisionError::Validation(
                "missing projectId or groupEmail".to_string(),
            ));
        }

        let correlation_id = Uuid::new_v4().to_string();
        let context = TraceContext {
            correlation_id: correlation_id.clone(),
        };
        let result = telemetry::with_trace_context(context, async {
            self.provision_steps(project_id, group_email, template_dashboard_ids, tokens, &correlation_id)
                .await
        })
        .await;

        match &result {
            Ok(_) => counter!("provision_runs_total", "outcome" => "ok").increment(1),
            Err(_) => counter!("provision_runs_total", "outcome" => "failed").increment(1),
        }
        result
    }

    async fn provision_steps(
        &self,
        project_id: &str,
        group_email: &str,
        template_dashboard_ids: &[i64],
        tokens: &BTreeMap<String, String>,
        correlation_id: &str,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        info!(
            event = "provision.start",
            project_id, group_email, correlation_id, "provision start"
        );

        let group_id = self.ensure_group(group_email).await?;
        self.ensure_saml_group_mapping(group_id, group_email).await?;
        let folder_id = self.ensure_project_folder(project_id, None).await?;

        let substituter = if tokens.is_empty() {
            None
        } else {
            Some(TokenSubstituter::new(tokens.clone()))
        };

        let mut dashboard_ids = Vec::with_capacity(template_dashboard_ids.len());
        for template_id in template_dashboard_ids {
            // One clone failure aborts the run; dashboards cloned so far
            // stay in place.
            let cloned = self
                .clone_dashboard_if_missing(*template_id, folder_id, project_id, substituter.as_ref())
                .await
                .inspect_err(|e| {
                    warn!(
                        event = "dashboard.clone.error",
                        template_dashboard_id = template_id,
                        error = %e,
                        "dashboard clone failed"
                    );
                })?;
            dashboard_ids.push(cloned);
        }

        let outcome = ProvisionOutcome {
            project_id: project_id.to_string(),
            group_email: group_email.to_string(),
            group_id,
            folder_id,
            dashboard_ids,
            correlation_id: correlation_id.to_string(),
        };
        info!(
            event = "provision.complete",
            project_id,
            group_id,
            folder_id,
            dashboards = outcome.dashboard_ids.len(),
            correlation_id,
            "provision complete"
        );
        Ok(outcome)
    }

    /// Decommission a tenant project's resources. A missing project
    /// folder is a no-op success, not an error. When both delete flags
    /// are set, schedule deletion iterates the dashboard list captured
    /// BEFORE any dashboard deletion; the platform must tolerate
    /// schedule lookups against just-deleted dashboards.
    pub async fn decommission_project(
        &self,
        project_id: &str,
        archive_folder: bool,
        delete_dashboards: bool,
        delete_schedules: bool,
    ) -> Result<DecommissionOutcome, ProvisionError> {
        let folder_name = project_folder_name(project_id);
        let mut outcome = DecommissionOutcome::empty(project_id);

        let folders = self
            .platform
            .search_folders(&folder_name)
            .await
            .map_err(|e| ProvisionError::remote("search_folders", e))?;
        let Some(folder) = folders.first() else {
            warn!(
                event = "decommission.folder_not_found",
                project_id, "folder not found for decommissioning"
            );
            return Ok(outcome);
        };
        let folder_id = folder
            .id
            .ok_or_else(|| ProvisionError::missing_id("search_folders", format!("folder {folder_name}")))?;

        // Captured once; both deletion passes below use this snapshot.
        let dashboards = self
            .platform
            .search_dashboards(&DashboardQuery::in_folder(folder_id))
            .await
            .map_err(|e| ProvisionError::remote("search_dashboards", e))?;

        if delete_dashboards {
            for dashboard in &dashboards {
                if let Some(dashboard_id) = dashboard.id {
                    self.platform
                        .delete_dashboard(dashboard_id)
                        .await
                        .map_err(|e| ProvisionError::remote("delete_dashboard", e))?;
                    outcome.deleted_dashboards += 1;
                }
            }
        }

        if delete_schedules {
            for dashboard in &dashboards {
                let Some(dashboard_id) = dashboard.id else {
                    continue;
                };
                let plans = self
                    .platform
                    .scheduled_plans_for_dashboard(dashboard_id)
                    .await
                    .map_err(|e| ProvisionError::remote("scheduled_plans_for_dashboard", e))?;
                for plan in plans {
                    if let Some(plan_id) = plan.id {
                        self.platform
                            .delete_scheduled_plan(plan_id)
                            .await
                            .map_err(|e| ProvisionError::remote("delete_scheduled_plan", e))?;
                        outcome.deleted_schedules += 1;
                    }
                }
            }
        }

        if archive_folder {
            self.platform
                .rename_folder(folder_id, &archived_folder_name(&folder_name))
                .await
                .map_err(|e| ProvisionError::remote("rename_folder", e))?;
            outcome.archived_folder = true;
        }

        counter!("decommission_runs_total").increment(1);
        info!(
            event = "project.decommission",
            project_id,
            archived_folder = outcome.archived_folder,
            deleted_dashboards = outcome.deleted_dashboards,
            deleted_schedules = outcome.deleted_schedules,
            "decommissioned project"
        );
        Ok(outcome)
    }
}
