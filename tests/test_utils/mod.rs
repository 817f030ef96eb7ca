//! Test utilities: a stateful in-memory fake of the remote platform.
//!
//! The fake mimics the remote side's find-or-create observable
//! behavior (exact-name search, server-assigned ids) and records every
//! call so tests can assert how many creates a workflow issued. Faults
//! are injected per operation name with [`InMemoryPlatform::fail_next`].

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use provisioner::platform::{
    ConnectionTestResult, CopyDashboardBody, CreateFolderBody, CreateUserBody, Dashboard,
    DashboardPatch, DashboardQuery, DbConnection, Folder, Group, GroupUser, LookmlProject,
    PlatformApi, PlatformError, PlatformResult, ProjectValidation, SamlConfig, SamlGroup,
    ScheduledPlan, User,
};
use provisioner::provisioner::Provisioner;
use provisioner::retry::RetryPolicy;
use std::time::Duration;

#[derive(Default)]
struct PlatformState {
    next_id: i64,
    groups: Vec<Group>,
    memberships: HashSet<(i64, i64)>,
    users: Vec<User>,
    user_roles: HashMap<i64, Vec<i64>>,
    folders: Vec<Folder>,
    dashboards: Vec<Dashboard>,
    saml_groups: Vec<SamlGroup>,
    plans: Vec<ScheduledPlan>,
    connections: Vec<DbConnection>,
    projects: Vec<LookmlProject>,
    branches: Vec<(String, String)>,
    calls: BTreeMap<String, u64>,
    failures: HashMap<String, u64>,
}

impl PlatformState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryPlatform {
    state: Mutex<PlatformState>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the call and surface an injected failure, if armed.
    fn begin(&self, operation: &str) -> Result<MutexGuard<'_, PlatformState>, PlatformError> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(operation.to_string()).or_insert(0) += 1;
        if let Some(remaining) = state.failures.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PlatformError::Http {
                    status: 500,
                    body: format!("injected failure for {operation}"),
                });
            }
        }
        Ok(state)
    }

    /// Arm `times` consecutive failures for one operation name.
    pub fn fail_next(&self, operation: &str, times: u64) {
        let mut state = self.state.lock().unwrap();
        state.failures.insert(operation.to_string(), times);
    }

    pub fn calls(&self, operation: &str) -> u64 {
        let state = self.state.lock().unwrap();
        state.calls.get(operation).copied().unwrap_or(0)
    }

    /// Total calls across every create-flavored operation.
    pub fn create_calls(&self) -> u64 {
        let state = self.state.lock().unwrap();
        state
            .calls
            .iter()
            .filter(|(name, _)| {
                name.starts_with("create_") || *name == "copy_dashboard"
            })
            .map(|(_, count)| count)
            .sum()
    }

    pub fn seed_dashboard(&self, id: i64, title: &str, description: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        state.dashboards.push(Dashboard {
            id: Some(id),
            title: title.to_string(),
            description: description.map(str::to_string),
            folder_id: None,
            created_at: None,
        });
        state.next_id = state.next_id.max(id);
    }

    pub fn seed_dashboard_in_folder(&self, id: i64, title: &str, folder_id: i64) {
        let mut state = self.state.lock().unwrap();
        state.dashboards.push(Dashboard {
            id: Some(id),
            title: title.to_string(),
            description: None,
            folder_id: Some(folder_id),
            created_at: None,
        });
        state.next_id = state.next_id.max(id);
    }

    pub fn folder_name(&self, folder_id: i64) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .folders
            .iter()
            .find(|f| f.id == Some(folder_id))
            .map(|f| f.name.clone())
    }

    pub fn dashboards_in_folder(&self, folder_id: i64) -> Vec<Dashboard> {
        let state = self.state.lock().unwrap();
        state
            .dashboards
            .iter()
            .filter(|d| d.folder_id == Some(folder_id))
            .cloned()
            .collect()
    }

    pub fn dashboard_description(&self, dashboard_id: i64) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .dashboards
            .iter()
            .find(|d| d.id == Some(dashboard_id))
            .and_then(|d| d.description.clone())
    }

    pub fn saml_group_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.saml_groups.iter().map(|g| g.name.clone()).collect()
    }

    pub fn membership_count(&self, group_id: i64, user_id: i64) -> usize {
        let state = self.state.lock().unwrap();
        state
            .memberships
            .iter()
            .filter(|&&pair| pair == (group_id, user_id))
            .count()
    }

    pub fn plan_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.plans.len()
    }

    pub fn connection_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.connections.iter().map(|c| c.name.clone()).collect()
    }
}

#[async_trait]
impl PlatformApi for InMemoryPlatform {
    async fn search_groups(&self, name: &str) -> PlatformResult<Vec<Group>> {
        let state = self.begin("search_groups")?;
        Ok(state
            .groups
            .iter()
            .filter(|g| g.name == name)
            .cloned()
            .collect())
    }

    async fn create_group(&self, name: &str) -> PlatformResult<Group> {
        let mut state = self.begin("create_group")?;
        let id = state.next_id();
        let group = Group {
            id: Some(id),
            name: name.to_string(),
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn delete_group(&self, group_id: i64) -> PlatformResult<()> {
        let mut state = self.begin("delete_group")?;
        state.groups.retain(|g| g.id != Some(group_id));
        Ok(())
    }

    async fn group_users(&self, group_id: i64) -> PlatformResult<Vec<GroupUser>> {
        let state = self.begin("group_users")?;
        Ok(state
            .memberships
            .iter()
            .filter(|(gid, _)| *gid == group_id)
            .map(|(_, uid)| GroupUser {
                id: Some(*uid),
                email: None,
            })
            .collect())
    }

    async fn add_group_user(&self, group_id: i64, user_id: i64) -> PlatformResult<()> {
        let mut state = self.begin("add_group_user")?;
        state.memberships.insert((group_id, user_id));
        Ok(())
    }

    async fn remove_group_user(&self, group_id: i64, user_id: i64) -> PlatformResult<()> {
        let mut state = self.begin("remove_group_user")?;
        state.memberships.remove(&(group_id, user_id));
        Ok(())
    }

    async fn create_user(&self, body: &CreateUserBody) -> PlatformResult<User> {
        let mut state = self.begin("create_user")?;
        let id = state.next_id();
        let user = User {
            id: Some(id),
            email: body.email.clone(),
            first_name: body.first_name.clone(),
            last_name: body.last_name.clone(),
            is_disabled: false,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn set_user_roles(&self, user_id: i64, role_ids: &[i64]) -> PlatformResult<()> {
        let mut state = self.begin("set_user_roles")?;
        state.user_roles.insert(user_id, role_ids.to_vec());
        Ok(())
    }

    async fn disable_user(&self, user_id: i64) -> PlatformResult<()> {
        let mut state = self.begin("disable_user")?;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == Some(user_id)) {
            user.is_disabled = true;
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: i64) -> PlatformResult<()> {
        let mut state = self.begin("delete_user")?;
        state.users.retain(|u| u.id != Some(user_id));
        Ok(())
    }

    async fn search_folders(&self, name: &str) -> PlatformResult<Vec<Folder>> {
        let state = self.begin("search_folders")?;
        Ok(state
            .folders
            .iter()
            .filter(|f| f.name == name)
            .cloned()
            .collect())
    }

    async fn create_folder(&self, body: &CreateFolderBody) -> PlatformResult<Folder> {
        let mut state = self.begin("create_folder")?;
        let id = state.next_id();
        let folder = Folder {
            id: Some(id),
            name: body.name.clone(),
            parent_id: body.parent_id,
        };
        state.folders.push(folder.clone());
        Ok(folder)
    }

    async fn rename_folder(&self, folder_id: i64, name: &str) -> PlatformResult<Folder> {
        let mut state = self.begin("rename_folder")?;
        let folder = state
            .folders
            .iter_mut()
            .find(|f| f.id == Some(folder_id))
            .ok_or(PlatformError::Http {
                status: 404,
                body: "folder not found".to_string(),
            })?;
        folder.name = name.to_string();
        Ok(folder.clone())
    }

    async fn dashboard(&self, dashboard_id: i64) -> PlatformResult<Dashboard> {
        let state = self.begin("dashboard")?;
        state
            .dashboards
            .iter()
            .find(|d| d.id == Some(dashboard_id))
            .cloned()
            .ok_or(PlatformError::Http {
                status: 404,
                body: "dashboard not found".to_string(),
            })
    }

    async fn search_dashboards(&self, query: &DashboardQuery) -> PlatformResult<Vec<Dashboard>> {
        let state = self.begin("search_dashboards")?;
        Ok(state
            .dashboards
            .iter()
            .filter(|d| {
                let title_ok = query.title.as_deref().is_none_or(|t| d.title == t);
                let folder_ok = query.folder_id.is_none_or(|f| d.folder_id == Some(f));
                title_ok && folder_ok
            })
            .cloned()
            .collect())
    }

    async fn copy_dashboard(
        &self,
        dashboard_id: i64,
        body: &CopyDashboardBody,
    ) -> PlatformResult<Dashboard> {
        let mut state = self.begin("copy_dashboard")?;
        let template = state
            .dashboards
            .iter()
            .find(|d| d.id == Some(dashboard_id))
            .cloned()
            .ok_or(PlatformError::Http {
                status: 404,
                body: "dashboard not found".to_string(),
            })?;
        let id = state.next_id();
        let clone = Dashboard {
            id: Some(id),
            title: body.name.clone(),
            description: template.description,
            folder_id: Some(body.folder_id),
            created_at: None,
        };
        state.dashboards.push(clone.clone());
        Ok(clone)
    }

    async fn update_dashboard(
        &self,
        dashboard_id: i64,
        patch: &DashboardPatch,
    ) -> PlatformResult<Dashboard> {
        let mut state = self.begin("update_dashboard")?;
        let dashboard = state
            .dashboards
            .iter_mut()
            .find(|d| d.id == Some(dashboard_id))
            .ok_or(PlatformError::Http {
                status: 404,
                body: "dashboard not found".to_string(),
            })?;
        if let Some(folder_id) = patch.folder_id {
            dashboard.folder_id = Some(folder_id);
        }
        if let Some(description) = &patch.description {
            dashboard.description = Some(description.clone());
        }
        Ok(dashboard.clone())
    }

    async fn delete_dashboard(&self, dashboard_id: i64) -> PlatformResult<()> {
        let mut state = self.begin("delete_dashboard")?;
        state.dashboards.retain(|d| d.id != Some(dashboard_id));
        Ok(())
    }

    async fn saml_config(&self) -> PlatformResult<SamlConfig> {
        let state = self.begin("saml_config")?;
        Ok(SamlConfig {
            groups: state.saml_groups.clone(),
        })
    }

    async fn update_saml_config(&self, groups: &[SamlGroup]) -> PlatformResult<()> {
        let mut state = self.begin("update_saml_config")?;
        state.saml_groups = groups.to_vec();
        Ok(())
    }

    async fn create_scheduled_plan(&self, plan: &ScheduledPlan) -> PlatformResult<ScheduledPlan> {
        let mut state = self.begin("create_scheduled_plan")?;
        let id = state.next_id();
        let mut created = plan.clone();
        created.id = Some(id);
        state.plans.push(created.clone());
        Ok(created)
    }

    async fn scheduled_plans_for_dashboard(
        &self,
        dashboard_id: i64,
    ) -> PlatformResult<Vec<ScheduledPlan>> {
        let state = self.begin("scheduled_plans_for_dashboard")?;
        Ok(state
            .plans
            .iter()
            .filter(|p| p.dashboard_id == dashboard_id)
            .cloned()
            .collect())
    }

    async fn delete_scheduled_plan(&self, plan_id: i64) -> PlatformResult<()> {
        let mut state = self.begin("delete_scheduled_plan")?;
        state.plans.retain(|p| p.id != Some(plan_id));
        Ok(())
    }

    async fn create_connection(&self, body: &DbConnection) -> PlatformResult<DbConnection> {
        let mut state = self.begin("create_connection")?;
        state.connections.push(body.clone());
        Ok(body.clone())
    }

    async fn all_connections(&self) -> PlatformResult<Vec<DbConnection>> {
        let state = self.begin("all_connections")?;
        Ok(state.connections.clone())
    }

    async fn update_connection(
        &self,
        name: &str,
        _patch: &serde_json::Value,
    ) -> PlatformResult<DbConnection> {
        let state = self.begin("update_connection")?;
        state
            .connections
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or(PlatformError::Http {
                status: 404,
                body: "connection not found".to_string(),
            })
    }

    async fn delete_connection(&self, name: &str) -> PlatformResult<()> {
        let mut state = self.begin("delete_connection")?;
        state.connections.retain(|c| c.name != name);
        Ok(())
    }

    async fn test_connection(&self, name: &str) -> PlatformResult<ConnectionTestResult> {
        let state = self.begin("test_connection")?;
        let known = state.connections.iter().any(|c| c.name == name);
        Ok(ConnectionTestResult {
            status: Some(if known { "success" } else { "error" }.to_string()),
            message: None,
        })
    }

    async fn create_project(&self, body: &LookmlProject) -> PlatformResult<LookmlProject> {
        let mut state = self.begin("create_project")?;
        let mut created = body.clone();
        created.id = Some(format!("proj_{}", state.next_id()));
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn deploy_to_production(&self, _project_id: &str) -> PlatformResult<()> {
        let _state = self.begin("deploy_to_production")?;
        Ok(())
    }

    async fn validate_project(&self, _project_id: &str) -> PlatformResult<ProjectValidation> {
        let _state = self.begin("validate_project")?;
        Ok(ProjectValidation {
            errors: Vec::new(),
            warnings: Vec::new(),
        })
    }

    async fn create_git_branch(&self, project_id: &str, branch: &str) -> PlatformResult<()> {
        let mut state = self.begin("create_git_branch")?;
        state
            .branches
            .push((project_id.to_string(), branch.to_string()));
        Ok(())
    }
}

/// Millisecond-scale retry policy so retry paths stay fast under test.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5))
}

/// A provisioner wired to a shared in-memory platform.
pub fn provisioner_with_fake() -> (Arc<InMemoryPlatform>, Provisioner) {
    let platform = Arc::new(InMemoryPlatform::new());
    let provisioner = Provisioner::new(platform.clone(), fast_retry());
    (platform, provisioner)
}
