//! REST implementation of [`PlatformApi`] over the platform's admin API.
//!
//! Authenticates with client credentials against `POST /api/4.0/login`,
//! caches the bearer token, and re-authenticates once when the platform
//! answers 401 (token expiry). Everything else is a direct binding of
//! trait methods to endpoints; no retry logic lives here.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::config::AppConfig;

use super::{
    ConnectionTestResult, CopyDashboardBody, CreateFolderBody, CreateUserBody, Dashboard,
    DashboardPatch, DashboardQuery, DbConnection, Folder, Group, GroupUser, LookmlProject,
    PlatformApi, PlatformError, PlatformResult, ProjectValidation, SamlConfig, SamlGroup,
    ScheduledPlan, User,
};

const API_PREFIX: &str = "api/4.0";
const BODY_SNIPPET_MAX_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

/// Remote client handle; constructed once per process and shared
/// read-only across invocations (the token cache is interior-mutable).
pub struct RestPlatform {
    http: reqwest::Client,
    base_url: Url,
    client_id: String,
    client_secret: String,
    token: RwLock<Option<String>>,
}

impl RestPlatform {
    pub fn new(
        base_url: &str,
        client_id: String,
        client_secret: String,
        verify_tls: bool,
    ) -> PlatformResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        // A path without a trailing slash would drop its last segment on join.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!verify_tls)
            .build()?;
        Ok(Self {
            http,
            base_url,
            client_id,
            client_secret,
            token: RwLock::new(None),
        })
    }

    /// Build the client from configuration; `None` when the platform is
    /// not configured, which the handler surfaces as `sdk_unavailable`.
    pub fn from_config(config: &AppConfig) -> PlatformResult<Option<Self>> {
        if !config.platform_configured() {
            return Ok(None);
        }
        Self::new(
            &config.platform_base_url,
            config.platform_client_id.clone(),
            config.platform_client_secret.clone(),
            config.platform_verify_tls,
        )
        .map(Some)
    }

    fn endpoint(&self, path: &str) -> PlatformResult<Url> {
        Ok(self.base_url.join(&format!("{API_PREFIX}/{path}"))?)
    }

    async fn login(&self) -> PlatformResult<String> {
        let url = self.endpoint("login")?;
        let response = self
            .http
            .post(url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Auth(format!(
                "login rejected with status {status}: {}",
                truncate_body(&body)
            )));
        }
        let token: AccessToken = response
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))?;
        debug!(event = "platform.login", "obtained access token");
        Ok(token.access_token)
    }

    async fn bearer_token(&self) -> PlatformResult<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }
        let token = self.login().await?;
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    /// Issue one authenticated request, re-authenticating a single time
    /// if the cached token has expired.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> PlatformResult<reqwest::Response> {
        let url = self.endpoint(path)?;
        for reauth in [false, true] {
            if reauth {
                *self.token.write().await = None;
            }
            let token = self.bearer_token().await?;
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(token);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(json) = body {
                request = request.json(json);
            }
            let response = request.send().await?;
            if response.status() == StatusCode::UNAUTHORIZED && !reauth {
                debug!(event = "platform.reauth", path, "token rejected, logging in again");
                continue;
            }
            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(PlatformError::Http {
                    status,
                    body: truncate_body(&body),
                });
            }
            return Ok(response);
        }
        unreachable!("second pass either returns or errors")
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> PlatformResult<T> {
        let response = self.execute(method, path, query, body).await?;
        response
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> PlatformResult<()> {
        self.execute(method, path, &[], body).await?;
        Ok(())
    }

    fn json_body<T: serde::Serialize>(value: &T) -> PlatformResult<serde_json::Value> {
        serde_json::to_value(value).map_err(|e| PlatformError::Decode(e.to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() > BODY_SNIPPET_MAX_CHARS {
        let truncated: String = body.chars().take(BODY_SNIPPET_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        body.to_string()
    }
}

#[async_trait]
impl PlatformApi for RestPlatform {
    async fn search_groups(&self, name: &str) -> PlatformResult<Vec<Group>> {
        self.fetch(
            Method::GET,
            "groups/search",
            &[("name", name.to_string())],
            None,
        )
        .await
    }

    async fn create_group(&self, name: &str) -> PlatformResult<Group> {
        let body = serde_json::json!({ "name": name });
        self.fetch(Method::POST, "groups", &[], Some(&body)).await
    }

    async fn delete_group(&self, group_id: i64) -> PlatformResult<()> {
        self.send(Method::DELETE, &format!("groups/{group_id}"), None)
            .await
    }

    async fn group_users(&self, group_id: i64) -> PlatformResult<Vec<GroupUser>> {
        self.fetch(Method::GET, &format!("groups/{group_id}/users"), &[], None)
            .await
    }

    async fn add_group_user(&self, group_id: i64, user_id: i64) -> PlatformResult<()> {
        let body = serde_json::json!({ "user_id": user_id });
        self.send(Method::POST, &format!("groups/{group_id}/users"), Some(&body))
            .await
    }

    async fn remove_group_user(&self, group_id: i64, user_id: i64) -> PlatformResult<()> {
        self.send(
            Method::DELETE,
            &format!("groups/{group_id}/users/{user_id}"),
            None,
        )
        .await
    }

    async fn create_user(&self, body: &CreateUserBody) -> PlatformResult<User> {
        let json = Self::json_body(body)?;
        self.fetch(Method::POST, "users", &[], Some(&json)).await
    }

    async fn set_user_roles(&self, user_id: i64, role_ids: &[i64]) -> PlatformResult<()> {
        let body = serde_json::json!(role_ids);
        self.send(Method::PUT, &format!("users/{user_id}/roles"), Some(&body))
            .await
    }

    async fn disable_user(&self, user_id: i64) -> PlatformResult<()> {
        let body = serde_json::json!({ "is_disabled": true });
        self.send(Method::PATCH, &format!("users/{user_id}"), Some(&body))
            .await
    }

    async fn delete_user(&self, user_id: i64) -> PlatformResult<()> {
        self.send(Method::DELETE, &format!("users/{user_id}"), None)
            .await
    }

    async fn search_folders(&self, name: &str) -> PlatformResult<Vec<Folder>> {
        self.fetch(
            Method::GET,
            "folders/search",
            &[("name", name.to_string())],
            None,
        )
        .await
    }

    async fn create_folder(&self, body: &CreateFolderBody) -> PlatformResult<Folder> {
        let json = Self::json_body(body)?;
        self.fetch(Method::POST, "folders", &[], Some(&json)).await
    }

    async fn rename_folder(&self, folder_id: i64, name: &str) -> PlatformResult<Folder> {
        let body = serde_json::json!({ "name": name });
        self.fetch(
            Method::PATCH,
            &format!("folders/{folder_id}"),
            &[],
            Some(&body),
        )
        .await
    }

    async fn dashboard(&self, dashboard_id: i64) -> PlatformResult<Dashboard> {
        self.fetch(Method::GET, &format!("dashboards/{dashboard_id}"), &[], None)
            .await
    }

    async fn search_dashboards(&self, query: &DashboardQuery) -> PlatformResult<Vec<Dashboard>> {
        let mut pairs = Vec::new();
        if let Some(title) = &query.title {
            pairs.push(("title", title.clone()));
        }
        if let Some(folder_id) = query.folder_id {
            pairs.push(("folder_id", folder_id.to_string()));
        }
        self.fetch(Method::GET, "dashboards/search", &pairs, None)
            .await
    }

    async fn copy_dashboard(
        &self,
        dashboard_id: i64,
        body: &CopyDashboardBody,
    ) -> PlatformResult<Dashboard> {
        let json = Self::json_body(body)?;
        self.fetch(
            Method::POST,
            &format!("dashboards/{dashboard_id}/copy"),
            &[],
            Some(&json),
        )
        .await
    }

    async fn update_dashboard(
        &self,
        dashboard_id: i64,
        patch: &DashboardPatch,
    ) -> PlatformResult<Dashboard> {
        let json = Self::json_body(patch)?;
        self.fetch(
            Method::PATCH,
            &format!("dashboards/{dashboard_id}"),
            &[],
            Some(&json),
        )
        .await
    }

    async fn delete_dashboard(&self, dashboard_id: i64) -> PlatformResult<()> {
        self.send(Method::DELETE, &format!("dashboards/{dashboard_id}"), None)
            .await
    }

    async fn saml_config(&self) -> PlatformResult<SamlConfig> {
        self.fetch(Method::GET, "saml_config", &[], None).await
    }

    async fn update_saml_config(&self, groups: &[SamlGroup]) -> PlatformResult<()> {
        let body = serde_json::json!({ "groups": groups });
        self.send(Method::PATCH, "saml_config", Some(&body)).await
    }

    async fn create_scheduled_plan(&self, plan: &ScheduledPlan) -> PlatformResult<ScheduledPlan> {
        let json = Self::json_body(plan)?;
        self.fetch(Method::POST, "scheduled_plans", &[], Some(&json))
            .await
    }

    async fn scheduled_plans_for_dashboard(
        &self,
        dashboard_id: i64,
    ) -> PlatformResult<Vec<ScheduledPlan>> {
        self.fetch(
            Method::GET,
            "scheduled_plans",
            &[("dashboard_id", dashboard_id.to_string())],
            None,
        )
        .await
    }

    async fn delete_scheduled_plan(&self, plan_id: i64) -> PlatformResult<()> {
        self.send(Method::DELETE, &format!("scheduled_plans/{plan_id}"), None)
            .await
    }

    async fn create_connection(&self, body: &DbConnection) -> PlatformResult<DbConnection> {
        let json = Self::json_body(body)?;
        self.fetch(Method::POST, "connections", &[], Some(&json))
            .await
    }

    async fn all_connections(&self) -> PlatformResult<Vec<DbConnection>> {
        self.fetch(Method::GET, "connections", &[], None).await
    }

    async fn update_connection(
        &self,
        name: &str,
        patch: &serde_json::Value,
    ) -> PlatformResult<DbConnection> {
        self.fetch(
            Method::PATCH,
            &format!("connections/{name}"),
            &[],
            Some(patch),
        )
        .await
    }

    async fn delete_connection(&self, name: &str) -> PlatformResult<()> {
        self.send(Method::DELETE, &format!("connections/{name}"), None)
            .await
    }

    async fn test_connection(&self, name: &str) -> PlatformResult<ConnectionTestResult> {
        self.fetch(Method::PUT, &format!("connections/{name}/test"), &[], None)
            .await
    }

    async fn create_project(&self, body: &LookmlProject) -> PlatformResult<LookmlProject> {
        let json = Self::json_body(body)?;
        self.fetch(Method::POST, "projects", &[], Some(&json)).await
    }

    async fn deploy_to_production(&self, project_id: &str) -> PlatformResult<()> {
        self.send(
            Method::POST,
            &format!("projects/{project_id}/deploy_to_production"),
            None,
        )
        .await
    }

    async fn validate_project(&self, project_id: &str) -> PlatformResult<ProjectValidation> {
        self.fetch(
            Method::POST,
            &format!("projects/{project_id}/validate"),
            &[],
            None,
        )
        .await
    }

    async fn create_git_branch(&self, project_id: &str, branch: &str) -> PlatformResult<()> {
        let body = serde_json::json!({ "name": branch });
        self.send(
            Method::POST,
            &format!("projects/{project_id}/git_branch"),
            Some(&body),
        )
        .await
    }
}
