//! # Server Configuration
//!
//! Server setup and routing for the provisioning function surface.
//! Every function route answers HTTP 200 with the outcome carried in
//! the body's `status` field; the routes are a transport for the
//! function dispatch, not a REST resource API.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{MethodRouter, get, post},
};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers::{self, FunctionHandler};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<FunctionHandler>,
}

fn function_route(function: &'static str) -> MethodRouter<AppState> {
    post(
        move |State(state): State<AppState>, Json(event): Json<Value>| async move {
            Json(state.handler.dispatch(function, &event).await)
        },
    )
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/v1/provision", function_route("provision"))
        .route("/v1/decommission", function_route("decommission"))
        .route(
            "/v1/functions/add-group-to-saml",
            function_route("add-group-to-saml"),
        )
        .route(
            "/v1/functions/add-user-to-group",
            function_route("add-user-to-group"),
        )
        .route("/v1/functions/create-user", function_route("create-user"))
        .route(
            "/v1/functions/bulk-provision-users",
            function_route("bulk-provision-users"),
        )
        .route(
            "/v1/functions/create-project-folder",
            function_route("create-project-folder"),
        )
        .route(
            "/v1/functions/create-dashboard-from-template",
            function_route("create-dashboard-from-template"),
        )
        .route(
            "/v1/functions/move-dashboard",
            function_route("move-dashboard"),
        )
        .route(
            "/v1/functions/create-scheduled-delivery",
            function_route("create-scheduled-delivery"),
        )
        .route(
            "/v1/functions/connections/create",
            function_route("connections/create"),
        )
        .route(
            "/v1/functions/connections/test",
            function_route("connections/test"),
        )
        .route(
            "/v1/functions/connections/update",
            function_route("connections/update"),
        )
        .route(
            "/v1/functions/connections/delete",
            function_route("connections/delete"),
        )
        .route(
            "/v1/functions/connections/list",
            function_route("connections/list"),
        )
        .route("/v1/functions/lookml/create", function_route("lookml/create"))
        .route("/v1/functions/lookml/deploy", function_route("lookml/deploy"))
        .route(
            "/v1/functions/lookml/validate",
            function_route("lookml/validate"),
        )
        .route(
            "/v1/functions/lookml/create-branch",
            function_route("lookml/create-branch"),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    handler: FunctionHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState {
        handler: Arc::new(handler),
    };
    let app = create_app(state);

    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server listening on: {}", addr);
    println!("Running in profile: {}", config.profile);

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::Status,
            crate::models::ProvisionRequest,
            crate::models::DecommissionRequest,
            crate::models::ProvisionResponse,
        )
    ),
    info(
        title = "Looker Tenant Provisioner API",
        description = "Idempotent tenant provisioning functions for a BI platform",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
