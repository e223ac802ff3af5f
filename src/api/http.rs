//! HTTP Server
//!
//! GET `/` reads from the replica, POST `/` writes to the primary. Every
//! request loads the connection keys afresh and builds its own descriptors;
//! the only shared state is the injected source, connector and resolver.

use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use super::pages::{self, PageContext};
use crate::config::ServerConfig;
use crate::connection::{ConnectionInfo, KeySource, Role};
use crate::error::{Error, Result};
use crate::executor::Connector;
use crate::network::{Addresses, HostResolver};

/// Collaborators injected into every handler
pub struct AppState {
    /// Hostname of the machine serving the page
    pub server_hostname: String,
    /// Source of the four connection keys
    pub source: Arc<dyn KeySource>,
    /// Opens database sessions
    pub connector: Arc<dyn Connector>,
    /// Resolves database hostnames
    pub resolver: Arc<dyn HostResolver>,
}

impl AppState {
    fn connection_info(&self) -> Result<ConnectionInfo> {
        ConnectionInfo::load(self.source.as_ref())
    }
}

/// HTTP server
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Start the HTTP server; returns after Ctrl+C
    pub async fn start(&self) -> Result<()> {
        let app = create_router(Arc::clone(&self.state));

        let listener = tokio::net::TcpListener::bind(&self.config.bind_address).await?;
        tracing::info!("HTTP server listening on {}", self.config.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Network(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Received shutdown signal");
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_read).post(handle_write))
        .route("/status", get(handle_status))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Request/Response Types ============

/// Submitted value form
#[derive(Debug, Deserialize)]
pub struct ValueForm {
    #[serde(default)]
    pub value: String,
}

/// One role's endpoint as seen right now
#[derive(Debug, Serialize)]
pub struct EndpointStatus {
    pub hostname: String,
    pub role: Role,
    pub addresses: Addresses,
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub configured: bool,
    pub server_hostname: String,
    pub username: Option<String>,
    pub primary: Option<EndpointStatus>,
    pub replica: Option<EndpointStatus>,
    pub replicating: Option<bool>,
    pub checked_at: DateTime<Utc>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub server_hostname: String,
    pub configured: bool,
}

// ============ Handlers ============

async fn handle_read(State(state): State<Arc<AppState>>) -> Response {
    let info = match state.connection_info() {
        Ok(info) => info,
        Err(e) => return unavailable_info(&state, e),
    };

    match info.replica().read_values(state.connector.as_ref()).await {
        Ok(values) => {
            let status = info.replication_status(state.resolver.as_ref()).await;
            let ctx = PageContext {
                server_hostname: &state.server_hostname,
                info: &info,
                status: &status,
            };
            Html(pages::connected(&ctx, &values)).into_response()
        }
        Err(e) => render_failure(&state, &info, e).await,
    }
}

async fn handle_write(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ValueForm>,
) -> Response {
    let info = match state.connection_info() {
        Ok(info) => info,
        Err(e) => return unavailable_info(&state, e),
    };

    match info
        .primary()
        .insert_value(state.connector.as_ref(), &form.value)
        .await
    {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => render_failure(&state, &info, e).await,
    }
}

async fn handle_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let checked_at = Utc::now();

    let info = match state.connection_info() {
        Ok(info) => info,
        Err(_) => {
            return Json(StatusResponse {
                configured: false,
                server_hostname: state.server_hostname.clone(),
                username: None,
                primary: None,
                replica: None,
                replicating: None,
                checked_at,
            })
        }
    };

    let status = info.replication_status(state.resolver.as_ref()).await;

    Json(StatusResponse {
        configured: true,
        server_hostname: state.server_hostname.clone(),
        username: Some(info.username().to_string()),
        primary: Some(EndpointStatus {
            hostname: info.primary_host().to_string(),
            role: Role::Primary,
            addresses: status.primary,
        }),
        replica: Some(EndpointStatus {
            hostname: info.replica_host().to_string(),
            role: Role::Replica,
            addresses: status.replica,
        }),
        replicating: Some(status.replicating),
        checked_at,
    })
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        server_hostname: state.server_hostname.clone(),
        configured: state.connection_info().is_ok(),
    })
}

// ============ Helpers ============

/// Connection keys could not be loaded
fn unavailable_info(state: &AppState, err: Error) -> Response {
    if err.is_missing_configuration() {
        tracing::info!("{}", err);
        return Html(pages::unconfigured(&state.server_hostname)).into_response();
    }

    tracing::error!("Failed to load connection info: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(pages::internal_error(&state.server_hostname, &err.to_string())),
    )
        .into_response()
}

/// Pick the error view from the role of the descriptor that failed
async fn render_failure(state: &AppState, info: &ConnectionInfo, err: Error) -> Response {
    let message = err.to_string();

    match err.failed_role() {
        Some(Role::Primary) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(pages::write_error(&state.server_hostname, &message)),
        )
            .into_response(),
        Some(Role::Replica) => {
            let status = info.replication_status(state.resolver.as_ref()).await;
            let ctx = PageContext {
                server_hostname: &state.server_hostname,
                info,
                status: &status,
            };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Html(pages::read_error(&ctx, &message)),
            )
                .into_response()
        }
        None => {
            tracing::error!("Request failed: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::internal_error(&state.server_hostname, &message)),
            )
                .into_response()
        }
    }
}
