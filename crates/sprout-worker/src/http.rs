//! HTTP API for session sandboxes.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /sandboxes` - Provision a sandbox
//! - `GET /sandboxes/{id}` - Look up a sandbox
//! - `DELETE /sandboxes/{id}` - Destroy a sandbox
//! - `POST /sandboxes/{id}/exec` - Run a command and return rendered output

use crate::service::{ServiceError, WorkerService};
use crate::types::{CreateSandboxRequest, ErrorBody, ExecRequest};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use sprout_machines::MachinesError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the HTTP router for the worker.
///
/// The returned router can be served directly with axum or composed
/// into a larger application.
pub fn build_router(service: WorkerService) -> Router {
    tracing::debug!("Building HTTP router");

    Router::new()
        .route("/health", get(health_handler))
        .route("/sandboxes", post(create_handler))
        .route("/sandboxes/:id", get(get_handler).delete(destroy_handler))
        .route("/sandboxes/:id/exec", post(exec_handler))
        .with_state(service)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    tracing::trace!("Health check request");
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sprout-worker"
    }))
}

async fn create_handler(
    State(service): State<WorkerService>,
    payload: Result<Json<CreateSandboxRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(request) = payload?;
    let sandbox = service.create(request).await?;
    Ok((StatusCode::CREATED, Json(sandbox)))
}

async fn get_handler(
    State(service): State<WorkerService>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    match service.get(&id).await? {
        Some(sandbox) => Ok(Json(sandbox).into_response()),
        None => Ok(error_response(
            StatusCode::NOT_FOUND,
            format!("sandbox {id} not found"),
        )),
    }
}

async fn destroy_handler(
    State(service): State<WorkerService>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    service.destroy(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn exec_handler(
    State(service): State<WorkerService>,
    Path(id): Path<String>,
    payload: Result<Json<ExecRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(request) = payload?;
    Ok(Json(service.exec(&id, request).await?))
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl ServiceError {
    /// HTTP status reported for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Machines(MachinesError::Config(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Machines(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Machines(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Machines(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        error_response(status, self.to_string())
    }
}

/// Start the HTTP server.
///
/// Runs until the shutdown future completes.
pub async fn serve(
    service: WorkerService,
    addr: std::net::SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let router = build_router(service);

    tracing::info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
