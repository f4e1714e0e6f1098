//! Axum HTTP server: router, listener, graceful shutdown.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use uuid::Uuid;

use crate::dispatch::{DispatchEngine, MockResponse, Outcome};
use crate::health::{handle_health, HEALTH_PATH};

/// Plain-text body sent with every 401.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized: missing auth header";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: DispatchEngine,
}

impl AppState {
    pub fn new(engine: DispatchEngine) -> Self {
        Self { engine }
    }
}

/// Build the router: the health probe first, every other request goes
/// through the dispatch engine.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, any(handle_health))
        .fallback(handle_mock)
        .with_state(Arc::new(state))
}

/// Bind the listener and serve until Ctrl+C.
pub async fn run(listen_addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        address = %local_addr,
        health = %format!("http://localhost:{}{HEALTH_PATH}", local_addr.port()),
        "mockery-api listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("mockery-api shut down gracefully");
    Ok(())
}

/// Catch-all handler answering from the route table.
async fn handle_mock(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let request_id = Uuid::new_v4();
    let span = mockery_tracing::mock_request_span!(
        request_id,
        request.method(),
        request.uri().path()
    );

    span.in_scope(|| {
        tracing::info!("Request received");

        let response = state.engine.dispatch(&request).into_response();

        let status = response.status().as_u16();
        tracing::Span::current().record("status", status);
        tracing::info!(status = status, "Response sent");
        response
    })
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Respond(mock) => mock.into_response(),
            Outcome::NotFound => StatusCode::NOT_FOUND.into_response(),
            Outcome::Unauthorized => (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE).into_response(),
        }
    }
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        let body = self.body.map(Body::from).unwrap_or_else(Body::empty);
        (self.status, self.headers, body).into_response()
    }
}

/// Wait for SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
