//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all proxy handler
//! - Wire up middleware (tracing, request ID)
//! - Select a target per request and forward to it
//! - Report forwarding failures to the error monitor
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnFailure, TraceLayer},
};
use tracing::Level;

use crate::config::TimeoutConfig;
use crate::health::{ErrorMonitor, HealthState};
use crate::http::request::{request_id, upstream_request, UuidRequestId, X_REQUEST_ID};
use crate::http::response::{relay, ForwardError};
use crate::load_balancer::{select_target, Endpoint};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub health: Arc<HealthState>,
    pub errors: Arc<ErrorMonitor>,
    pub client: Client<HttpConnector, Body>,
    pub request_timeout: Duration,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server that forwards according to `health` and reports
    /// failures to `errors`.
    pub fn new(timeouts: &TimeoutConfig, health: Arc<HealthState>, errors: Arc<ErrorMonitor>) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            health,
            errors,
            client,
            request_timeout: timeouts.request,
        };

        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            // proxy_handler logs forwarding failures itself.
            .layer(TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::DEBUG)))
            .layer(SetRequestIdLayer::new(x_request_id, UuidRequestId))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Starting reverse proxy");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Selects the fastest endpoint (or the fallback) and forwards the request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let target = select_target(&state.health);

    let request_id = request_id(&request).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        target = %target,
        "Proxying request"
    );

    match forward(&state, request, &target, client).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                target = %target,
                status = %e.status(),
                error = %e,
                "http: proxy error"
            );
            state.errors.report_failure();
            e.into_response()
        }
    }
}

async fn forward(
    state: &AppState,
    request: Request<Body>,
    target: &Endpoint,
    client: Option<SocketAddr>,
) -> Result<Response, ForwardError> {
    let upstream = upstream_request(request, target, client)?;

    match time::timeout(state.request_timeout, state.client.request(upstream)).await {
        Ok(Ok(response)) => Ok(relay(response)),
        Ok(Err(e)) => Err(ForwardError::Upstream(e)),
        Err(_) => Err(ForwardError::Timeout(state.request_timeout)),
    }
}
