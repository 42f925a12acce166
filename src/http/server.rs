//! HTTP server setup and the relay handler.
//!
//! # Responsibilities
//! - Create Axum Router with the relay handler on every path
//! - Wire up middleware (request ID, tracing, body limit, timeout)
//! - Bind server to listener, shut down gracefully
//! - Run the relay pipeline: policy → info page | preflight | forward

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::error::{RelayError, StartupError};
use crate::http::forwarder::Forwarder;
use crate::http::info::{info_response, InfoContext};
use crate::http::request::{self, CallerInfo, RelayRequestId};
use crate::http::response::{apply_cors, preflight_response, relay_response};
use crate::observability::metrics::{self, Outcome};
use crate::security::{sanitize_headers, HeaderOverlay, PolicyFilter};

/// Slack between the outbound deadline and the whole-request deadline, so
/// an upstream timeout surfaces as the relay's own 500 first.
const REQUEST_DEADLINE_SLACK_SECS: u64 = 5;

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub policy: Arc<PolicyFilter>,
    pub forwarder: Forwarder,
}

impl AppState {
    /// Compile the policy and build the outbound client.
    pub fn from_config(config: RelayConfig) -> Result<Self, StartupError> {
        let policy = PolicyFilter::from_config(&config.policy)?;
        let forwarder = Forwarder::new(&config.timeouts).map_err(StartupError::Client)?;
        Ok(Self {
            config: Arc::new(config),
            policy: Arc::new(policy),
            forwarder,
        })
    }

    fn policy_sizes(&self) -> (usize, usize) {
        (
            self.config.policy.blacklist_urls.len(),
            self.config.policy.whitelist_origins.len(),
        )
    }
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, StartupError> {
        let state = AppState::from_config(config)?;
        Ok(Self::with_state(state))
    }

    pub fn with_state(state: AppState) -> Self {
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let deadline = Duration::from_secs(
            state.config.timeouts.request_secs + REQUEST_DEADLINE_SLACK_SECS,
        );
        let max_body = state.config.limits.max_body_bytes;

        Router::new()
            .route("/", any(relay_handler))
            .route("/{*path}", any(relay_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(deadline))
            .layer(RequestBodyLimitLayer::new(max_body))
            .layer(middleware::from_fn(cors_fallback))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RelayRequestId))
    }

    /// The router, for driving the relay without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let (blacklist, whitelist) = self.state.policy_sizes();
        tracing::info!(
            address = %addr,
            blacklist_patterns = blacklist,
            whitelist_patterns = whitelist,
            "HTTP server starting"
        );

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

/// Main relay handler.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request::request_id(request.headers());
    let method = request.method().clone();
    let method_str = method.to_string();

    let target = request::target_url(request.uri());
    let origin_value = request.headers().get(header::ORIGIN).cloned();
    let origin = request::header_text(request.headers(), header::ORIGIN.as_str());

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        target = ?target,
        origin = ?origin,
        "Relay request"
    );

    let (outcome, mut response) = if !state
        .policy
        .permitted(target.as_deref().unwrap_or(""), origin.as_deref())
    {
        tracing::info!(
            request_id = %request_id,
            target = ?target,
            origin = ?origin,
            "Request rejected by policy"
        );
        (Outcome::Rejected, RelayError::PolicyRejected.into_response())
    } else if let Some(target) = target {
        if method == Method::OPTIONS {
            (
                Outcome::Preflight,
                preflight_response(
                    request.headers(),
                    state.config.cors.preflight_max_age_secs,
                ),
            )
        } else {
            match forward(&state, request, &target).await {
                Ok(response) => (Outcome::Forwarded, response),
                Err(e) => {
                    tracing::warn!(
                        request_id = %request_id,
                        target = %target,
                        error = %crate::error::error_chain(&e),
                        "Relay failed"
                    );
                    (Outcome::Failed, e.into_response())
                }
            }
        }
    } else {
        let ctx = InfoContext {
            own_origin: request::own_origin(request.headers()),
            origin: origin.clone(),
            caller: CallerInfo::from_request(&request, &state.config.info.connecting_ip_header),
            overlay: HeaderOverlay::from_headers(request.headers()),
        };
        (Outcome::Info, info_response(&state.config, &ctx))
    };

    // Forwarded and preflight responses already carry these; everything
    // else still needs them so browser script can read the answer.
    apply_cors(response.headers_mut(), origin_value.as_ref());

    let status = response.status().as_u16();
    tracing::debug!(
        request_id = %request_id,
        status = status,
        outcome = outcome.as_str(),
        "Relay response"
    );
    metrics::record_request(&method_str, status, outcome, start_time);
    response
}

/// Attach CORS headers to answers the timeout and body-limit layers produce
/// without reaching the handler.
async fn cors_fallback(request: Request<Body>, next: Next) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();
    let mut response = next.run(request).await;
    if !response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    {
        apply_cors(response.headers_mut(), origin.as_ref());
    }
    response
}

/// Sanitize, forward and rewrite one request.
async fn forward(
    state: &AppState,
    request: Request<Body>,
    target: &str,
) -> Result<Response, RelayError> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(RelayError::RequestBody)?;

    let overlay = HeaderOverlay::from_headers(&parts.headers);
    let headers = sanitize_headers(&parts.headers, overlay.as_ref());
    let origin = parts.headers.get(header::ORIGIN);

    let upstream = state
        .forwarder
        .forward(parts.method.clone(), target, headers, body)
        .await?;
    Ok(relay_response(upstream, &parts.method, origin))
}
