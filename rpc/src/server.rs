//! Axum-based HTTP server.

use std::net::SocketAddr;

use axum::extract::{MatchedPath, Request, State};
use axum::http::{HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use dailyread_utils::spans::http_span;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;

use crate::{handlers, AppState, RpcError, SESSION_HEADER};

/// Build the full router. Session resolution only runs on routes that read
/// or write the session, so health checks and content fetches never mint one.
pub fn build_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/api/captcha", get(handlers::captcha))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/me", get(handlers::me))
        .route("/api/auth/register/send-code", post(handlers::send_registration_code))
        .route("/api/auth/password-reset/request", post(handlers::request_password_reset))
        .route("/api/auth/email-change/request", post(handlers::request_email_change))
        .route("/api/auth/email-change/confirm", post(handlers::confirm_email_change))
        .route_layer(middleware::from_fn_with_state(state.clone(), with_session));

    let stateless_routes = Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/password-reset/confirm", post(handlers::confirm_password_reset))
        .route("/api/daily", get(handlers::daily))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn(traced));

    Router::new()
        .merge(session_routes)
        .merge(stateless_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any)
                .expose_headers([SESSION_HEADER]),
        )
        .with_state(state)
}

fn action(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

async fn traced(request: Request, next: Next) -> Response {
    let span = http_span(&action(&request));
    next.run(request).instrument(span).await
}

/// Resolve the caller's session, hand it to the handler and echo its id.
async fn with_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(&SESSION_HEADER)
        .and_then(|value| value.to_str().ok());
    let session = state.sessions.resolve(presented);
    let id = HeaderValue::from_str(session.id());
    let span = http_span(&action(&request));
    request.extensions_mut().insert(session);

    let mut response = next.run(request).instrument(span).await;
    if let Ok(id) = id {
        response.headers_mut().insert(SESSION_HEADER, id);
    }
    response
}

pub struct RpcServer {
    pub port: u16,
    state: AppState,
}

impl RpcServer {
    pub fn with_state(port: u16, state: AppState) -> Self {
        Self { port, state }
    }

    /// Bind to the configured port on all interfaces and serve.
    pub async fn start(&self) -> Result<(), RpcError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {addr}: {e}")))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), RpcError> {
        let addr = listener
            .local_addr()
            .map_err(|e| RpcError::Server(e.to_string()))?;
        tracing::info!(%addr, "HTTP API listening");
        axum::serve(listener, build_router(self.state.clone()))
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
