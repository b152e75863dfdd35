//! `ParlorServer` — Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum_extra::extract::CookieJar;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use parlor_auth::IdentityBinder;

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::lifecycle::run_session;
use crate::registry::ConnectionRegistry;
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live connection registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Message broadcaster over the registry.
    pub broadcaster: Arc<Broadcaster>,
    /// Identity binder for inbound credentials.
    pub binder: Arc<IdentityBinder>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
}

/// The Parlor chat hub server.
pub struct ParlorServer {
    config: Arc<ServerConfig>,
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
    binder: Arc<IdentityBinder>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl ParlorServer {
    /// Create a new server over an identity binder.
    #[must_use]
    pub fn new(config: ServerConfig, binder: IdentityBinder) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(
            registry.clone(),
            config.backpressure_drop_limit,
        ));
        Self {
            config: Arc::new(config),
            registry,
            broadcaster,
            binder: Arc::new(binder),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            broadcaster: self.broadcaster.clone(),
            binder: self.binder.clone(),
            shutdown: self.shutdown.clone(),
            config: self.config.clone(),
            start_time: self.start_time,
        };

        Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve. Returns the bound address and the serve task handle;
    /// the task ends when the shutdown token fires.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
        let router = self.router();
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        let token = self.shutdown.token();

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
        });

        info!(addr = %local_addr, "parlor hub listening");
        Ok((local_addr, handle))
    }

    /// Get the connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /ws — cookie-authenticated WebSocket upgrade.
///
/// Identity is bound exactly once, here, before the socket is admitted
/// anywhere. A failed bind is a protocol-level rejection (401 with a small
/// JSON body, as the original middleware answered); the connection goes
/// `Connecting → Closed` without ever touching the registry.
async fn ws_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    // Admission and authentication run before the upgrade is even looked
    // at, the way the original middleware sat in front of the socket
    // handler. A request failing either never reaches the transport.
    if state.registry.count() >= state.config.max_connections {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"message": "server full", "status": "error"})),
        )
            .into_response();
    }

    let credential = jar
        .get(&state.config.session_cookie)
        .map(|c| c.value().to_owned());

    let identity = match state.binder.bind(credential.as_deref()).await {
        Ok(identity) => identity,
        Err(e) => {
            info!(error = %e, "rejecting unauthenticated connection");
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"message": "unauthorized", "status": "error"})),
            )
                .into_response();
        }
    };

    match ws {
        Ok(upgrade) => {
            let registry = state.registry.clone();
            let broadcaster = state.broadcaster.clone();
            let config = (*state.config).clone();
            upgrade
                .max_message_size(state.config.max_message_size)
                .on_upgrade(move |socket| {
                    run_session(socket, identity, registry, broadcaster, config)
                })
                .into_response()
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.registry.count(),
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use parlor_auth::{MemoryAccounts, Profile};
    use parlor_core::UserId;

    fn make_server(max_connections: usize) -> ParlorServer {
        let accounts = Arc::new(MemoryAccounts::new());
        accounts.insert(
            "sess-ann",
            UserId::from("u1"),
            Profile {
                display_name: "Ann".into(),
                avatar_url: Some("/a.png".into()),
            },
        );
        let binder = IdentityBinder::new(accounts.clone(), accounts);
        let config = ServerConfig {
            max_connections,
            ..ServerConfig::default()
        };
        ParlorServer::new(config, binder)
    }

    fn upgrade_request(cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri("/ws")
            .header("host", "localhost")
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .header("sec-websocket-version", "13")
            .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let app = make_server(8).router();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["connections"], 0);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = make_server(8).router();
        let req = Request::builder()
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upgrade_without_cookie_rejected() {
        let app = make_server(8).router();
        let resp = app.oneshot(upgrade_request(None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "error");
    }

    #[tokio::test]
    async fn upgrade_with_unknown_cookie_rejected() {
        let app = make_server(8).router();
        let resp = app
            .oneshot(upgrade_request(Some("session_username=sess-nobody")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upgrade_with_valid_cookie_passes_auth() {
        // A oneshot request carries no upgradable connection, so a request
        // that clears auth falls through to the upgrade rejection (426)
        // instead of 401/503. Real handshakes are covered by the
        // integration tests.
        let app = make_server(8).router();
        let resp = app
            .oneshot(upgrade_request(Some("session_username=sess-ann")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UPGRADE_REQUIRED);
    }

    #[tokio::test]
    async fn upgrade_past_capacity_rejected() {
        let server = make_server(0);
        let app = server.router();
        let resp = app
            .oneshot(upgrade_request(Some("session_username=sess-ann")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn accessors() {
        let server = make_server(8);
        assert_eq!(server.registry().count(), 0);
        assert!(!server.shutdown().is_shutting_down());
        assert_eq!(server.config().max_connections, 8);
    }
}
