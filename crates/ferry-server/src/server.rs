//! `FerryServer` — Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::HeaderMap;
use axum::response::{Json, Response};
use axum::routing::{delete, get, post};
use ferry_core::{Clock, ConnectionId};
use ferry_events::EventLogs;
use ferry_presence::{PresenceRegistry, SessionRegistry};
use ferry_settings::FerrySettings;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::health::{self, HealthResponse};
use crate::http::{files, sessions, system};
use crate::shutdown::ShutdownCoordinator;
use crate::storage::BlobStore;
use crate::websocket::broadcast::BroadcastManager;
use crate::websocket::gateway::run_ws_session;
use crate::websocket::lifecycle::ConnectionLifecycle;
use crate::websocket::sweep::run_sweep_loop;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session registry.
    pub sessions: Arc<SessionRegistry>,
    /// Device presence registry.
    pub presence: Arc<PresenceRegistry>,
    /// File and device event rings.
    pub events: Arc<EventLogs>,
    /// Fan-out manager.
    pub broadcast: Arc<BroadcastManager>,
    /// Connection lifecycle controller.
    pub lifecycle: Arc<ConnectionLifecycle>,
    /// Blob store.
    pub store: Arc<BlobStore>,
    /// Loaded settings.
    pub settings: Arc<FerrySettings>,
    /// When the server started.
    pub start_time: Instant,
}

/// The main Ferry server.
pub struct FerryServer {
    state: AppState,
    shutdown: Arc<ShutdownCoordinator>,
}

impl FerryServer {
    /// Wire up all components from settings and a clock.
    #[must_use]
    pub fn new(settings: FerrySettings, clock: Arc<dyn Clock>) -> Self {
        let sessions = Arc::new(SessionRegistry::with_ttl(
            clock.clone(),
            settings.presence.session_ttl_secs,
        ));
        let presence = Arc::new(PresenceRegistry::new(sessions.clone(), clock.clone()));
        let events = Arc::new(EventLogs::new(clock.clone()));
        let broadcast = Arc::new(BroadcastManager::new(clock.clone()));
        let lifecycle = Arc::new(ConnectionLifecycle::new(
            presence.clone(),
            events.clone(),
            broadcast.clone(),
        ));
        let store = Arc::new(BlobStore::new(
            &settings.files.resolved_data_dir(),
            settings.files.allowed_extensions.clone(),
        ));

        let state = AppState {
            sessions,
            presence,
            events,
            broadcast,
            lifecycle,
            store,
            settings: Arc::new(settings),
            start_time: Instant::now(),
        };

        Self {
            state,
            shutdown: Arc::new(ShutdownCoordinator::new()),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let max_upload = self.state.settings.files.max_upload_bytes;
        #[allow(clippy::cast_possible_truncation)]
        let body_limit = if max_upload == 0 {
            DefaultBodyLimit::disable()
        } else {
            DefaultBodyLimit::max(max_upload as usize)
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(ws_handler))
            .route("/api/session/create", post(sessions::create))
            .route("/api/session/validate", post(sessions::validate))
            .route("/api/session/active", get(sessions::active))
            .route("/api/devices", get(system::devices))
            .route("/api/events", get(system::file_events))
            .route("/api/device-events", get(system::device_events))
            .route("/api/system-info", get(system::system_info))
            .route("/api/config", get(system::config))
            .route("/api/qr", get(system::qr_code))
            .route("/api/files", get(files::list))
            .route("/api/files/search", get(files::search))
            .route("/api/files/cleanup", post(files::cleanup))
            .route("/api/files/{filename}", delete(files::delete))
            .route("/api/upload", post(files::upload_phone))
            .route("/api/upload-pc", post(files::upload_pc))
            .route("/api/download/{filename}", get(files::download))
            .layer(body_limit)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Spawn the background sweep loop, registered with the shutdown
    /// coordinator.
    pub fn spawn_sweep(&self) {
        let lifecycle = self.state.lifecycle.clone();
        let interval = Duration::from_secs(self.state.settings.presence.sweep_interval_secs);
        let threshold = self.state.settings.presence.heartbeat_timeout_secs;
        let cancel = self.shutdown.token();
        self.shutdown
            .register(tokio::spawn(run_sweep_loop(
                lifecycle, interval, threshold, cancel,
            )));
    }

    /// Get the shared state.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the shutdown coordinator.
    #[must_use]
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let resp = health::health_check(
        state.start_time,
        state.broadcast.connection_count(),
        state.sessions.count(),
    );
    Json(resp)
}

/// GET /ws — upgrade to a WebSocket session.
async fn ws_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    upgrade: WebSocketUpgrade,
) -> Response {
    let device_info = sessions::device_from_request(&headers, addr);
    let connection_id = ConnectionId::new();
    upgrade.on_upgrade(move |socket| run_ws_session(socket, connection_id, device_info, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request, StatusCode};
    use ferry_core::SystemClock;
    use tower::ServiceExt;

    fn make_server() -> (FerryServer, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let settings = FerrySettings {
            files: ferry_settings::FileSettings {
                data_dir: Some(tmp.path().to_string_lossy().into_owned()),
                ..ferry_settings::FileSettings::default()
            },
            ..FerrySettings::default()
        };
        (FerryServer::new(settings, Arc::new(SystemClock)), tmp)
    }

    fn make_router(server: &FerryServer) -> Router {
        server
            .router()
            .layer(MockConnectInfo(SocketAddr::from(([10, 0, 0, 2], 40_000))))
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (server, _tmp) = make_server();
        let app = make_router(&server);

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["connections"], 0);
        assert_eq!(parsed["active_sessions"], 0);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (server, _tmp) = make_server();
        let app = make_router(&server);

        let req = Request::builder()
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ws_route_requires_upgrade() {
        let (server, _tmp) = make_server();
        let app = make_router(&server);

        // A plain GET without upgrade headers is rejected.
        let req = Request::builder().uri("/ws").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_ne!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn state_components_are_shared() {
        let (server, _tmp) = make_server();
        let state = server.state();
        assert_eq!(state.presence.count(), 0);
        assert_eq!(state.sessions.count(), 0);
        assert_eq!(state.broadcast.connection_count(), 0);
    }

    #[tokio::test]
    async fn sweep_task_registers_and_shuts_down() {
        let (server, _tmp) = make_server();
        server.spawn_sweep();
        server.shutdown().graceful_shutdown(None).await;
        assert!(server.shutdown().is_shutting_down());
    }
}
