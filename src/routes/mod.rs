// HTTP routes: dashboard page, JSON state, version

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::backends::Backends;
use crate::config::AppConfig;
use crate::render::Renderer;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) backends: Arc<Backends>,
    pub(crate) renderer: Arc<Renderer>,
}

pub fn app(config: AppConfig, backends: Backends, renderer: Renderer) -> Router {
    let state = AppState {
        config: Arc::new(config),
        backends: Arc::new(backends),
        renderer: Arc::new(renderer),
    };
    Router::new()
        .route("/", get(http::dashboard_handler)) // GET /
        .route("/api/state", get(http::state_handler)) // GET /api/state
        .route("/version", get(http::version_handler)) // GET /version
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
