// GET handlers: dashboard, api/state, version

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Instant;

use super::AppState;
use crate::aggregator::{AggregateResult, aggregate};
use crate::ordering::deep_sort_by_key;
use crate::view::{DashboardView, ViewContext};

/// Package version and name (from Cargo.toml at build time).
const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Debug, Default, Deserialize)]
pub(super) struct StateParams {
    /// Comma-separated tags to leave out of this request.
    exclude: Option<String>,
}

impl StateParams {
    fn excluded_tags(&self) -> HashSet<String> {
        self.exclude
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

async fn run_aggregation(state: &AppState, excluded: &HashSet<String>) -> AggregateResult {
    let started = Instant::now();
    let result = aggregate(
        &state.backends,
        &state.config.backends,
        excluded,
        state.config.aggregation.api_kind,
        &state.config.aggregate_options(),
    )
    .await;
    tracing::info!(
        api_kind = %state.config.aggregation.api_kind,
        instances = state.config.backends.len(),
        excluded = excluded.len(),
        hosts = result.state.len(),
        errors = result.errors.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "aggregated backend state"
    );
    for error in &result.errors {
        tracing::warn!("{}", error);
    }
    result
}

/// GET /: HTML dashboard of hosts and services that are not OK.
pub(super) async fn dashboard_handler(
    State(state): State<AppState>,
    Query(params): Query<StateParams>,
) -> Response {
    let excluded = params.excluded_tags();
    let result = run_aggregation(&state, &excluded).await;
    let ctx = ViewContext {
        title: state.config.dashboard.title.clone(),
        refresh_secs: state.config.dashboard.refresh_secs,
        instance_count: state.config.backends.len(),
        known_tags: state.config.known_tags(),
        excluded_tags: excluded.into_iter().collect(),
    };
    let view = DashboardView::build(&result, ctx, chrono::Utc::now().timestamp());
    match state.renderer.render_dashboard(&view) {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "dashboard render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "render failed").into_response()
        }
    }
}

/// GET /api/state: merged state, column mapping, errors and transport stats; keys sorted at every level.
pub(super) async fn state_handler(
    State(state): State<AppState>,
    Query(params): Query<StateParams>,
) -> Response {
    let result = run_aggregation(&state, &params.excluded_tags()).await;
    match serde_json::to_value(&result) {
        Ok(mut body) => {
            deep_sort_by_key(&mut body);
            axum::Json(body).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "state serialization failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /version: returns service name and version.
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}
