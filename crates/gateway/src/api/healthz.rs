//! `GET /healthz` — liveness/readiness probe.

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let issues = state.config.validate();
    let config_ok = !issues.iter().any(|i| i.severity == pax_domain::config::ConfigSeverity::Error);
    let store_ok = std::path::Path::new(&state.config.storage.state_path).exists();

    let ok = config_ok && store_ok;
    let status = if ok {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(serde_json::json!({ "ok": ok, "config_ok": config_ok, "store_ok": store_ok })))
}
