pub mod auth;
pub mod conversations;
pub mod error;
pub mod healthz;
pub mod tasks;
pub mod tools;
pub mod ws;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

/// Builds the full API router. `/healthz` is public; everything else sits
/// behind the bearer-token middleware (a no-op when dev mode is enabled).
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/healthz", get(healthz::healthz));

    let protected = Router::new()
        .route("/conversations", post(conversations::create_conversation))
        .route("/conversations/:id", get(conversations::get_conversation))
        .route("/conversations/:id", delete(conversations::delete_conversation))
        .route("/users/:user_id/conversations", get(conversations::list_conversations_for_user))
        .route("/tasks", post(tasks::create_task))
        .route("/tasks/:id", get(tasks::get_task))
        .route("/tasks/resume", post(tasks::resume_task))
        .route("/tools", get(tools::list_tools))
        .route("/tools/:name", get(tools::get_tool))
        .route("/ws/:conversation_id", get(ws::ws_upgrade))
        .route_layer(middleware::from_fn_with_state(state, auth::require_api_token));

    public
        .merge(protected)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
