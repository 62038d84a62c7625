pub mod instances;

use axum::routing::{get, post};
use axum::{Json, Router, middleware};

use crate::auth::auth_middleware;
use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    let authed = Router::new()
        .route("/instances", get(instances::list_instances))
        .route("/instances/{id}", get(instances::get_instance))
        .route("/instances/{id}/actions", post(instances::submit_action))
        .route(
            "/instances/{id}/actions/{action_id}",
            get(instances::get_action),
        )
        .route("/instances/{id}/console", get(instances::get_console))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/healthz", get(|| async { Json(serde_json::json!({ "status": "ok" })) }))
        .merge(authed)
        .with_state(state)
}
