use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use vps_control::{ConsoleAccess, Page, ResourceDetail, ResourceSummary};
use vps_infra::types::ActionRef;

use crate::auth::UserId;
use crate::dto::{ListQuery, SubmitActionRequest};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

pub async fn list_instances(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Page<ResourceSummary>>, ApiError> {
    let page = state
        .orchestrator
        .list(
            user_id.0,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(ListQuery::DEFAULT_LIMIT),
        )
        .await?;
    Ok(Json(page))
}

pub async fn get_instance(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ResourceDetail>, ApiError> {
    let detail = state.orchestrator.get_detail(user_id.0, id).await?;
    Ok(Json(detail))
}

pub async fn submit_action(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SubmitActionRequest>,
) -> Result<(StatusCode, Json<ActionRef>), ApiError> {
    let action = state
        .orchestrator
        .submit_action(user_id.0, id, req.action)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(action)))
}

pub async fn get_action(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    ApiPath((id, action_id)): ApiPath<(Uuid, u64)>,
) -> Result<Json<ActionRef>, ApiError> {
    let action = state
        .orchestrator
        .poll_action_status(user_id.0, id, action_id)
        .await?;
    Ok(Json(action))
}

pub async fn get_console(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ConsoleAccess>, ApiError> {
    let console = state.orchestrator.get_console_url(user_id.0, id).await?;
    Ok(Json(console))
}
