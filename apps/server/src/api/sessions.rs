use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use companions_core::{
    companions::Companion,
    identity::ResolvedIdentity,
    session_history::{SessionHistoryEntry, SessionHistoryServiceTrait},
};
use serde::Deserialize;

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

async fn record_session(
    Path(companion_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<ResolvedIdentity>,
) -> ApiResult<(StatusCode, Json<SessionHistoryEntry>)> {
    let entry = state
        .session_history_service(identity)
        .record_session(&companion_id)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_recent_sessions(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<ResolvedIdentity>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<Companion>>> {
    let companions = state
        .session_history_service(identity)
        .get_recent_sessions(query.limit)
        .await?;
    Ok(Json(companions))
}

async fn get_user_sessions(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<ResolvedIdentity>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<Companion>>> {
    let companions = state
        .session_history_service(identity)
        .get_user_sessions(&user_id, query.limit)
        .await?;
    Ok(Json(companions))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/companions/{id}/sessions", post(record_session))
        .route("/sessions/recent", get(get_recent_sessions))
        .route("/users/{user_id}/sessions", get(get_user_sessions))
}
