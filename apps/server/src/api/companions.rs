use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use companions_core::{
    companions::{Companion, CompanionForm, CompanionServiceTrait, ListCompanionsOptions},
    errors::{Error as CoreError, ValidationError},
    identity::ResolvedIdentity,
    submission::{SubmissionOutcome, SubmissionWorkflow},
};

/// Runs the submission workflow for one form; answers `201` with the detail
/// path in `Location`.
async fn create_companion(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<ResolvedIdentity>,
    Json(form): Json<CompanionForm>,
) -> ApiResult<Response> {
    let workflow = SubmissionWorkflow::new(state.companion_service(identity));
    match workflow.submit(&form).await {
        SubmissionOutcome::Navigate {
            companion,
            location,
        } => Ok((
            StatusCode::CREATED,
            [(header::LOCATION, location)],
            Json(companion),
        )
            .into_response()),
        SubmissionOutcome::Invalid(errors) => {
            Err(CoreError::from(ValidationError::InvalidFields(errors)).into())
        }
        SubmissionOutcome::SignInRequired => Err(CoreError::AuthRequired.into()),
        SubmissionOutcome::Failed { message } => Err(ApiError::Upstream(message)),
        SubmissionOutcome::NotIdle(phase) => Err(ApiError::Conflict(format!(
            "Submission refused while {:?}",
            phase
        ))),
    }
}

async fn list_companions(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<ResolvedIdentity>,
    Query(options): Query<ListCompanionsOptions>,
) -> ApiResult<Json<Vec<Companion>>> {
    let companions = state
        .companion_service(identity)
        .list_companions(options)
        .await?;
    Ok(Json(companions))
}

async fn get_companion(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<ResolvedIdentity>,
) -> ApiResult<Json<Companion>> {
    state
        .companion_service(identity)
        .get_companion(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/companions", get(list_companions).post(create_companion))
        .route("/companions/{id}", get(get_companion))
}
