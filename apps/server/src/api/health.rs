use std::sync::Arc;

use crate::main_lib::AppState;
use axum::{routing::get, Json, Router};
use companions_core::companions::SUBJECTS;

pub async fn healthz() -> &'static str {
    "ok"
}

/// Subjects a companion can be created for.
async fn list_subjects() -> Json<Vec<&'static str>> {
    Json(SUBJECTS.to_vec())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/subjects", get(list_subjects))
}
