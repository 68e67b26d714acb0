use axum::{Extension, Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};

use muse_types::api::{Claims, UpdateNotificationSettingsRequest};

use crate::convert::settings_model;
use crate::error::ApiError;
use crate::{AppState, run_db};

/// Reading settings creates the default row if the user has none yet.
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_db(&state, move |db| db.get_or_create_settings(&claims.sub)).await?;
    Ok(Json(settings_model(row)))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateNotificationSettingsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let row = run_db(&state, move |db| {
        db.upsert_settings(&claims.sub, req.article_enabled, req.quote_enabled)
    })
    .await?;
    Ok(Json(settings_model(row)))
}
