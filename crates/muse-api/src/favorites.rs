use axum::{Extension, Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};
use tracing::debug;

use muse_db::models::{ArticleRow, QuoteRow, ToggleOutcome};
use muse_types::api::{Claims, FavoritesResponse, ToggleFavoriteRequest, ToggleFavoriteResponse};
use muse_types::models::ContentKind;

use crate::convert::ToModel;
use crate::error::ApiError;
use crate::{AppState, run_db};

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<ToggleFavoriteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let kind = req
        .item_type
        .as_deref()
        .ok_or_else(|| ApiError::Validation("item_type is required".into()))?
        .parse::<ContentKind>()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let item_id = match req.item_id {
        Some(id) if id > 0 => id,
        Some(_) => return Err(ApiError::Validation("item_id must be positive".into())),
        None => return Err(ApiError::Validation("item_id is required".into())),
    };

    let username = claims.sub;
    let user = username.clone();
    let outcome = run_db(&state, move |db| db.toggle_favorite(&user, item_id, kind)).await?;

    let favorited = match outcome {
        ToggleOutcome::Added => true,
        ToggleOutcome::Removed => false,
        ToggleOutcome::MissingItem => {
            return Err(ApiError::NotFound(format!("{} {} not found", kind, item_id)));
        }
    };
    debug!("{} toggled favorite {} {} -> {}", username, kind, item_id, favorited);

    Ok(Json(ToggleFavoriteResponse { favorited }))
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let (articles, quotes) = run_db(&state, move |db| {
        let articles = db.list_favorites::<ArticleRow>(&claims.sub)?;
        let quotes = db.list_favorites::<QuoteRow>(&claims.sub)?;
        Ok((articles, quotes))
    })
    .await?;

    Ok(Json(FavoritesResponse {
        articles: articles.into_iter().map(ToModel::to_model).collect(),
        quotes: quotes.into_iter().map(ToModel::to_model).collect(),
    }))
}
