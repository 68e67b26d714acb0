use axum::{
    Extension, Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};

use muse_db::models::{ArticlePatch, ArticleRow, NewArticle, NewQuote, QuotePatch, QuoteRow};
use muse_types::api::{
    Claims, CreateArticleRequest, CreateQuoteRequest, MessageResponse, Page, TodayResponse,
    UpdateArticleRequest, UpdateQuoteRequest,
};
use muse_types::models::ContentKind;

use crate::convert::{ToModel, to_sqlite_timestamp};
use crate::error::ApiError;
use crate::{AppState, run_db};

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

// -- Today --

pub async fn article_today(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    today::<ArticleRow>(&state, claims.sub).await
}

pub async fn quote_today(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    today::<QuoteRow>(&state, claims.sub).await
}

async fn today<R: ToModel>(
    state: &AppState,
    username: String,
) -> Result<Json<TodayResponse<R::Model>>, ApiError> {
    let kind = R::KIND;
    let item = run_db(state, |db| db.get_today::<R>())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no today {}", kind)))?;

    // A failed favorite lookup should not cost the caller today's item
    let item_id = item.id();
    let is_favorited = run_db(state, move |db| db.is_favorited(&username, item_id, kind))
        .await
        .unwrap_or_else(|e| {
            warn!("Favorite lookup for today {} {} failed: {}", kind, item_id, e);
            false
        });

    Ok(Json(TodayResponse {
        item: item.to_model(),
        is_favorited,
    }))
}

// -- Listing --

pub async fn list_articles(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    list::<ArticleRow>(&state, query).await
}

pub async fn list_quotes(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    list::<QuoteRow>(&state, query).await
}

async fn list<R: ToModel>(
    state: &AppState,
    query: PageQuery,
) -> Result<Json<Page<R::Model>>, ApiError> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
    let offset = u64::from(page - 1) * u64::from(limit);

    let (rows, total) = run_db(state, move |db| db.list_content::<R>(offset, limit)).await?;

    Ok(Json(Page {
        items: rows.into_iter().map(ToModel::to_model).collect(),
        page,
        limit,
        total,
    }))
}

// -- Admin: articles --

pub async fn create_article(
    State(state): State<AppState>,
    payload: Result<Json<CreateArticleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let new = NewArticle {
        title: required("title", req.title)?,
        content: required("content", req.content)?,
        author: required("author", req.author)?,
        published_at: req.published_at.map(to_sqlite_timestamp),
    };

    let row = run_db(&state, move |db| db.create_article(&new)).await?;
    info!("Created article {}", row.id);

    Ok((StatusCode::CREATED, Json(row.to_model())))
}

pub async fn update_article(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateArticleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let patch = ArticlePatch {
        title: optional("title", req.title)?,
        content: optional("content", req.content)?,
        author: optional("author", req.author)?,
        published_at: req.published_at.map(to_sqlite_timestamp),
    };

    let row = run_db(&state, move |db| db.update_article(id, &patch))
        .await?
        .ok_or_else(|| not_found(ContentKind::Article, id))?;

    Ok(Json(row.to_model()))
}

// -- Admin: quotes --

pub async fn create_quote(
    State(state): State<AppState>,
    payload: Result<Json<CreateQuoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let new = NewQuote {
        content: required("content", req.content)?,
        author: required("author", req.author)?,
        category: optional("category", req.category)?,
        published_at: req.published_at.map(to_sqlite_timestamp),
    };

    let row = run_db(&state, move |db| db.create_quote(&new)).await?;
    info!("Created quote {}", row.id);

    Ok((StatusCode::CREATED, Json(row.to_model())))
}

pub async fn update_quote(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateQuoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let patch = QuotePatch {
        content: optional("content", req.content)?,
        author: optional("author", req.author)?,
        category: req
            .category
            .map(|category| optional("category", category))
            .transpose()?,
        published_at: req.published_at.map(to_sqlite_timestamp),
    };

    let row = run_db(&state, move |db| db.update_quote(id, &patch))
        .await?
        .ok_or_else(|| not_found(ContentKind::Quote, id))?;

    Ok(Json(row.to_model()))
}

// -- Admin: shared --

pub async fn delete_article(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    delete(&state, ContentKind::Article, id).await
}

pub async fn delete_quote(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    delete(&state, ContentKind::Quote, id).await
}

async fn delete(
    state: &AppState,
    kind: ContentKind,
    id: i64,
) -> Result<Json<MessageResponse>, ApiError> {
    if !run_db(state, move |db| db.delete_content(kind, id)).await? {
        return Err(not_found(kind, id));
    }
    info!("Deleted {} {}", kind, id);
    Ok(Json(MessageResponse::new(format!("{} {} deleted", kind, id))))
}

pub async fn set_today_article(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    set_today(&state, ContentKind::Article, id).await
}

pub async fn set_today_quote(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    set_today(&state, ContentKind::Quote, id).await
}

/// Manual rotation. The reset is applied even when `id` is unknown.
async fn set_today(
    state: &AppState,
    kind: ContentKind,
    id: i64,
) -> Result<Json<MessageResponse>, ApiError> {
    if !run_db(state, move |db| db.set_today(kind, id)).await? {
        warn!("Manual rotation to missing {} {}; no today {} until next rotation", kind, id, kind);
        return Err(not_found(kind, id));
    }
    info!("Manual rotation: today {} is now {}", kind, id);
    Ok(Json(MessageResponse::new(format!("today {} set to {}", kind, id))))
}

fn not_found(kind: ContentKind, id: i64) -> ApiError {
    ApiError::NotFound(format!("{} {} not found", kind, id))
}

fn required(field: &str, value: String) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn optional(field: &str, value: Option<String>) -> Result<Option<String>, ApiError> {
    value.map(|v| required(field, v)).transpose()
}
