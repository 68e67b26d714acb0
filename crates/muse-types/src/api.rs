use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Article, Quote};

// -- JWT Claims --

/// Bearer token claims. `sub` carries the username so handlers can resolve
/// the caller without a lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminInitRequest {
    pub username: String,
    pub password: String,
    pub secret_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// -- Content --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateQuoteRequest {
    pub content: String,
    pub author: String,
    pub category: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateQuoteRequest {
    pub content: Option<String>,
    pub author: Option<String>,
    /// Absent keeps the category, `null` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    pub category: Option<Option<String>>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Today's item with the caller's favorite flag merged into the same object.
#[derive(Debug, Serialize, Deserialize)]
pub struct TodayResponse<T> {
    #[serde(flatten)]
    pub item: T,
    pub is_favorited: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

// -- Favorites --

/// Both fields are optional on the wire so that a missing or unknown value
/// is reported as a validation error instead of a body rejection.
#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub item_id: Option<i64>,
    pub item_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleFavoriteResponse {
    pub favorited: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoritesResponse {
    pub articles: Vec<Article>,
    pub quotes: Vec<Quote>,
}

// -- Notification settings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateNotificationSettingsRequest {
    pub article_enabled: bool,
    pub quote_enabled: bool,
}

/// Any value that reaches the deserializer was present in the body, so an
/// explicit `null` becomes `Some(None)`; `#[serde(default)]` covers absence.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
