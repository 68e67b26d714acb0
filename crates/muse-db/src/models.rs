//! Database row types: these map directly to SQLite rows.
//! Distinct from muse-types API models to keep the DB layer independent.

use muse_types::models::ContentKind;
use rusqlite::Row;

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub is_admin: bool,
    pub created_at: String,
}

pub struct ArticleRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub published_at: Option<String>,
    pub is_today: bool,
    pub created_at: String,
}

pub struct QuoteRow {
    pub id: i64,
    pub content: String,
    pub author: String,
    pub category: Option<String>,
    pub published_at: Option<String>,
    pub is_today: bool,
    pub created_at: String,
}

pub struct NotificationSettingsRow {
    pub username: String,
    pub article_enabled: bool,
    pub quote_enabled: bool,
    pub updated_at: String,
}

/// A row of one of the content tables. Queries select `COLUMNS` from the
/// table aliased as `c`.
pub trait ContentRow: Sized {
    const KIND: ContentKind;
    const COLUMNS: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl ContentRow for ArticleRow {
    const KIND: ContentKind = ContentKind::Article;
    const COLUMNS: &'static str =
        "c.id, c.title, c.content, c.author, c.published_at, c.is_today, c.created_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ArticleRow {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            author: row.get(3)?,
            published_at: row.get(4)?,
            is_today: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl ContentRow for QuoteRow {
    const KIND: ContentKind = ContentKind::Quote;
    const COLUMNS: &'static str =
        "c.id, c.content, c.author, c.category, c.published_at, c.is_today, c.created_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(QuoteRow {
            id: row.get(0)?,
            content: row.get(1)?,
            author: row.get(2)?,
            category: row.get(3)?,
            published_at: row.get(4)?,
            is_today: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

pub fn table(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Article => "articles",
        ContentKind::Quote => "quotes",
    }
}

// -- Write inputs --

/// Timestamps are `YYYY-MM-DD HH:MM:SS` UTC, the same shape as `datetime('now')`.
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub author: String,
    pub published_at: Option<String>,
}

#[derive(Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<String>,
}

pub struct NewQuote {
    pub content: String,
    pub author: String,
    pub category: Option<String>,
    pub published_at: Option<String>,
}

#[derive(Default)]
pub struct QuotePatch {
    pub content: Option<String>,
    pub author: Option<String>,
    /// `Some(None)` clears the category.
    pub category: Option<Option<String>>,
    pub published_at: Option<String>,
}

// -- Outcomes --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Not favorited yet and the item does not exist.
    MissingItem,
}

pub enum AdminInitOutcome {
    Created(UserRow),
    Promoted(UserRow),
    AdminExists,
    /// The username exists and the supplied password does not match it.
    WrongPassword,
}
