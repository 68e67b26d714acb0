use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two kinds of rotating content. Serialized as `"article"` / `"quote"`,
/// which is also the `item_type` stored on favorites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Article,
    Quote,
}

impl ContentKind {
    pub const ALL: [ContentKind; 2] = [ContentKind::Article, ContentKind::Quote];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Article => "article",
            ContentKind::Quote => "quote",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item type '{0}'")]
pub struct UnknownContentKind(pub String);

impl FromStr for ContentKind {
    type Err = UnknownContentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(ContentKind::Article),
            "quote" => Ok(ContentKind::Quote),
            other => Err(UnknownContentKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub is_today: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub content: String,
    pub author: String,
    pub category: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub is_today: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-user notification preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub username: String,
    pub article_enabled: bool,
    pub quote_enabled: bool,
    pub updated_at: DateTime<Utc>,
}
