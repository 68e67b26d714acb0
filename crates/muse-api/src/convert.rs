//! Row-to-model conversion for responses.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::warn;

use muse_db::models::{ArticleRow, ContentRow, NotificationSettingsRow, QuoteRow};
use muse_types::models::{Article, NotificationSettings, Quote};

const SQLITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A content row that can be rendered as its API model.
pub trait ToModel: ContentRow + Send + 'static {
    type Model: Serialize + Send + 'static;

    fn id(&self) -> i64;
    fn to_model(self) -> Self::Model;
}

impl ToModel for ArticleRow {
    type Model = Article;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_model(self) -> Article {
        Article {
            id: self.id,
            published_at: self.published_at.as_deref().map(|ts| parse_timestamp(ts, self.id)),
            created_at: parse_timestamp(&self.created_at, self.id),
            title: self.title,
            content: self.content,
            author: self.author,
            is_today: self.is_today,
        }
    }
}

impl ToModel for QuoteRow {
    type Model = Quote;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_model(self) -> Quote {
        Quote {
            id: self.id,
            published_at: self.published_at.as_deref().map(|ts| parse_timestamp(ts, self.id)),
            created_at: parse_timestamp(&self.created_at, self.id),
            content: self.content,
            author: self.author,
            category: self.category,
            is_today: self.is_today,
        }
    }
}

pub fn settings_model(row: NotificationSettingsRow) -> NotificationSettings {
    NotificationSettings {
        updated_at: parse_timestamp(&row.updated_at, 0),
        username: row.username,
        article_enabled: row.article_enabled,
        quote_enabled: row.quote_enabled,
    }
}

/// Format a timestamp the way SQLite's `datetime('now')` stores it, so
/// supplied and defaulted values sort together.
pub fn to_sqlite_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(SQLITE_FORMAT).to_string()
}

fn parse_timestamp(raw: &str, row_id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, SQLITE_FORMAT).map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on row {}: {}", raw, row_id, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sqlite_timestamps_round_trip() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let raw = to_sqlite_timestamp(ts);
        assert_eq!(raw, "2024-03-09 07:05:01");
        assert_eq!(parse_timestamp(&raw, 1), ts);
    }

    #[test]
    fn corrupt_timestamp_falls_back_to_epoch() {
        assert_eq!(parse_timestamp("yesterday", 1), DateTime::<Utc>::default());
    }
}
