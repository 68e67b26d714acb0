use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::models::NotificationSettingsRow;

impl Database {
    /// Read settings, materializing the default row (both enabled) on first access.
    pub fn get_or_create_settings(&self, username: &str) -> Result<NotificationSettingsRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO notification_settings (username) VALUES (?1)
                 ON CONFLICT(username) DO NOTHING",
                [username],
            )?;
            let row = query_settings(&tx, username)?;
            tx.commit()?;
            row.ok_or_else(|| anyhow!("settings for {} missing after insert", username))
        })
    }

    pub fn upsert_settings(
        &self,
        username: &str,
        article_enabled: bool,
        quote_enabled: bool,
    ) -> Result<NotificationSettingsRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO notification_settings (username, article_enabled, quote_enabled)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(username) DO UPDATE SET
                    article_enabled = excluded.article_enabled,
                    quote_enabled = excluded.quote_enabled,
                    updated_at = datetime('now')",
                (username, article_enabled, quote_enabled),
            )?;
            query_settings(conn, username)?
                .ok_or_else(|| anyhow!("settings for {} missing after upsert", username))
        })
    }
}

fn query_settings(conn: &Connection, username: &str) -> Result<Option<NotificationSettingsRow>> {
    let row = conn
        .query_row(
            "SELECT username, article_enabled, quote_enabled, updated_at
             FROM notification_settings WHERE username = ?1",
            [username],
            |row| {
                Ok(NotificationSettingsRow {
                    username: row.get(0)?,
                    article_enabled: row.get(1)?,
                    quote_enabled: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use crate::test_support;

    #[test]
    fn first_read_creates_defaults() {
        let t = test_support::open();
        let s = t.db.get_or_create_settings("alice").unwrap();
        assert!(s.article_enabled);
        assert!(s.quote_enabled);

        let count: i64 = t
            .db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM notification_settings", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn update_without_existing_row_inserts() {
        let t = test_support::open();
        let s = t.db.upsert_settings("bob", false, true).unwrap();
        assert!(!s.article_enabled);
        assert!(s.quote_enabled);

        let again = t.db.upsert_settings("bob", true, false).unwrap();
        assert!(again.article_enabled);
        assert!(!again.quote_enabled);

        let read = t.db.get_or_create_settings("bob").unwrap();
        assert!(read.article_enabled);
        assert!(!read.quote_enabled);
    }
}
