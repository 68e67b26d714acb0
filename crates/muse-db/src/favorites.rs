use anyhow::Result;
use muse_types::models::ContentKind;
use rusqlite::TransactionBehavior;

use crate::Database;
use crate::content::content_exists;
use crate::models::{ContentRow, ToggleOutcome, table};

impl Database {
    /// Toggle a favorite: removes if it exists, inserts if not.
    ///
    /// Runs as one write transaction. The insert is guarded by the
    /// (username, item_id, item_type) unique constraint, so a racing insert
    /// collapses onto the existing row instead of duplicating it.
    pub fn toggle_favorite(
        &self,
        username: &str,
        item_id: i64,
        kind: ContentKind,
    ) -> Result<ToggleOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let removed = tx.execute(
                "DELETE FROM favorites WHERE username = ?1 AND item_id = ?2 AND item_type = ?3",
                (username, item_id, kind.as_str()),
            )?;
            if removed > 0 {
                tx.commit()?;
                return Ok(ToggleOutcome::Removed);
            }

            if !content_exists(&tx, kind, item_id)? {
                return Ok(ToggleOutcome::MissingItem);
            }

            tx.execute(
                "INSERT INTO favorites (username, item_id, item_type) VALUES (?1, ?2, ?3)
                 ON CONFLICT(username, item_id, item_type) DO NOTHING",
                (username, item_id, kind.as_str()),
            )?;

            tx.commit()?;
            Ok(ToggleOutcome::Added)
        })
    }

    pub fn is_favorited(&self, username: &str, item_id: i64, kind: ContentKind) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM favorites
                               WHERE username = ?1 AND item_id = ?2 AND item_type = ?3)",
                (username, item_id, kind.as_str()),
                |r| r.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Favorited items of one kind, most recently favorited first.
    /// Favorites whose item has been deleted are skipped by the join.
    pub fn list_favorites<R: ContentRow>(&self, username: &str) -> Result<Vec<R>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM favorites f
                 JOIN {} c ON c.id = f.item_id
                 WHERE f.username = ?1 AND f.item_type = ?2
                 ORDER BY f.created_at DESC, f.id DESC",
                R::COLUMNS,
                table(R::KIND)
            ))?;

            let rows = stmt
                .query_map((username, R::KIND.as_str()), R::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}
