use anyhow::{Result, anyhow};
use muse_types::models::ContentKind;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::Database;
use crate::models::{
    ArticlePatch, ArticleRow, ContentRow, NewArticle, NewQuote, QuotePatch, QuoteRow, table,
};

impl Database {
    // -- Articles --

    pub fn create_article(&self, new: &NewArticle) -> Result<ArticleRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO articles (title, content, author, published_at)
                 VALUES (?1, ?2, ?3, COALESCE(?4, datetime('now')))",
                (&new.title, &new.content, &new.author, &new.published_at),
            )?;
            let id = conn.last_insert_rowid();
            query_content::<ArticleRow>(conn, id)?
                .ok_or_else(|| anyhow!("article {} vanished after insert", id))
        })
    }

    /// Apply the fields present in `patch`. Returns `None` if the id does not exist.
    pub fn update_article(&self, id: i64, patch: &ArticlePatch) -> Result<Option<ArticleRow>> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE articles SET
                    title = COALESCE(?2, title),
                    content = COALESCE(?3, content),
                    author = COALESCE(?4, author),
                    published_at = COALESCE(?5, published_at)
                 WHERE id = ?1",
                (id, &patch.title, &patch.content, &patch.author, &patch.published_at),
            )?;
            if updated == 0 {
                return Ok(None);
            }
            query_content::<ArticleRow>(conn, id)
        })
    }

    // -- Quotes --

    pub fn create_quote(&self, new: &NewQuote) -> Result<QuoteRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO quotes (content, author, category, published_at)
                 VALUES (?1, ?2, ?3, COALESCE(?4, datetime('now')))",
                (&new.content, &new.author, &new.category, &new.published_at),
            )?;
            let id = conn.last_insert_rowid();
            query_content::<QuoteRow>(conn, id)?
                .ok_or_else(|| anyhow!("quote {} vanished after insert", id))
        })
    }

    pub fn update_quote(&self, id: i64, patch: &QuotePatch) -> Result<Option<QuoteRow>> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE quotes SET
                    content = COALESCE(?2, content),
                    author = COALESCE(?3, author),
                    category = CASE WHEN ?4 THEN ?5 ELSE category END,
                    published_at = COALESCE(?6, published_at)
                 WHERE id = ?1",
                (
                    id,
                    &patch.content,
                    &patch.author,
                    patch.category.is_some(),
                    patch.category.as_ref().and_then(|c| c.as_deref()),
                    &patch.published_at,
                ),
            )?;
            if updated == 0 {
                return Ok(None);
            }
            query_content::<QuoteRow>(conn, id)
        })
    }

    // -- Shared --

    /// Returns false if the id does not exist. Deleting today's item leaves
    /// the kind without one until the next rotation.
    pub fn delete_content(&self, kind: ContentKind, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted =
                conn.execute(&format!("DELETE FROM {} WHERE id = ?1", table(kind)), [id])?;
            Ok(deleted > 0)
        })
    }

    /// One page of content, newest `published_at` first, plus the total row count.
    pub fn list_content<R: ContentRow>(&self, offset: u64, limit: u32) -> Result<(Vec<R>, u64)> {
        self.with_conn(|conn| {
            let table = table(R::KIND);
            let total: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM {table} c
                 ORDER BY c.published_at IS NULL, c.published_at DESC, c.id DESC
                 LIMIT ?1 OFFSET ?2",
                R::COLUMNS
            ))?;
            let rows = stmt
                .query_map((limit as i64, offset as i64), R::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total as u64))
        })
    }

    // -- Rotation --

    /// The item currently flagged as today's, if any.
    pub fn get_today<R: ContentRow>(&self) -> Result<Option<R>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM {} c WHERE c.is_today = 1",
                        R::COLUMNS,
                        table(R::KIND)
                    ),
                    [],
                    R::from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn has_today(&self, kind: ContentKind) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE is_today = 1)", table(kind)),
                [],
                |r| r.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Automatic rotation: clear the flag and promote the most recently
    /// published item (NULLs last, ties by highest id). Both steps commit
    /// together. Returns the promoted id, or `None` when the kind is empty.
    pub fn rotate_today(&self, kind: ContentKind) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            let table = table(kind);
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            tx.execute(&format!("UPDATE {table} SET is_today = 0 WHERE is_today = 1"), [])?;

            let next: Option<i64> = tx
                .query_row(
                    &format!(
                        "SELECT id FROM {table}
                         ORDER BY published_at IS NULL, published_at DESC, id DESC
                         LIMIT 1"
                    ),
                    [],
                    |r| r.get(0),
                )
                .optional()?;

            if let Some(id) = next {
                tx.execute(&format!("UPDATE {table} SET is_today = 1 WHERE id = ?1"), [id])?;
            }

            tx.commit()?;
            Ok(next)
        })
    }

    /// Manual rotation to a specific id. The reset always commits; returns
    /// false when `id` does not exist, leaving the kind with no today item.
    pub fn set_today(&self, kind: ContentKind, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let table = table(kind);
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            tx.execute(&format!("UPDATE {table} SET is_today = 0 WHERE is_today = 1"), [])?;
            let promoted =
                tx.execute(&format!("UPDATE {table} SET is_today = 1 WHERE id = ?1"), [id])?;

            tx.commit()?;
            Ok(promoted > 0)
        })
    }
}

pub(crate) fn query_content<R: ContentRow>(conn: &Connection, id: i64) -> Result<Option<R>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM {} c WHERE c.id = ?1", R::COLUMNS, table(R::KIND)),
            [id],
            R::from_row,
        )
        .optional()?;
    Ok(row)
}

pub(crate) fn content_exists(conn: &Connection, kind: ContentKind, id: i64) -> Result<bool> {
    let exists = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table(kind)),
        [id],
        |r| r.get(0),
    )?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn article(title: &str, published_at: Option<&str>) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            content: format!("{title} body"),
            author: "someone".to_string(),
            published_at: published_at.map(str::to_string),
        }
    }

    fn flagged(db: &Database, kind: ContentKind) -> Vec<i64> {
        db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT id FROM {} WHERE is_today = 1", table(kind)))?;
            let ids = stmt
                .query_map([], |r| r.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
        .unwrap()
    }

    #[test]
    fn create_defaults_published_at() {
        let t = test_support::open();
        let row = t.db.create_article(&article("T", None)).unwrap();
        assert_eq!(row.title, "T");
        assert!(row.published_at.is_some());
        assert!(!row.is_today);
    }

    #[test]
    fn rotation_on_empty_kind_flags_nothing() {
        let t = test_support::open();
        assert_eq!(t.db.rotate_today(ContentKind::Article).unwrap(), None);
        assert!(t.db.get_today::<ArticleRow>().unwrap().is_none());
    }

    #[test]
    fn rotation_promotes_latest_published() {
        let t = test_support::open();
        let old = t.db.create_article(&article("old", Some("2024-01-01 08:00:00"))).unwrap();
        let new = t.db.create_article(&article("new", Some("2024-03-01 08:00:00"))).unwrap();
        t.db.create_article(&article("mid", Some("2024-02-01 08:00:00"))).unwrap();

        assert_eq!(t.db.rotate_today(ContentKind::Article).unwrap(), Some(new.id));
        assert_eq!(flagged(&t.db, ContentKind::Article), vec![new.id]);

        // Moving the date forward changes the winner; still exactly one flagged
        t.db.update_article(
            old.id,
            &ArticlePatch {
                published_at: Some("2025-01-01 00:00:00".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(t.db.rotate_today(ContentKind::Article).unwrap(), Some(old.id));
        assert_eq!(flagged(&t.db, ContentKind::Article), vec![old.id]);
    }

    #[test]
    fn rotation_breaks_ties_by_highest_id() {
        let t = test_support::open();
        let ts = Some("2024-05-05 05:05:05");
        t.db.create_article(&article("a", ts)).unwrap();
        let b = t.db.create_article(&article("b", ts)).unwrap();

        assert_eq!(t.db.rotate_today(ContentKind::Article).unwrap(), Some(b.id));
    }

    #[test]
    fn rotation_is_per_kind() {
        let t = test_support::open();
        let a = t.db.create_article(&article("a", None)).unwrap();
        let q = t
            .db
            .create_quote(&NewQuote {
                content: "q".to_string(),
                author: "x".to_string(),
                category: Some("life".to_string()),
                published_at: None,
            })
            .unwrap();

        t.db.rotate_today(ContentKind::Article).unwrap();
        assert_eq!(flagged(&t.db, ContentKind::Article), vec![a.id]);
        assert!(flagged(&t.db, ContentKind::Quote).is_empty());

        t.db.rotate_today(ContentKind::Quote).unwrap();
        let today = t.db.get_today::<QuoteRow>().unwrap().unwrap();
        assert_eq!(today.id, q.id);
        assert_eq!(today.category.as_deref(), Some("life"));
    }

    #[test]
    fn set_today_moves_the_flag() {
        let t = test_support::open();
        let a = t.db.create_article(&article("a", Some("2024-01-01 00:00:00"))).unwrap();
        let b = t.db.create_article(&article("b", Some("2024-06-01 00:00:00"))).unwrap();
        t.db.rotate_today(ContentKind::Article).unwrap();
        assert_eq!(flagged(&t.db, ContentKind::Article), vec![b.id]);

        assert!(t.db.set_today(ContentKind::Article, a.id).unwrap());
        assert_eq!(flagged(&t.db, ContentKind::Article), vec![a.id]);
    }

    #[test]
    fn set_today_unknown_id_still_resets() {
        let t = test_support::open();
        let a = t.db.create_article(&article("a", None)).unwrap();
        t.db.set_today(ContentKind::Article, a.id).unwrap();

        assert!(!t.db.set_today(ContentKind::Article, a.id + 100).unwrap());
        assert!(flagged(&t.db, ContentKind::Article).is_empty());
        assert!(!t.db.has_today(ContentKind::Article).unwrap());
    }

    #[test]
    fn deleting_today_item_leaves_none() {
        let t = test_support::open();
        let a = t.db.create_article(&article("a", None)).unwrap();
        t.db.rotate_today(ContentKind::Article).unwrap();

        assert!(t.db.delete_content(ContentKind::Article, a.id).unwrap());
        assert!(!t.db.delete_content(ContentKind::Article, a.id).unwrap());
        assert!(t.db.get_today::<ArticleRow>().unwrap().is_none());
    }

    #[test]
    fn update_missing_returns_none() {
        let t = test_support::open();
        let patch = QuotePatch {
            author: Some("nobody".to_string()),
            ..Default::default()
        };
        assert!(t.db.update_quote(42, &patch).unwrap().is_none());
    }

    #[test]
    fn quote_category_can_be_kept_or_cleared() {
        let t = test_support::open();
        let quote = t
            .db
            .create_quote(&NewQuote {
                content: "q".to_string(),
                author: "x".to_string(),
                category: Some("life".to_string()),
                published_at: None,
            })
            .unwrap();

        let kept = t
            .db
            .update_quote(
                quote.id,
                &QuotePatch {
                    author: Some("y".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(kept.author, "y");
        assert_eq!(kept.category.as_deref(), Some("life"));

        let cleared = t
            .db
            .update_quote(
                quote.id,
                &QuotePatch {
                    category: Some(None),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert!(cleared.category.is_none());
        assert_eq!(cleared.author, "y");
    }

    #[test]
    fn list_pages_newest_first() {
        let t = test_support::open();
        for day in 1..=5 {
            let ts = format!("2024-01-0{day} 00:00:00");
            t.db.create_article(&article(&format!("day{day}"), Some(&ts))).unwrap();
        }

        let (first, total) = t.db.list_content::<ArticleRow>(0, 2).unwrap();
        assert_eq!(total, 5);
        let titles: Vec<_> = first.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["day5", "day4"]);

        let (last, _) = t.db.list_content::<ArticleRow>(4, 2).unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].title, "day1");
    }
}
