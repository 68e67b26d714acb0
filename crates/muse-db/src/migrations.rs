use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        let tx = conn.transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                is_admin    INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE articles (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                title         TEXT NOT NULL,
                content       TEXT NOT NULL,
                author        TEXT NOT NULL,
                published_at  TEXT,
                is_today      INTEGER NOT NULL DEFAULT 0,
                created_at    TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- At most one today article
            CREATE UNIQUE INDEX idx_articles_today
                ON articles(is_today) WHERE is_today = 1;

            CREATE INDEX idx_articles_published
                ON articles(published_at DESC, id DESC);

            CREATE TABLE quotes (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                content       TEXT NOT NULL,
                author        TEXT NOT NULL,
                category      TEXT,
                published_at  TEXT,
                is_today      INTEGER NOT NULL DEFAULT 0,
                created_at    TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE UNIQUE INDEX idx_quotes_today
                ON quotes(is_today) WHERE is_today = 1;

            CREATE INDEX idx_quotes_published
                ON quotes(published_at DESC, id DESC);

            -- No foreign keys: favorites may outlive their user or item
            CREATE TABLE favorites (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL,
                item_id     INTEGER NOT NULL,
                item_type   TEXT NOT NULL CHECK (item_type IN ('article', 'quote')),
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(username, item_id, item_type)
            );

            CREATE INDEX idx_favorites_user
                ON favorites(username, item_type, created_at);

            CREATE TABLE notification_settings (
                username         TEXT PRIMARY KEY,
                article_enabled  INTEGER NOT NULL DEFAULT 1,
                quote_enabled    INTEGER NOT NULL DEFAULT 1,
                updated_at       TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        tx.commit()?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();
        run(&mut conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn second_today_flag_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();

        conn.execute(
            "INSERT INTO quotes (content, author, is_today) VALUES ('a', 'x', 1), ('b', 'y', 0)",
            [],
        )
        .unwrap();
        let err = conn.execute("UPDATE quotes SET is_today = 1 WHERE content = 'b'", []);
        assert!(err.is_err());
    }
}
