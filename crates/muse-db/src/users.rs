use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::Database;
use crate::models::{AdminInitOutcome, UserRow};

const USER_COLUMNS: &str = "id, username, password, is_admin, created_at";

impl Database {
    /// Insert a user. Returns `None` when the username is already taken;
    /// the unique constraint decides, so concurrent registrations cannot
    /// both succeed.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)
                 ON CONFLICT(username) DO NOTHING",
                (username, password_hash),
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            query_user_by_id(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn admin_exists(&self) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE is_admin = 1)",
                [],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Bootstrap the first admin in a single write transaction.
    ///
    /// If `username` already exists it is promoted, but only when
    /// `verify_existing` accepts the stored password hash.
    pub fn init_admin<F>(
        &self,
        username: &str,
        password_hash: &str,
        verify_existing: F,
    ) -> Result<AdminInitOutcome>
    where
        F: FnOnce(&str) -> bool,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let admin_exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE is_admin = 1)",
                [],
                |row| row.get(0),
            )?;
            if admin_exists {
                return Ok(AdminInitOutcome::AdminExists);
            }

            let outcome = match query_user_by_username(&tx, username)? {
                Some(existing) => {
                    if !verify_existing(&existing.password) {
                        return Ok(AdminInitOutcome::WrongPassword);
                    }
                    tx.execute("UPDATE users SET is_admin = 1 WHERE id = ?1", [existing.id])?;
                    AdminInitOutcome::Promoted(UserRow {
                        is_admin: true,
                        ..existing
                    })
                }
                None => {
                    tx.execute(
                        "INSERT INTO users (username, password, is_admin) VALUES (?1, ?2, 1)",
                        (username, password_hash),
                    )?;
                    let row = query_user_by_id(&tx, tx.last_insert_rowid())?
                        .ok_or_else(|| anyhow::anyhow!("admin row vanished after insert"))?;
                    AdminInitOutcome::Created(row)
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
    }
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        is_admin: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            [username],
            map_user,
        )
        .optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            [id],
            map_user,
        )
        .optional()?;
    Ok(row)
}
