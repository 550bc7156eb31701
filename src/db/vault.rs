//! Append-only vault repository for completed turns
//!
//! Rows are inserted and read back, never updated or deleted. Clearing the
//! in-session history does not touch the vault.

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::controller::ConversationStore;
use crate::{Error, Result};

/// Newest rows returned by a default `recent` query
pub const RECENT_LIMIT: usize = 50;

/// One persisted turn
#[derive(Debug, Clone)]
pub struct VaultEntry {
    pub id: i64,
    pub timestamp: String,
    pub query: String,
    pub reply: String,
}

/// Vault repository
#[derive(Clone)]
pub struct VaultRepo {
    pool: DbPool,
}

impl VaultRepo {
    /// Create a new vault repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert one completed turn
    ///
    /// # Errors
    ///
    /// Returns error if the database operation fails
    pub fn insert(&self, query: &str, reply: &str, timestamp: DateTime<Utc>) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO conversation_vault (timestamp, user_query, bot_response, metadata)
             VALUES (?1, ?2, ?3, NULL)",
            [&timestamp.to_rfc3339(), query, reply],
        )?;

        Ok(())
    }

    /// Newest entries first
    ///
    /// # Errors
    ///
    /// Returns error if the database operation fails
    pub fn newest(&self, limit: usize) -> Result<Vec<VaultEntry>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, user_query, bot_response
             FROM conversation_vault ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map([limit], |row| {
            Ok(VaultEntry {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                query: row.get(2)?,
                reply: row.get(3)?,
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    /// Total number of persisted turns
    ///
    /// # Errors
    ///
    /// Returns error if the database operation fails
    pub fn count(&self) -> Result<i64> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let count = conn.query_row("SELECT COUNT(*) FROM conversation_vault", [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }
}

// Persistence failures are logged and swallowed so the voice loop keeps
// running without its vault.
impl ConversationStore for VaultRepo {
    fn append(&self, query: &str, reply: &str, timestamp: DateTime<Utc>) {
        if let Err(e) = self.insert(query, reply, timestamp) {
            tracing::warn!(error = %e, "failed to persist turn");
        }
    }

    fn recent(&self, limit: usize) -> Vec<VaultEntry> {
        match self.newest(limit) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read vault");
                Vec::new()
            }
        }
    }
}
