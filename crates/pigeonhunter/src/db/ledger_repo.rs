//! Processed-message repository: operations on the `processed_emails` table.

use rusqlite::{params, OptionalExtension};

use super::{Database, DatabaseError};

/// Inserts a processed message identifier. Duplicates are ignored.
pub fn insert(db: &Database, message_id: &str, processed_at: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT OR IGNORE INTO processed_emails (message_id, processed_at) VALUES (?1, ?2)",
            params![message_id, processed_at],
        )?;
        Ok(())
    })
}

/// Returns true if the identifier has been recorded.
pub fn exists(db: &Database, message_id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT 1 FROM processed_emails WHERE message_id = ?1",
                params![message_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    })
}

/// Counts all recorded identifiers.
pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM processed_emails", [], |r| r.get(0))?;
        Ok(count)
    })
}

/// Finds the timestamp of the most recent insert, if any carries one.
pub fn find_last_processed_at(db: &Database) -> Result<Option<String>, DatabaseError> {
    db.with_conn(|conn| {
        let last = conn
            .query_row(
                "SELECT processed_at FROM processed_emails WHERE processed_at != ''
                 ORDER BY processed_at DESC LIMIT 1",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(last)
    })
}
