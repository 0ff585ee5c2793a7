//! Idempotency ledger of processed message identifiers.
//!
//! Storage failures never drop mail: a failed lookup reports "not processed"
//! so the message is handled again, and a failed insert is logged and leaves
//! the message eligible for the next pass.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, error};

use crate::db::{ledger_repo, Database, DatabaseError};

/// Durable key-existence store keyed by stable message identifier.
pub trait LedgerStore: Send + Sync {
    /// Returns true if the identifier is recorded.
    fn contains(&self, message_id: &str) -> Result<bool, DatabaseError>;
    /// Records the identifier. Recording it twice is not an error.
    fn insert(&self, message_id: &str) -> Result<(), DatabaseError>;
    /// Number of recorded identifiers.
    fn count(&self) -> Result<u64, DatabaseError>;
    /// Timestamp of the most recent insert.
    fn last_processed_at(&self) -> Result<Option<String>, DatabaseError> {
        Ok(None)
    }
}

impl LedgerStore for Database {
    fn contains(&self, message_id: &str) -> Result<bool, DatabaseError> {
        ledger_repo::exists(self, message_id)
    }

    fn insert(&self, message_id: &str) -> Result<(), DatabaseError> {
        ledger_repo::insert(self, message_id, &Utc::now().to_rfc3339())
    }

    fn count(&self) -> Result<u64, DatabaseError> {
        ledger_repo::count(self)
    }

    fn last_processed_at(&self) -> Result<Option<String>, DatabaseError> {
        ledger_repo::find_last_processed_at(self)
    }
}

/// Tracks which stable message identifiers have already been acted upon.
#[derive(Clone)]
pub struct EmailTracker {
    store: Arc<dyn LedgerStore>,
}

impl EmailTracker {
    /// Creates a tracker backed by the SQLite ledger.
    pub fn new(db: Database) -> Self {
        Self {
            store: Arc::new(db),
        }
    }

    /// Creates a tracker over an arbitrary store.
    pub fn with_store(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Checks if an identifier has been processed.
    ///
    /// Fails open: a storage error is logged and reported as "not processed".
    pub fn is_processed(&self, message_id: &str) -> bool {
        if message_id.is_empty() {
            return false;
        }
        match self.store.contains(message_id) {
            Ok(found) => found,
            Err(e) => {
                error!(
                    "Failed to query ledger for Message-ID {}: {}. Treating as unprocessed.",
                    message_id, e
                );
                false
            }
        }
    }

    /// Marks an identifier as processed. Returns whether it was recorded.
    pub fn mark_processed(&self, message_id: &str) -> bool {
        if message_id.is_empty() {
            return false;
        }
        match self.store.insert(message_id) {
            Ok(()) => {
                debug!("Added Message-ID {} to processed ledger", message_id);
                true
            }
            Err(e) => {
                error!(
                    "Failed to add Message-ID {} to ledger: {}. It may be processed again.",
                    message_id, e
                );
                false
            }
        }
    }

    /// Gets statistics for the ledger.
    pub fn stats(&self) -> Result<TrackerStats, DatabaseError> {
        Ok(TrackerStats {
            total_processed: self.store.count()?,
            last_processed_at: self.store.last_processed_at()?,
        })
    }
}

/// Statistics about the processed ledger.
#[derive(Debug)]
pub struct TrackerStats {
    /// Total number of recorded identifiers.
    pub total_processed: u64,
    /// When the last identifier was recorded (RFC 3339).
    pub last_processed_at: Option<String>,
}
