//! SQLite storage for the processed-message ledger.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

pub mod error;
pub mod ledger_repo;
pub mod migrations;

pub use error::DatabaseError;

/// File name of the ledger inside the application directory.
pub const LEDGER_FILE: &str = "processed.db";

/// How long a write waits on another process holding the file lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the ledger connection. Clones see the same rows.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the ledger at `path`, creating parent directories and the
    /// schema on first use.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        migrations::run_all(&conn)?;

        log::info!("Ledger database opened at {}", path.display());
        Ok(Self::wrap(conn))
    }

    /// Ledger that lives only as long as the handle.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        migrations::run_all(&conn)?;
        Ok(Self::wrap(conn))
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let guard = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&guard)
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

/// `<config dir>/PigeonHunter/processed.db`, if the platform has a config dir.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| ledger_path(&dir.join("PigeonHunter")))
}

/// Ledger location inside an application directory.
pub fn ledger_path(app_dir: &Path) -> PathBuf {
    app_dir.join(LEDGER_FILE)
}
