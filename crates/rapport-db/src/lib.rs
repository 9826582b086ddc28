pub mod error;
pub mod guards;
pub mod lifecycle;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod stats;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub use error::{FriendshipError, LockPoisoned};
pub use guards::CallerContext;
pub use lifecycle::SendOutcome;
pub use models::{FriendProfileRow, FriendshipRow, FriendshipStatus, UserRow};

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database, schema applied. Used by tests.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<LockPoisoned>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LockPoisoned(e.to_string()))?;
        f(&conn)
    }

    /// Exclusive access for operations that open their own transaction.
    pub fn with_conn_mut<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E>,
        E: From<LockPoisoned>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| LockPoisoned(e.to_string()))?;
        f(&mut conn)
    }
}
