//! Durable index of remote accounts and lists and the local directories
//! their downloads live in.
//!
//! The store half (`queries`) is plain CRUD. The `reconcile` half decides
//! whether a candidate directory is a tracked root that moved or a new one.

pub mod audit;
pub mod error;
pub mod migrations;
pub mod models;
pub mod paths;
pub mod queries;
pub mod reconcile;

pub use error::{DbError, Result};
pub use models::{
    Account, AccountEntity, AccountLink, AccountList, AccountNameHistory, ListEntity,
    NewAccountEntity, NewListEntity,
};
pub use paths::{CanonicalDir, MARKER_FILE};

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private, non-persistent store. Used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` inside a single `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken up front, so a read-scan-update sequence in `f`
    /// cannot interleave with another writer, in this process or another one.
    /// Returning `Err` from `f` rolls everything back.
    pub fn with_tx<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::LockPoisoned(e.to_string()))
    }
}
