//! SQLite connection lifecycle and schema bootstrap

use crate::store::error::{StoreError, StoreResult};
use log::{debug, info, warn};
use rusqlite::Connection;
use std::cell::Cell;
use std::path::Path;

pub struct SqliteStore {
    conn: Connection,
    in_global_transaction: Cell<bool>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            info!("Database {} does not exist, creating it.", path.display());
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Location {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let store = Self::from_connection(Connection::open(path)?)?;
        debug!("Opened database {}", path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn,
            in_global_transaction: Cell::new(false),
        };
        store.configure_pragmas()?;
        store.bootstrap_schema()?;
        Ok(store)
    }

    // Single-writer batch tool: durability is traded for throughput.
    fn configure_pragmas(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "PRAGMA encoding = 'UTF-8';
             PRAGMA cache_size = -1000000;
             PRAGMA journal_mode = MEMORY;
             PRAGMA synchronous = OFF;
             PRAGMA temp_store = MEMORY;",
        )?;
        debug!("SQLite pragmas configured (in-memory journal, synchronous off)");
        Ok(())
    }

    fn bootstrap_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run every following write inside one transaction until `commit`
    pub fn begin_global_transaction(&self) -> StoreResult<()> {
        if !self.in_global_transaction.get() {
            self.conn.execute_batch("BEGIN")?;
            self.in_global_transaction.set(true);
            debug!("Global transaction started");
        }
        Ok(())
    }

    pub fn in_global_transaction(&self) -> bool {
        self.in_global_transaction.get()
    }

    /// Commit the global transaction, if one is open
    pub fn commit(&self) -> StoreResult<()> {
        if self.in_global_transaction.replace(false) {
            self.conn.execute_batch("COMMIT")?;
            debug!("Global transaction committed");
        }
        Ok(())
    }

    /// Discard the global transaction, if one is open
    pub fn rollback(&self) -> StoreResult<()> {
        if self.in_global_transaction.replace(false) {
            self.conn.execute_batch("ROLLBACK")?;
            debug!("Global transaction rolled back");
        }
        Ok(())
    }

    /// Open a named savepoint, nested in the global transaction when one runs
    pub fn savepoint(&self, name: &str) -> StoreResult<()> {
        self.conn.execute_batch(&format!("SAVEPOINT {name}"))?;
        Ok(())
    }

    /// Close a savepoint, keeping or discarding what was written since it opened
    pub fn release_savepoint(&self, name: &str, keep: bool) -> StoreResult<()> {
        if !keep {
            self.conn.execute_batch(&format!("ROLLBACK TO {name}"))?;
            debug!("Rolled back to savepoint {}", name);
        }
        self.conn.execute_batch(&format!("RELEASE {name}"))?;
        Ok(())
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if self.in_global_transaction() {
            warn!("Discarding database writes that were never committed");
            if let Err(e) = self.rollback() {
                warn!("Could not roll back pending database writes: {}", e);
            }
        }
    }
}
