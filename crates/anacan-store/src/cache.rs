//! Lazily opened cache handle.
//!
//! [`OfflineCache::new`] only records the path. The SQLite file is created,
//! configured and migrated the first time an operation needs it, and the
//! connection is kept behind a mutex for the life of the handle.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

const DB_FILE_NAME: &str = "offline-cache.db";

pub struct OfflineCache {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl OfflineCache {
    /// Create a handle for the cache at `path`. Does not touch the disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: Mutex::new(None),
        }
    }

    /// Handle for the cache in the platform data directory:
    /// - Linux:   `~/.local/share/anacan/offline-cache.db`
    /// - macOS:   `~/Library/Application Support/az.anacan.anacan/offline-cache.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\anacan\anacan\data\offline-cache.db`
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_location()?))
    }

    pub fn default_location() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("az", "anacan", "anacan").ok_or(StoreError::NoDataDir)?;
        Ok(dirs.data_dir().join(DB_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the connection has been opened yet.
    pub fn is_open(&self) -> bool {
        self.conn.lock().map(|c| c.is_some()).unwrap_or(false)
    }

    /// Run `f` against the connection, opening and migrating it first if
    /// this is the first use.
    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        if guard.is_none() {
            *guard = Some(open(&self.path)?);
        }
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(StoreError::Migration("connection unavailable".into())),
        }
    }
}

fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    tracing::info!(path = %path.display(), "opening offline cache");
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}
