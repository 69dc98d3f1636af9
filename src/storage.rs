//! # Persistent storage handle.
//!
//! The node treats storage as an opaque handle: it opens it first during the build
//! phase (failure aborts construction) and closes it first during `close`.
//! The engine is [`sled`]; closing flushes pending writes.

use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Where and how to open the database.
#[derive(Clone, Debug)]
pub struct DbConfig {
    /// Parent directory.
    pub data_dir: PathBuf,
    /// Logical database name, used as a sub-directory of `data_dir`.
    pub name: String,
    /// Use a temporary location removed when the handle is dropped.
    pub in_memory: bool,
}

/// Opened database handle.
pub struct Database {
    db: sled::Db,
    path: Option<PathBuf>,
}

impl Database {
    /// Opens (creating if missing) the database described by `cfg`.
    pub fn open(cfg: &DbConfig) -> Result<Self, StorageError> {
        if cfg.in_memory {
            let db = sled::Config::new()
                .temporary(true)
                .open()
                .map_err(|source| StorageError::Open {
                    path: PathBuf::new(),
                    source,
                })?;
            return Ok(Self { db, path: None });
        }

        let path = cfg.data_dir.join(&cfg.name);
        let db = sled::Config::new()
            .path(&path)
            .open()
            .map_err(|source| StorageError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            db,
            path: Some(path),
        })
    }

    /// On-disk location, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flushes and releases the database.
    pub fn close(self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map(|_| ())
            .map_err(|source| StorageError::Close { source })
    }
}
