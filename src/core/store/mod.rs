// src/core/store/mod.rs

//! The flat-file user store: lenient load, atomic persist.

pub mod atomic;
pub mod user;

pub use self::atomic::StagedWrite;
pub use self::user::{ADMIN_ROLE, UNLIMITED_QUOTA, UpsertOutcome, UserRecord, UsersFile};

use crate::core::errors::BootstrapError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A handle on the `users.json` file backing the user collection.
#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the collection from disk.
    ///
    /// A missing file or content that does not parse as a user store yields an
    /// empty collection. Only genuine read failures are returned as errors.
    pub fn load(&self) -> Result<UsersFile, BootstrapError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "User store '{}' not found. Starting with an empty collection.",
                    self.path.display()
                );
                return Ok(UsersFile::default());
            }
            Err(e) => return Err(BootstrapError::io("Failed to read user store", &self.path, e)),
        };

        match UsersFile::from_slice(&bytes) {
            Ok(users) => {
                info!(
                    "Loaded {} user records from '{}'.",
                    users.users.len(),
                    self.path.display()
                );
                Ok(users)
            }
            Err(e) => {
                warn!(
                    "User store '{}' is not a valid collection ({}). Starting with an empty collection; it will be replaced on save.",
                    self.path.display(),
                    e
                );
                Ok(UsersFile::default())
            }
        }
    }

    /// Serializes `users` into a temporary file beside the store without
    /// replacing it yet. Creates the data directory if needed.
    pub fn stage(&self, users: &UsersFile) -> Result<StagedWrite, BootstrapError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            atomic::create_private_dir(dir)
                .map_err(|e| BootstrapError::io("Failed to create data directory", dir, e))?;
            info!("Created data directory '{}'.", dir.display());
        }

        let json = users.to_pretty_json()?;
        StagedWrite::stage(&self.path, json.as_bytes())
    }

    /// Atomically replaces the store with `users`.
    pub fn persist(&self, users: &UsersFile) -> Result<(), BootstrapError> {
        self.stage(users)?.commit()?;
        info!(
            "User store saved successfully to '{}'.",
            self.path.display()
        );
        Ok(())
    }
}
