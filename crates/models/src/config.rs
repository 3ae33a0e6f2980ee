use failure::Fail;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::db::Config as DbConfig;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database: Option<DbConfig>,
    pub storage: Storage,
}

/// File storage configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
    /// Path to a directory in which contents of document versions are kept.
    pub path: PathBuf,
}

impl Storage {
    /// Verify that the storage directory exists and is a directory.
    pub fn validate(&self) -> Result<(), InvalidStorageError> {
        if self.path.is_dir() {
            Ok(())
        } else {
            Err(InvalidStorageError(self.path.clone()))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Storage path {:?} is not a directory", _0)]
pub struct InvalidStorageError(PathBuf);
