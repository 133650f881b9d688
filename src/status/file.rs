use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{LoadError, PublishError};

use super::record::StatusRecord;
use super::writer::publish;

/// A status file location plus the staging dir used when publishing to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFile {
    path: PathBuf,
    staging_dir: Option<PathBuf>,
}

impl StatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            staging_dir: None,
        }
    }

    /// Stage writes in `dir`, which must share a filesystem with the target.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging_dir.as_deref()
    }

    pub fn publish(&self, record: &StatusRecord) -> Result<(), PublishError> {
        publish(record, &self.path, self.staging_dir())
    }

    /// Read the whole file and decode it.
    ///
    /// Returns `Ok(None)` while nothing has been published yet.
    pub fn load(&self) -> Result<Option<StatusRecord>, LoadError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LoadError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| LoadError::Decode {
                path: self.path.clone(),
                contents,
                source,
            })
    }

    /// Delete the published file; a file that is already gone is fine.
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
