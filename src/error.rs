use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::status::StatusRecord;

/// Failure of a single publish attempt.
///
/// Whatever the variant, the target file still holds its previous content.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The staging file could not be created, written or synced.
    #[error("failed to stage status file in {}: {source}", .dir.display())]
    Staging {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The record could not be serialized.
    #[error("failed to encode status record: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The staged file could not be renamed onto the target.
    #[error("failed to publish status file {}: {source}", .target.display())]
    Publish {
        target: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PublishError {
    /// True when the rename was refused because staging dir and target live
    /// on different filesystems.
    pub fn crosses_devices(&self) -> bool {
        match self {
            PublishError::Publish { source, .. } => {
                source.kind() == io::ErrorKind::CrossesDevices
            }
            _ => false,
        }
    }
}

/// Failure while loading the published status file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read status file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was read completely but did not decode as a status record.
    #[error("status file {} does not hold a complete record ({contents:?}): {source}", .path.display())]
    Decode {
        path: PathBuf,
        contents: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reasons a reader loop gives up.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("torn read after {reads} good reads: {source}")]
    Torn {
        reads: u64,
        #[source]
        source: LoadError,
    },

    #[error("unexpected status record {}/{}", .record.status, .record.message)]
    Unexpected { record: StatusRecord },

    #[error(transparent)]
    Load(LoadError),
}
