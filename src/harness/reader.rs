use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::{debug, info};

use crate::error::{LoadError, WatchError};
use crate::status::{StatusFile, StatusRecord};

use super::Choices;

/// Counters collected by one reader loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReaderStats {
    /// Reads that produced a complete record.
    pub reads: u64,
    /// Reads that found no file yet.
    pub misses: u64,
    /// Times the observed record differed from the previous one.
    pub changes: u64,
}

/// Poll `file` until `stop` is set, validating every read against `choices`.
///
/// A missing file is retried. A document that does not decode, or decodes
/// to a record outside `choices`, ends the loop with an error.
pub fn watch(
    file: &StatusFile,
    choices: &Choices,
    stop: &AtomicBool,
    mut on_change: impl FnMut(&StatusRecord),
) -> Result<ReaderStats, WatchError> {
    info!("reader started on {}", file.path().display());
    let mut stats = ReaderStats::default();
    let mut last: Option<StatusRecord> = None;

    while !stop.load(Ordering::Acquire) {
        let record = match file.load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                stats.misses += 1;
                thread::yield_now();
                continue;
            }
            Err(source @ LoadError::Decode { .. }) => {
                return Err(WatchError::Torn {
                    reads: stats.reads,
                    source,
                });
            }
            Err(err) => return Err(WatchError::Load(err)),
        };
        stats.reads += 1;

        if !choices.contains(&record) {
            return Err(WatchError::Unexpected { record });
        }
        if last.as_ref() != Some(&record) {
            debug!("reader observed {record}");
            stats.changes += 1;
            on_change(&record);
            last = Some(record);
        }
    }

    info!(
        "reader stopped: {} reads, {} misses, {} changes",
        stats.reads, stats.misses, stats.changes
    );
    Ok(stats)
}
