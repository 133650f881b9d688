use std::fs::File;
use std::io::Write;
use std::time::Duration;

use log::{debug, info};
use rand::Rng;

use crate::error::PublishError;
use crate::status::{StatusFile, StatusRecord};

use super::Choices;

/// How the writer loop puts a record on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Stage and rename; readers never see a partial document.
    #[default]
    Atomic,
    /// Truncate the target and write it in small chunks. Readers racing
    /// the writer will see empty or partial documents.
    InPlace,
}

/// Write `record` to `file` using `mode`.
pub fn write_with(mode: WriteMode, file: &StatusFile, record: &StatusRecord) -> Result<(), PublishError> {
    match mode {
        WriteMode::Atomic => file.publish(record),
        WriteMode::InPlace => overwrite_in_place(file, record),
    }
}

fn overwrite_in_place(file: &StatusFile, record: &StatusRecord) -> Result<(), PublishError> {
    let bytes = serde_json::to_vec(record).map_err(PublishError::Encoding)?;
    let in_place = |source| PublishError::Publish {
        target: file.path().to_path_buf(),
        source,
    };
    let mut out = File::create(file.path()).map_err(in_place)?;
    for chunk in bytes.chunks(8) {
        out.write_all(chunk).map_err(in_place)?;
        out.flush().map_err(in_place)?;
    }
    Ok(())
}

/// Writer loop settings.
#[derive(Debug, Clone)]
pub struct ChurnOptions {
    /// Stop after this many writes; `None` runs until the future is dropped.
    pub count: Option<u64>,
    /// Upper bound of the random pause before each write.
    pub max_interval: Duration,
    pub mode: WriteMode,
}

impl Default for ChurnOptions {
    fn default() -> Self {
        Self {
            count: None,
            max_interval: Duration::from_millis(1000),
            mode: WriteMode::Atomic,
        }
    }
}

/// Repeatedly write a new random record, each different from the previous.
///
/// Returns the number of records written. The first write failure ends
/// the loop; retrying is up to the caller.
pub async fn churn<R: Rng>(
    file: &StatusFile,
    choices: &Choices,
    opts: &ChurnOptions,
    rng: &mut R,
    mut on_write: impl FnMut(&StatusRecord),
) -> Result<u64, PublishError> {
    info!(
        "writer started on {} ({:?}, count {:?})",
        file.path().display(),
        opts.mode,
        opts.count
    );
    let max_ms = u64::try_from(opts.max_interval.as_millis()).unwrap_or(u64::MAX);
    let mut written = 0u64;
    let mut last: Option<StatusRecord> = None;

    while opts.count.is_none_or(|count| written < count) {
        let pause = rng.random_range(0..=max_ms);
        tokio::time::sleep(Duration::from_millis(pause)).await;

        let Some(record) = choices.pick_next(rng, last.as_ref()) else {
            break;
        };
        write_with(opts.mode, file, &record)?;
        debug!("wrote {record} after {pause}ms");
        on_write(&record);
        written += 1;
        last = Some(record);
    }

    info!("writer finished after {written} writes");
    Ok(written)
}
