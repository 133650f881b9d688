use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use rand::Rng;

use crate::error::WatchError;
use crate::status::{StatusFile, StatusRecord};

use super::reader::{ReaderStats, watch};
use super::writer::{ChurnOptions, WriteMode, churn};
use super::Choices;

/// Settings for one writer racing a group of readers.
#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub count: u64,
    pub readers: usize,
    pub max_interval: Duration,
    pub mode: WriteMode,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            count: 10,
            readers: 1,
            max_interval: Duration::from_millis(1000),
            mode: WriteMode::Atomic,
        }
    }
}

/// Outcome of a demo run.
#[derive(Debug)]
pub struct DemoReport {
    /// Records the writer managed to put on disk.
    pub published: u64,
    /// True when Ctrl-C ended the writer early.
    pub interrupted: bool,
    /// One entry per reader, in spawn order.
    pub readers: Vec<Result<ReaderStats, WatchError>>,
}

impl DemoReport {
    /// Readers that ended with an error.
    pub fn failures(&self) -> usize {
        self.readers.iter().filter(|r| r.is_err()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }
}

/// Remove any stale status file, start `opts.readers` reader loops on the
/// blocking pool, run the writer for `opts.count` records, then stop and
/// collect the readers.
pub async fn run_demo<R, F>(
    file: &StatusFile,
    choices: &Choices,
    opts: &DemoOptions,
    rng: &mut R,
    on_write: impl FnMut(&StatusRecord),
    on_read: F,
) -> Result<DemoReport>
where
    R: Rng,
    F: Fn(usize, &StatusRecord) + Clone + Send + 'static,
{
    file.remove()
        .with_context(|| format!("failed to remove stale {}", file.path().display()))?;

    let stop = Arc::new(AtomicBool::new(false));
    let handles: Vec<_> = (0..opts.readers)
        .map(|id| {
            let file = file.clone();
            let choices = choices.clone();
            let stop = Arc::clone(&stop);
            let on_read = on_read.clone();
            tokio::task::spawn_blocking(move || watch(&file, &choices, &stop, |r| on_read(id, r)))
        })
        .collect();
    info!("demo started with {} readers", handles.len());

    let churn_opts = ChurnOptions {
        count: Some(opts.count),
        max_interval: opts.max_interval,
        mode: opts.mode,
    };
    let outcome = tokio::select! {
        res = churn(file, choices, &churn_opts, rng, on_write) => Some(res),
        _ = tokio::signal::ctrl_c() => None,
    };

    // Readers must be stopped before any early return, or the blocking pool never drains.
    stop.store(true, Ordering::Release);
    let mut readers = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await.context("reader task panicked")?;
        if let Err(err) = &result {
            warn!("reader failed: {err}");
        }
        readers.push(result);
    }

    let (published, interrupted) = match outcome {
        Some(res) => (res.context("writer failed")?, false),
        None => {
            warn!("demo interrupted");
            (0, true)
        }
    };

    Ok(DemoReport {
        published,
        interrupted,
        readers,
    })
}
