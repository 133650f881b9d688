//! Reader and writer loops that exercise the status file under concurrency.
//!
//! None of this is needed to publish a status; it exists to show that
//! readers polling the file never observe a partial document.

mod demo;
mod reader;
mod writer;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::status::StatusRecord;

pub use demo::{DemoOptions, DemoReport, run_demo};
pub use reader::{ReaderStats, watch};
pub use writer::{ChurnOptions, WriteMode, churn, write_with};

/// The closed set of statuses and messages the harness writes and accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choices {
    statuses: Vec<String>,
    messages: Vec<String>,
}

impl Choices {
    pub fn new(statuses: Vec<String>, messages: Vec<String>) -> Self {
        Self { statuses, messages }
    }

    /// True when both fields of `record` belong to this set.
    pub fn contains(&self, record: &StatusRecord) -> bool {
        self.statuses.contains(&record.status) && self.messages.contains(&record.message)
    }

    /// Number of distinct records this set can produce.
    pub fn combinations(&self) -> usize {
        self.statuses.len() * self.messages.len()
    }

    /// Pick a random record that differs from `last`.
    ///
    /// With a single combination available that combination is returned
    /// even if it equals `last`. Returns `None` if either list is empty.
    pub fn pick_next<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        last: Option<&StatusRecord>,
    ) -> Option<StatusRecord> {
        loop {
            let status = self.statuses.choose(rng)?;
            let message = self.messages.choose(rng)?;
            let record = StatusRecord::new(status.as_str(), message.as_str());
            if self.combinations() <= 1 || last != Some(&record) {
                return Some(record);
            }
        }
    }
}
