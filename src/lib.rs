//! Atomic publication of small status records to a shared file.
//!
//! One writer calls [`publish`] (or [`StatusFile::publish`]); any number of
//! readers poll the file and only ever see complete documents. The
//! [`harness`] module holds reader and writer loops that exercise this.

pub mod config;
pub mod error;
pub mod harness;
pub mod status;
pub mod ui;

pub use error::{LoadError, PublishError, WatchError};
pub use status::{StatusFile, StatusRecord, publish};
