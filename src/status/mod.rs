mod file;
mod record;
mod writer;

pub use file::StatusFile;
pub use record::StatusRecord;
pub use writer::{STAGING_PREFIX, STAGING_SUFFIX, publish};
