//! Atomic publication of a serialized record onto a target path.
//!
//! The record is staged in a uniquely named file, synced and closed, then
//! renamed over the target in one filesystem operation. Readers opening the
//! target see either the previous document or the new one, never a prefix.
//!
//! Rename is only atomic within one filesystem. When the target lives on a
//! different mount than the system temp dir, pass a staging dir on the
//! target's mount; otherwise the rename is refused and the publish fails.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use log::{debug, error, warn};
use serde::Serialize;
use tempfile::{Builder, TempPath};

use crate::error::PublishError;

/// Name prefix of every staging file.
pub const STAGING_PREFIX: &str = ".statusfile-";
/// Name suffix of every staging file.
pub const STAGING_SUFFIX: &str = ".tmp";

/// Publish `record` as JSON at `target`, replacing any previous content.
///
/// `staging_dir` defaults to the system temp dir. On error the target keeps
/// its previous content and no staging file is left behind.
pub fn publish<T>(record: &T, target: &Path, staging_dir: Option<&Path>) -> Result<(), PublishError>
where
    T: Serialize + ?Sized,
{
    let dir = staging_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir);

    let mut staged = Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(&dir)
        .map_err(|source| PublishError::Staging {
            dir: dir.clone(),
            source,
        })?;
    debug!("staging {} for {}", staged.path().display(), target.display());

    let bytes = match serde_json::to_vec(record) {
        Ok(bytes) => bytes,
        Err(err) => {
            discard(staged.into_temp_path());
            return Err(PublishError::Encoding(err));
        }
    };

    if let Err(source) = write_synced(staged.as_file_mut(), &bytes) {
        discard(staged.into_temp_path());
        return Err(PublishError::Staging { dir, source });
    }

    // Closes the handle; the path is still removed on drop.
    let staged = staged.into_temp_path();

    match staged.persist(target) {
        Ok(()) => {
            debug!("published {} bytes to {}", bytes.len(), target.display());
            sync_parent(target);
            Ok(())
        }
        Err(err) => {
            discard(err.path);
            let err = PublishError::Publish {
                target: target.to_path_buf(),
                source: err.error,
            };
            if err.crosses_devices() {
                error!(
                    "{} and {} are on different filesystems; pass a staging dir on the target's mount",
                    dir.display(),
                    target.display()
                );
            }
            Err(err)
        }
    }
}

fn write_synced(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

// Cleanup never fails a publish.
fn discard(staged: TempPath) {
    let path = staged.to_path_buf();
    match staged.close() {
        Ok(()) => debug!("removed staging file {}", path.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("staging file {} already gone", path.display());
        }
        Err(err) => warn!("could not remove staging file {}: {err}", path.display()),
    }
}

#[cfg(unix)]
fn sync_parent(target: &Path) {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let Err(err) = File::open(parent).and_then(|dir| dir.sync_all()) {
        warn!("could not sync directory {}: {err}", parent.display());
    }
}

#[cfg(not(unix))]
fn sync_parent(_target: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusRecord;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(STAGING_PREFIX))
            .collect()
    }

    fn read_record(path: &Path) -> StatusRecord {
        serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refusing to encode"))
        }
    }

    #[test]
    fn publish_then_read_yields_record() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("status.json");
        let record = StatusRecord::new("running", "Doing stuff");

        publish(&record, &target, Some(dir.path())).unwrap();

        assert_eq!(read_record(&target), record);
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn publish_replaces_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("status.json");

        publish(&StatusRecord::new("running", "Doing stuff"), &target, Some(dir.path())).unwrap();
        publish(&StatusRecord::new("success", "More stuff"), &target, Some(dir.path())).unwrap();

        assert_eq!(read_record(&target), StatusRecord::new("success", "More stuff"));
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            r#"{"status":"success","message":"More stuff"}"#
        );
    }

    #[test]
    fn separate_staging_dir_is_left_clean() {
        let target_dir = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir_in(target_dir.path()).unwrap();
        let target = target_dir.path().join("status.json");

        publish(&StatusRecord::new("error", "Other stuff"), &target, Some(staging.path())).unwrap();

        assert!(leftovers(staging.path()).is_empty());
        assert!(target.exists());
    }

    #[test]
    fn default_staging_dir_is_system_temp() {
        // tempdir() lives under the system temp dir, so the rename stays on one mount.
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("status.json");
        let record = StatusRecord::new("success", "Doing stuff");

        publish(&record, &target, None).unwrap();

        assert_eq!(read_record(&target), record);
    }

    #[test]
    fn encoding_failure_keeps_target_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("status.json");
        let before = StatusRecord::new("running", "Doing stuff");
        publish(&before, &target, Some(dir.path())).unwrap();

        let err = publish(&Unencodable, &target, Some(dir.path())).unwrap_err();

        assert!(matches!(err, PublishError::Encoding(_)));
        assert_eq!(read_record(&target), before);
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn missing_staging_dir_is_staging_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("status.json");
        let before = StatusRecord::new("running", "Doing stuff");
        publish(&before, &target, Some(dir.path())).unwrap();

        let err = publish(
            &StatusRecord::new("error", "Other stuff"),
            &target,
            Some(&dir.path().join("missing")),
        )
        .unwrap_err();

        assert!(matches!(err, PublishError::Staging { .. }));
        assert_eq!(read_record(&target), before);
    }

    #[test]
    fn missing_target_parent_is_publish_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nope").join("status.json");

        let err = publish(&StatusRecord::new("error", "Other stuff"), &target, Some(dir.path()))
            .unwrap_err();

        assert!(matches!(err, PublishError::Publish { .. }));
        assert!(!err.crosses_devices());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn directory_target_is_publish_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("status.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        let err = publish(&StatusRecord::new("error", "Other stuff"), &target, Some(dir.path()))
            .unwrap_err();

        assert!(matches!(err, PublishError::Publish { .. }));
        assert!(target.is_dir());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn failed_rename_keeps_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("status.json");
        let before = StatusRecord::new("running", "Doing stuff");
        publish(&before, &target, Some(dir.path())).unwrap();

        // A trailing slash makes rename(2) fail with ENOTDIR on the existing file.
        let mut through_slash = target.clone().into_os_string();
        through_slash.push("/");
        let err = publish(
            &StatusRecord::new("success", "More stuff"),
            Path::new(&through_slash),
            Some(dir.path()),
        )
        .unwrap_err();

        assert!(matches!(err, PublishError::Publish { .. }));
        assert_eq!(read_record(&target), before);
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn concurrent_readers_only_see_complete_records() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("status.json");
        let published: Vec<StatusRecord> = (0..200)
            .map(|i| StatusRecord::new(["running", "error", "success"][i % 3], "x".repeat(i * 37)))
            .collect();
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let target = target.clone();
                let done = Arc::clone(&done);
                let published = published.clone();
                thread::spawn(move || {
                    let mut seen = 0u64;
                    while !done.load(Ordering::Acquire) {
                        let bytes = match fs::read(&target) {
                            Ok(bytes) => bytes,
                            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                            Err(err) => panic!("read failed: {err}"),
                        };
                        let record: StatusRecord = serde_json::from_slice(&bytes)
                            .unwrap_or_else(|err| panic!("torn read: {err}"));
                        assert!(published.contains(&record));
                        seen += 1;
                    }
                    seen
                })
            })
            .collect();

        for record in &published {
            publish(record, &target, Some(dir.path())).unwrap();
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(read_record(&target), published[published.len() - 1]);
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn reader_sees_transitions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("status.json");
        let first = StatusRecord::new("running", "Doing stuff");
        let second = StatusRecord::new("success", "More stuff");
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let target = target.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut observed: Vec<StatusRecord> = Vec::new();
                while !done.load(Ordering::Acquire) {
                    let Ok(bytes) = fs::read(&target) else { continue };
                    let record: StatusRecord = serde_json::from_slice(&bytes).unwrap();
                    if observed.last() != Some(&record) {
                        observed.push(record);
                    }
                }
                observed
            })
        };

        publish(&first, &target, Some(dir.path())).unwrap();
        thread::sleep(Duration::from_millis(50));
        publish(&second, &target, Some(dir.path())).unwrap();
        thread::sleep(Duration::from_millis(50));
        done.store(true, Ordering::Release);

        let observed = reader.join().unwrap();
        assert!(
            [
                vec![],
                vec![first.clone()],
                vec![second.clone()],
                vec![first.clone(), second.clone()],
            ]
            .contains(&observed),
            "unexpected observation sequence: {observed:?}"
        );
    }
}
