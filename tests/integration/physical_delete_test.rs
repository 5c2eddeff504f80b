// Copyright 2024
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for deleting streams and pruning their directories.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, SystemTime};

use tempfile::tempdir;

use rastore::error::{Result, StoreError};
use rastore::fs::{FileDeleter, StreamPaths, StreamTarget};

fn write_stream(paths: &StreamPaths, entries: usize) -> Result<()> {
    let mut target = StreamTarget::create(paths.clone())?;
    for entry in 0..entries {
        target.put_next_entry()?;
        for record in 0..3 {
            if record > 0 {
                target.add_segment()?;
            }
            writeln!(target, "entry {} record {}", entry, record)?;
        }
        target.close_entry()?;
    }
    target.close()
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

fn after_now() -> SystemTime {
    SystemTime::now() + Duration::from_secs(60)
}

#[test]
fn test_delete_stream_then_directories() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let root = tempdir().expect("Failed to create temp dir");
    let doomed = StreamPaths::for_id(root.path(), 5_001_002);
    let kept = StreamPaths::for_id(root.path(), 7_001_002);
    write_stream(&doomed, 2)?;
    write_stream(&kept, 2)?;
    assert_eq!(count_files(doomed.dir()), 3);

    let deleter = FileDeleter::new();
    let mut file_deletes = 0;
    assert!(deleter.delete_files_by_base_name(
        5_001_002,
        doomed.dir(),
        doomed.base_name(),
        |n| file_deletes += n
    )?);
    assert_eq!(file_deletes, 3);
    assert_eq!(count_files(doomed.dir()), 0);

    let mut dir_deletes = 0;
    assert!(deleter.try_delete_dir(root.path(), doomed.dir(), after_now(), |n| dir_deletes += n)?);
    // 005/001 and 005 go; the root stays.
    assert_eq!(dir_deletes, 2);
    assert!(!root.path().join("005").exists());
    assert!(root.path().exists());

    for path in kept.all() {
        assert!(path.exists(), "{} was deleted", path.display());
    }
    Ok(())
}

#[test]
fn test_delete_is_idempotent() -> Result<()> {
    let root = tempdir().expect("Failed to create temp dir");
    let paths = StreamPaths::for_id(root.path(), 42);
    write_stream(&paths, 3)?;

    let deleter = FileDeleter::new();
    let mut deletes = 0;
    assert!(deleter.delete_files_by_base_name(42, paths.dir(), paths.base_name(), |n| deletes += n)?);
    assert_eq!(deletes, 3);

    let mut again = 0;
    assert!(deleter.delete_files_by_base_name(42, paths.dir(), paths.base_name(), |n| again += n)?);
    assert_eq!(again, 0);

    // A directory that has already gone is fine too.
    let gone = root.path().join("999");
    assert!(deleter.delete_files_by_base_name(42, &gone, "999", |_| {})?);
    assert!(deleter.try_delete_dir(root.path(), &gone, after_now(), |_| {})?);
    Ok(())
}

#[test]
fn test_recent_directories_are_kept() -> Result<()> {
    let root = tempdir().expect("Failed to create temp dir");
    let paths = StreamPaths::for_id(root.path(), 3_000);
    write_stream(&paths, 1)?;

    let deleter = FileDeleter::new();
    deleter.delete_files_by_base_name(3_000, paths.dir(), paths.base_name(), |_| {})?;

    let cutoff = SystemTime::now() - Duration::from_secs(3600);
    let mut dir_deletes = 0;
    assert!(deleter.try_delete_dir(root.path(), paths.dir(), cutoff, |n| dir_deletes += n)?);
    assert_eq!(dir_deletes, 0);
    assert!(paths.dir().exists());
    Ok(())
}

#[test]
fn test_terminated_task_leaves_files() -> Result<()> {
    let root = tempdir().expect("Failed to create temp dir");
    let paths = StreamPaths::for_id(root.path(), 8);
    write_stream(&paths, 2)?;

    let terminated = AtomicBool::new(true);
    let deleter = FileDeleter::with_context(&terminated);
    assert!(!deleter.delete_files_by_base_name(8, paths.dir(), paths.base_name(), |_| {})?);
    assert_eq!(count_files(paths.dir()), 3);

    // Running again once the task may continue finishes the job.
    let deleter = FileDeleter::new();
    assert!(deleter.delete_files_by_base_name(8, paths.dir(), paths.base_name(), |_| {})?);
    assert_eq!(count_files(paths.dir()), 0);
    Ok(())
}

#[test]
fn test_preconditions_are_fatal() {
    let root = tempdir().expect("Failed to create temp dir");
    let elsewhere = tempdir().expect("Failed to create temp dir");
    let deleter = FileDeleter::new();

    assert!(matches!(
        deleter.try_delete_dir(root.path(), elsewhere.path(), after_now(), |_| {}),
        Err(StoreError::OutsideRoot { .. })
    ));
    assert!(elsewhere.path().exists());
}
