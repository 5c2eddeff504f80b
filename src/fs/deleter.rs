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

//! Physical deletion of stream files and the directories left behind.
//!
//! Both operations can be interrupted through a [`TaskContext`] and can be
//! run again after an interruption or failure: work already done is not
//! repeated and missing files are not an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use glob::{glob, Pattern};
use log::{debug, info, warn};

use crate::error::{Result, StoreError};

/// Lets a long running task find out that it should stop.
pub trait TaskContext {
    fn is_terminated(&self) -> bool;
}

impl TaskContext for AtomicBool {
    fn is_terminated(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: TaskContext + ?Sized> TaskContext for &T {
    fn is_terminated(&self) -> bool {
        (**self).is_terminated()
    }
}

/// A task that is never told to stop.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unterminated;

impl TaskContext for Unterminated {
    fn is_terminated(&self) -> bool {
        false
    }
}

/// Deletes stream files and empty directories.
pub struct FileDeleter<C: TaskContext> {
    context: C,
}

impl FileDeleter<Unterminated> {
    pub fn new() -> Self {
        Self::with_context(Unterminated)
    }
}

impl Default for FileDeleter<Unterminated> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TaskContext> FileDeleter<C> {
    pub fn with_context(context: C) -> Self {
        Self { context }
    }

    /// Deletes every file in `dir` named `<base_name>.<anything>`.
    ///
    /// `on_deleted` receives the number of files deleted. Returns `Ok(true)`
    /// when no matching file is left, including when there was nothing to
    /// delete, and `Ok(false)` if a file could not be deleted or the task was
    /// terminated. A `dir` that exists but is not a directory is an error.
    pub fn delete_files_by_base_name<F: FnMut(usize)>(
        &self,
        id: u64,
        dir: &Path,
        base_name: &str,
        mut on_deleted: F,
    ) -> Result<bool> {
        if !dir.exists() {
            debug!("Nothing to delete for {}, {} does not exist", id, dir.display());
            return Ok(true);
        }
        if !dir.is_dir() {
            return Err(StoreError::NotADirectory(dir.to_path_buf()));
        }

        let pattern = Path::new(&Pattern::escape(&dir.to_string_lossy()))
            .join(format!("{}.*", Pattern::escape(base_name)));
        let paths = glob(&pattern.to_string_lossy())
            .map_err(|e| StoreError::Other(format!("Invalid glob pattern: {}", e)))?;

        let mut deleted = 0;
        let mut all_deleted = true;
        for entry in paths {
            if self.context.is_terminated() {
                info!("Stopped deleting files for {} after {} deletes", id, deleted);
                on_deleted(deleted);
                return Ok(false);
            }

            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Unable to inspect file for {}: {}", id, e);
                    all_deleted = false;
                    continue;
                }
            };
            if path.is_dir() {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Deleted {}", path.display());
                    deleted += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("{} was already deleted", path.display());
                }
                Err(e) => {
                    warn!("Unable to delete {}: {}", path.display(), e);
                    all_deleted = false;
                }
            }
        }

        info!("Deleted {} files for {} in {}", deleted, id, dir.display());
        on_deleted(deleted);
        Ok(all_deleted)
    }

    /// Deletes `dir` and then each parent up to, but not including, `root`,
    /// stopping at the first one that is not empty or was modified at or after
    /// `cutoff`.
    ///
    /// `on_deleted` receives the number of directories deleted. Stopping early
    /// is still a success; only termination returns `Ok(false)`. A `dir` that
    /// is not a directory or is not inside `root` is an error.
    pub fn try_delete_dir<F: FnMut(usize)>(
        &self,
        root: &Path,
        dir: &Path,
        cutoff: SystemTime,
        mut on_deleted: F,
    ) -> Result<bool> {
        if !dir.exists() {
            debug!("{} is already deleted", dir.display());
            return Ok(true);
        }
        if !dir.is_dir() {
            return Err(StoreError::NotADirectory(dir.to_path_buf()));
        }

        let root = root.canonicalize()?;
        let mut current: PathBuf = dir.canonicalize()?;
        if !current.starts_with(&root) {
            return Err(StoreError::OutsideRoot {
                root,
                dir: dir.to_path_buf(),
            });
        }

        // Removing a directory touches its parent, so each modification time
        // is read before the child is removed.
        let mut modified = fs::metadata(&current)?.modified()?;
        let mut deleted = 0;

        while current != root {
            if self.context.is_terminated() {
                info!("Stopped deleting directories after {} deletes", deleted);
                on_deleted(deleted);
                return Ok(false);
            }

            if modified >= cutoff {
                debug!("Keeping {}, modified after the cutoff", current.display());
                break;
            }
            if fs::read_dir(&current)?.next().is_some() {
                debug!("Keeping {}, not empty", current.display());
                break;
            }

            let Some(parent) = current.parent().map(Path::to_path_buf) else {
                break;
            };
            let parent_modified = fs::metadata(&parent)?.modified()?;

            match fs::remove_dir(&current) {
                Ok(()) => {
                    debug!("Deleted directory {}", current.display());
                    deleted += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    debug!("Keeping {}: {}", current.display(), e);
                    break;
                }
            }

            current = parent;
            modified = parent_modified;
        }

        if deleted > 0 {
            info!("Deleted {} empty directories under {}", deleted, root.display());
        }
        on_deleted(deleted);
        Ok(true)
    }
}
