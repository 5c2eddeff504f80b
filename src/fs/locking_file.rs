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

//! Output files that only appear once they are complete.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::constants::LOCK_EXTENSION;
use crate::error::{Result, StoreError};
use crate::io::CloseWrite;

/// A file written under a lock name and renamed into place on close.
///
/// Bytes go to `<path>.lock`. [`LockingFile::close`] flushes and syncs the
/// lock file, then renames it to `<path>`. A `LockingFile` dropped without
/// being closed removes its lock file, so readers never see a partial file.
///
/// A lazy `LockingFile` creates its lock file on the first non-empty write.
/// If nothing is ever written, closing it creates no file at all.
#[derive(Debug)]
pub struct LockingFile {
    path: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
    closed: bool,
}

impl LockingFile {
    /// Creates the lock file for `path` immediately.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let mut file = Self::create_lazy(path)?;
        file.open_lock()?;
        Ok(file)
    }

    /// Prepares to write `path` without touching the filesystem yet.
    pub fn create_lazy(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let lock_path = lock_path_for(&path);
        Ok(Self {
            path,
            lock_path,
            file: None,
            closed: false,
        })
    }

    /// The path the file is committed to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path written to until the file is committed.
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn open_lock(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.lock_path)
                .map_err(|e| match e.kind() {
                    io::ErrorKind::AlreadyExists => StoreError::AlreadyLocked(self.lock_path.clone()),
                    _ => StoreError::Io(e),
                })?;
            self.file = Some(file);
        }

        self.file
            .as_mut()
            .ok_or_else(|| StoreError::Other("Lock file missing after open".to_string()))
    }

    /// Syncs the lock file and renames it into place.
    ///
    /// Closing more than once is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        if let Some(mut file) = self.file.take() {
            file.flush()?;
            file.sync_all()?;
            drop(file);
            fs::rename(&self.lock_path, &self.path)?;
            info!("Committed {}", self.path.display());
        }

        self.closed = true;
        Ok(())
    }
}

impl Write for LockingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(StoreError::WritingClosedFile.into());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        Ok(self.open_lock()?.write(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl CloseWrite for LockingFile {
    fn close(&mut self) -> Result<()> {
        LockingFile::close(self)
    }
}

impl Drop for LockingFile {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Some(file) = self.file.take() {
            drop(file);
            match fs::remove_file(&self.lock_path) {
                Ok(()) => warn!("Removed abandoned lock file {}", self.lock_path.display()),
                Err(e) => error!(
                    "Unable to remove abandoned lock file {}: {}",
                    self.lock_path.display(),
                    e
                ),
            }
        }
    }
}

/// `<path>.lock`
pub(crate) fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(LOCK_EXTENSION);
    PathBuf::from(name)
}
