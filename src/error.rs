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

//! Error types for rastore.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rastore operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The footer of a block compressed file could not be decoded.
    /// This is detected when the file is opened.
    #[error("Corrupt block file footer: {0}")]
    CorruptFooter(String),

    /// A compressed block failed its checksum or could not be decompressed.
    /// Only the read touching the block fails.
    #[error("Corrupt block {block}: {reason}")]
    CorruptBlock { block: u64, reason: String },

    /// A segment or boundary index is malformed.
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// Unsupported compression type.
    #[error("rastore has not been compiled with support for compression type: {0}")]
    UnsupportedCompressionType(u8),

    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A writer method was called in a state that does not allow it.
    #[error("Invalid writer state: {0}")]
    InvalidWriterState(String),

    /// We hit an invalid reader state.
    #[error("Invalid reader state: {0}")]
    InvalidReaderState(String),

    /// Attempted to write to a closed stream.
    #[error("Writing a closed stream")]
    WritingClosedFile,

    /// Another writer holds the lock file for this path.
    #[error("File is locked: {0}")]
    AlreadyLocked(PathBuf),

    /// An operation that requires a directory was given something else.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A directory operation was asked to work outside of its root.
    #[error("Directory {dir} is not inside root {root}")]
    OutsideRoot { root: PathBuf, dir: PathBuf },

    /// A general error occurred.
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Returns true for errors caused by damaged on-disk data.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StoreError::CorruptFooter(_)
                | StoreError::CorruptBlock { .. }
                | StoreError::CorruptIndex(_)
        )
    }
}

/// Converts errors raised inside `Read`/`Seek` implementations so they can be
/// returned through the std I/O traits.
impl From<StoreError> for io::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => e,
            e if e.is_corruption() => io::Error::new(io::ErrorKind::InvalidData, e),
            e => io::Error::new(io::ErrorKind::Other, e),
        }
    }
}

/// A specialized Result type for rastore operations.
pub type Result<T> = std::result::Result<T, StoreError>;
