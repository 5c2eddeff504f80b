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

use std::path::{Path, PathBuf};

use crate::constants::{BOUNDARY_INDEX_EXTENSION, DATA_FILE_EXTENSION, SEGMENT_INDEX_EXTENSION};

/// The physical files of one stream, all sharing a base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPaths {
    dir: PathBuf,
    base_name: String,
}

impl StreamPaths {
    pub fn new(dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_name: base_name.into(),
        }
    }

    /// Paths of stream `id` stored under `root`, laid out by [`FsPrefix`].
    pub fn for_id(root: impl AsRef<Path>, id: u64) -> Self {
        Self::new(FsPrefix::dir_for(root, id), FsPrefix::padded_id(id))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// `<base>.bgz`
    pub fn data(&self) -> PathBuf {
        self.with_extension(DATA_FILE_EXTENSION)
    }

    /// `<base>.seg.dat`
    pub fn segment_index(&self) -> PathBuf {
        self.with_extension(SEGMENT_INDEX_EXTENSION)
    }

    /// `<base>.bdy.dat`
    pub fn boundary_index(&self) -> PathBuf {
        self.with_extension(BOUNDARY_INDEX_EXTENSION)
    }

    pub fn all(&self) -> [PathBuf; 3] {
        [self.data(), self.segment_index(), self.boundary_index()]
    }

    fn with_extension(&self, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.base_name, extension))
    }
}

/// Spreads stream ids over a directory tree.
///
/// An id is zero padded to a multiple of three digits and split into groups
/// of three. Every group but the last names a directory, so no directory
/// holds more than a thousand streams or subdirectories:
///
/// ```text
/// 7         -> 007
/// 1234      -> 001/001234
/// 987654321 -> 987/654/987654321
/// ```
pub struct FsPrefix;

impl FsPrefix {
    /// The id padded with zeros to a multiple of three digits.
    pub fn padded_id(id: u64) -> String {
        let digits = id.to_string();
        let width = digits.len().div_ceil(3) * 3;
        format!("{:0>width$}", digits, width = width)
    }

    /// The directories an id is stored under, relative to the root.
    pub fn prefix_dirs(id: u64) -> PathBuf {
        let padded = Self::padded_id(id);
        let groups = padded.len() / 3;
        (0..groups - 1)
            .map(|g| &padded[g * 3..g * 3 + 3])
            .collect()
    }

    /// The directory holding stream `id` under `root`.
    pub fn dir_for(root: impl AsRef<Path>, id: u64) -> PathBuf {
        root.as_ref().join(Self::prefix_dirs(id))
    }
}
