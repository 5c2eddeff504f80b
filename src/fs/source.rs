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

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::blocks::BlockReader;
use crate::error::Result;
use crate::fs::paths::StreamPaths;
use crate::nested::{BoundaryIndex, CompoundReader, NestedReader};
use crate::segment::{SegmentIndex, SegmentReader};

/// Reads a stream written by a [`crate::fs::StreamTarget`].
///
/// Both index files are loaded when the source is opened and shared by every
/// reader it hands out. A missing segment index means the stream is a single
/// segment, and a missing boundary index means it is a single entry.
pub struct StreamSource {
    paths: StreamPaths,
    segments: Arc<SegmentIndex>,
    boundaries: Arc<BoundaryIndex>,
}

impl StreamSource {
    pub fn open(paths: StreamPaths) -> Result<Self> {
        let data_len = BlockReader::open(File::open(paths.data())?)?.len();

        let segments = SegmentIndex::load(open_optional(&paths.segment_index())?)?;
        segments.validate_against(data_len)?;
        let boundaries = BoundaryIndex::load(open_optional(&paths.boundary_index())?, segments.segment_count())?;

        debug!(
            "Opened stream {}: {} bytes, {} segments, {} entries",
            paths.data().display(),
            data_len,
            segments.segment_count(),
            boundaries.entry_count()
        );
        Ok(Self {
            paths,
            segments: Arc::new(segments),
            boundaries: Arc::new(boundaries),
        })
    }

    pub fn paths(&self) -> &StreamPaths {
        &self.paths
    }

    pub fn segment_index(&self) -> &Arc<SegmentIndex> {
        &self.segments
    }

    pub fn boundary_index(&self) -> &Arc<BoundaryIndex> {
        &self.boundaries
    }

    /// The uncompressed data, with no index applied.
    pub fn data_reader(&self) -> Result<BlockReader<File>> {
        BlockReader::open(File::open(self.paths.data())?)
    }

    pub fn segment_reader(&self) -> Result<SegmentReader<BlockReader<File>>> {
        SegmentReader::new(self.data_reader()?, self.segments.clone())
    }

    pub fn nested_reader(&self) -> Result<NestedReader<BlockReader<File>>> {
        NestedReader::new(self.data_reader()?, self.segments.clone(), self.boundaries.clone())
    }

    pub fn compound_reader(&self) -> Result<CompoundReader<BlockReader<File>>> {
        CompoundReader::new(self.data_reader()?, self.segments.clone(), self.boundaries.clone())
    }
}

fn open_optional(path: &Path) -> Result<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
