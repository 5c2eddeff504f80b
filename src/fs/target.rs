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

use std::fs;
use std::io::{self, Write};

use log::{debug, error};

use crate::blocks::{BlockWriter, BlockWriterConfig};
use crate::error::Result;
use crate::fs::locking_file::LockingFile;
use crate::fs::paths::StreamPaths;
use crate::nested::NestedWriter;
use crate::segment::SegmentWriter;

/// Configuration options for StreamTarget.
#[derive(Debug, Clone, Default)]
pub struct StreamTargetConfig {
    /// Block layout and compression of the data file.
    pub block_config: BlockWriterConfig,
}

type SegmentedData = SegmentWriter<BlockWriter<LockingFile>, LockingFile>;

/// Writes a stream to its three files.
///
/// The data file is locked as soon as the target is created. The index files
/// are only created if they receive an entry. Closing the target closes all
/// three files together; a target dropped without being closed is closed
/// then, with any error logged. Once a write to the data file has failed the
/// target can no longer be closed, and dropping it removes every lock file.
pub struct StreamTarget {
    paths: StreamPaths,
    writer: NestedWriter<SegmentedData, LockingFile>,
}

impl StreamTarget {
    pub fn create(paths: StreamPaths) -> Result<Self> {
        Self::with_config(paths, StreamTargetConfig::default())
    }

    pub fn with_config(paths: StreamPaths, config: StreamTargetConfig) -> Result<Self> {
        fs::create_dir_all(paths.dir())?;

        let data = BlockWriter::with_config(LockingFile::create(paths.data())?, config.block_config)?;
        let segments = SegmentWriter::new(data, LockingFile::create_lazy(paths.segment_index())?);
        let writer = NestedWriter::new(segments, LockingFile::create_lazy(paths.boundary_index())?);

        debug!("Created stream target {}", paths.data().display());
        Ok(Self { paths, writer })
    }

    pub fn paths(&self) -> &StreamPaths {
        &self.paths
    }

    pub fn put_next_entry(&mut self) -> Result<()> {
        self.writer.put_next_entry()
    }

    pub fn close_entry(&mut self) -> Result<()> {
        self.writer.close_entry()
    }

    pub fn add_segment(&mut self) -> Result<()> {
        self.writer.add_segment()
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_closed()
    }

    /// Commits the data file and whichever index files were written.
    pub fn close(&mut self) -> Result<()> {
        self.writer.close()
    }
}

impl Write for StreamTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for StreamTarget {
    fn drop(&mut self) {
        if !self.writer.is_closed() {
            if let Err(e) = self.writer.close() {
                error!("Unable to close stream {}: {}", self.paths.data().display(), e);
            }
        }
    }
}
