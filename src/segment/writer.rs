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

use std::io::{self, Write};
use std::sync::Arc;

use log::debug;

use crate::error::{Result, StoreError};
use crate::io::{CloseWrite, StreamPosition};
use crate::segment::index::SegmentIndex;

/// A sink that can be split into segments.
///
/// Implemented by [`SegmentWriter`]; the nested writer is generic over it so
/// entries can be laid on top of any segmented sink.
pub trait SegmentSink: CloseWrite {
    /// Ends the current segment at the current position and starts the next.
    fn add_segment(&mut self) -> Result<()>;

    /// Number of the segment currently being written.
    fn current_segment(&self) -> u64;
}

/// Writes a data stream together with its segment index.
///
/// Data written through [`Write`] goes straight to the data sink. Each call to
/// [`SegmentWriter::add_segment`] records the data position as a segment
/// boundary. The boundaries are kept in memory and written to the index sink
/// on close. If no boundary was recorded nothing is written to the index
/// sink, so a lazily created index file never appears.
pub struct SegmentWriter<W: Write + StreamPosition + CloseWrite, I: CloseWrite> {
    data: W,
    index: I,

    /// Boundaries recorded so far. Owned by the writer until close.
    offsets: Vec<u64>,

    /// The index as written, available once closed.
    snapshot: Option<Arc<SegmentIndex>>,
}

impl<W: Write + StreamPosition + CloseWrite, I: CloseWrite> SegmentWriter<W, I> {
    pub fn new(data: W, index: I) -> Self {
        Self {
            data,
            index,
            offsets: Vec::new(),
            snapshot: None,
        }
    }

    /// Ends the current segment at the current data position.
    pub fn add_segment(&mut self) -> Result<()> {
        if self.is_closed() {
            return Err(StoreError::WritingClosedFile);
        }
        self.offsets.push(self.data.position());
        Ok(())
    }

    /// Number of the segment currently being written.
    pub fn current_segment(&self) -> u64 {
        self.offsets.len() as u64
    }

    /// Boundaries recorded so far.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn is_closed(&self) -> bool {
        self.snapshot.is_some()
    }

    /// The index that was written, once the writer is closed.
    pub fn index(&self) -> Option<Arc<SegmentIndex>> {
        self.snapshot.clone()
    }

    pub fn data_ref(&self) -> &W {
        &self.data
    }

    pub fn index_ref(&self) -> &I {
        &self.index
    }

    /// Returns the data and index sinks, consuming the writer.
    pub fn into_inner(self) -> (W, I) {
        (self.data, self.index)
    }

    /// Closes the data sink, writes the index if any segment was added and
    /// closes the index sink.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }

        self.data.close()?;

        let index = SegmentIndex::from_offsets(std::mem::take(&mut self.offsets))?;
        if !index.is_empty() {
            index.write_to(&mut self.index)?;
        }
        self.index.close()?;

        debug!(
            "Closed segmented stream: {} bytes in {} segments",
            self.data.position(),
            index.segment_count()
        );
        self.snapshot = Some(Arc::new(index));
        Ok(())
    }
}

impl<W: Write + StreamPosition + CloseWrite, I: CloseWrite> Write for SegmentWriter<W, I> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Err(StoreError::WritingClosedFile.into());
        }
        self.data.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.data.flush()
    }
}

impl<W: Write + StreamPosition + CloseWrite, I: CloseWrite> StreamPosition for SegmentWriter<W, I> {
    fn position(&self) -> u64 {
        self.data.position()
    }
}

impl<W: Write + StreamPosition + CloseWrite, I: CloseWrite> CloseWrite for SegmentWriter<W, I> {
    fn close(&mut self) -> Result<()> {
        SegmentWriter::close(self)
    }
}

impl<W: Write + StreamPosition + CloseWrite, I: CloseWrite> SegmentSink for SegmentWriter<W, I> {
    fn add_segment(&mut self) -> Result<()> {
        SegmentWriter::add_segment(self)
    }

    fn current_segment(&self) -> u64 {
        SegmentWriter::current_segment(self)
    }
}
