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
use crate::io::CloseWrite;
use crate::nested::boundary::{BoundaryIndex, EntrySpan};
use crate::segment::SegmentSink;

/// Groups the segments of an inner segmented stream into entries.
///
/// Each entry is bracketed by [`NestedWriter::put_next_entry`] and
/// [`NestedWriter::close_entry`]. Every entry after the first starts a new
/// inner segment, so entries never share a segment. Within an entry
/// [`NestedWriter::add_segment`] splits the entry into records.
///
/// The boundary index is written on close, and only when the stream holds
/// more than one entry.
pub struct NestedWriter<I: SegmentSink, B: CloseWrite> {
    inner: I,
    boundary: B,

    entries: Vec<EntrySpan>,

    /// First segment of the open entry.
    open_entry: Option<u64>,

    snapshot: Option<Arc<BoundaryIndex>>,
}

impl<I: SegmentSink, B: CloseWrite> NestedWriter<I, B> {
    pub fn new(inner: I, boundary: B) -> Self {
        Self {
            inner,
            boundary,
            entries: Vec::new(),
            open_entry: None,
            snapshot: None,
        }
    }

    /// Starts a new entry.
    pub fn put_next_entry(&mut self) -> Result<()> {
        self.check_open()?;
        if self.open_entry.is_some() {
            return Err(StoreError::InvalidWriterState(
                "Cannot start an entry while another is open".to_string(),
            ));
        }

        if !self.entries.is_empty() {
            self.inner.add_segment()?;
        }
        self.open_entry = Some(self.inner.current_segment());
        Ok(())
    }

    /// Ends the open entry.
    pub fn close_entry(&mut self) -> Result<()> {
        self.check_open()?;
        let start = self.open_entry.take().ok_or_else(|| {
            StoreError::InvalidWriterState("No entry is open".to_string())
        })?;

        let entry = EntrySpan::new(start, self.inner.current_segment() + 1);
        debug!(
            "Closed entry {} over segments {}..{}",
            self.entries.len(),
            entry.start,
            entry.end
        );
        self.entries.push(entry);
        Ok(())
    }

    /// Starts a new record inside the open entry.
    pub fn add_segment(&mut self) -> Result<()> {
        self.check_open()?;
        if self.open_entry.is_none() {
            return Err(StoreError::InvalidWriterState(
                "Segments can only be added inside an entry".to_string(),
            ));
        }
        self.inner.add_segment()
    }

    /// Number of entries closed so far.
    pub fn entry_count(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_entry_open(&self) -> bool {
        self.open_entry.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.snapshot.is_some()
    }

    /// The boundary index, once the writer is closed.
    pub fn index(&self) -> Option<Arc<BoundaryIndex>> {
        self.snapshot.clone()
    }

    pub fn inner_ref(&self) -> &I {
        &self.inner
    }

    /// Returns the inner stream and the boundary sink, consuming the writer.
    pub fn into_inner(self) -> (I, B) {
        (self.inner, self.boundary)
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(StoreError::WritingClosedFile);
        }
        Ok(())
    }

    /// Closes any open entry, writes the boundary index if there is more than
    /// one entry and closes the inner stream and boundary sink.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        if self.open_entry.is_some() {
            self.close_entry()?;
        }

        self.inner.close()?;

        let index = BoundaryIndex::from_entries(std::mem::take(&mut self.entries))?;
        if index.entry_count() > 1 {
            index.write_to(&mut self.boundary)?;
        }
        self.boundary.close()?;

        debug!("Closed nested stream with {} entries", index.entry_count());
        self.snapshot = Some(Arc::new(index));
        Ok(())
    }
}

impl<I: SegmentSink, B: CloseWrite> Write for NestedWriter<I, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        if self.open_entry.is_none() {
            return Err(StoreError::InvalidWriterState("Data can only be written inside an entry".to_string()).into());
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<I: SegmentSink, B: CloseWrite> CloseWrite for NestedWriter<I, B> {
    fn close(&mut self) -> Result<()> {
        NestedWriter::close(self)
    }
}
