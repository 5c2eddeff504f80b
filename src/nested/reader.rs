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

use std::cmp::min;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::nested::boundary::{BoundaryIndex, EntrySpan};
use crate::segment::SegmentIndex;

/// Reads a nested stream one entry at a time.
///
/// The reader starts before the first entry. [`NestedReader::next_entry`],
/// [`NestedReader::next_entry_skipping`] and [`NestedReader::entry`] position
/// it on an entry, after which [`Read`] yields that entry's bytes. Requests
/// for entries that do not exist return `false` and leave the reader where it
/// was.
pub struct NestedReader<D: Read + Seek> {
    data: D,
    segments: Arc<SegmentIndex>,
    boundaries: Arc<BoundaryIndex>,
    data_len: u64,

    current: Option<u64>,
    /// Byte range of the current entry while it is open.
    open: Option<(u64, u64)>,
    position: u64,
    needs_seek: bool,
}

impl<D: Read + Seek> NestedReader<D> {
    pub fn new(mut data: D, segments: Arc<SegmentIndex>, boundaries: Arc<BoundaryIndex>) -> Result<Self> {
        let data_len = data.seek(SeekFrom::End(0))?;
        segments.validate_against(data_len)?;
        boundaries.validate_against(segments.segment_count())?;

        Ok(Self {
            data,
            segments,
            boundaries,
            data_len,
            current: None,
            open: None,
            position: 0,
            needs_seek: true,
        })
    }

    pub fn entry_count(&self) -> u64 {
        self.boundaries.entry_count()
    }

    /// Index of the entry the reader is on, if any.
    pub fn current_entry(&self) -> Option<u64> {
        self.current
    }

    /// Moves to the entry after the current one.
    pub fn next_entry(&mut self) -> bool {
        self.next_entry_skipping(0)
    }

    /// Skips `skip` entries and moves to the one after them.
    pub fn next_entry_skipping(&mut self, skip: u64) -> bool {
        let next = self.current.map_or(0, |c| c + 1);
        match next.checked_add(skip) {
            Some(entry) => self.entry(entry),
            None => false,
        }
    }

    /// Moves to `entry`, forwards or backwards.
    pub fn entry(&mut self, entry: u64) -> bool {
        if entry >= self.entry_count() {
            debug!(
                "Ignoring request for entry {} of a stream with {} entries",
                entry,
                self.entry_count()
            );
            return false;
        }

        let span = self.span_of(entry);
        self.current = Some(entry);
        self.open = Some(span);
        self.position = span.0;
        self.needs_seek = true;
        true
    }

    /// Stops reading the current entry. Reads return end of stream until the
    /// reader is moved to another entry.
    pub fn close_entry(&mut self) {
        self.open = None;
    }

    /// Inner segments of the current entry.
    pub fn entry_segment_range(&self) -> Option<EntrySpan> {
        self.current.and_then(|entry| self.boundaries.entry(entry))
    }

    /// Offset in the data where the current entry starts.
    pub fn entry_byte_offset_start(&self) -> Option<u64> {
        self.current.map(|entry| self.span_of(entry).0)
    }

    /// Offset in the data where the current entry ends.
    pub fn entry_byte_offset_end(&self) -> Option<u64> {
        self.current.map(|entry| self.span_of(entry).1)
    }

    pub fn segment_index(&self) -> &Arc<SegmentIndex> {
        &self.segments
    }

    pub fn boundary_index(&self) -> &Arc<BoundaryIndex> {
        &self.boundaries
    }

    /// Returns the data source, consuming the reader.
    pub fn into_inner(self) -> D {
        self.data
    }

    fn span_of(&self, entry: u64) -> (u64, u64) {
        match self.boundaries.entry(entry) {
            Some(span) => self.segments.byte_span(span.start, span.end, self.data_len),
            None => (self.data_len, self.data_len),
        }
    }
}

impl<D: Read + Seek> Read for NestedReader<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some((_, end)) = self.open else {
            return Ok(0);
        };
        if buf.is_empty() || self.position >= end {
            return Ok(0);
        }

        if self.needs_seek {
            self.data.seek(SeekFrom::Start(self.position))?;
            self.needs_seek = false;
        }

        let want = min(buf.len() as u64, end - self.position) as usize;
        let n = self.data.read(&mut buf[..want])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Data ended at {} inside an entry ending at {}", self.position, end),
            ));
        }
        self.position += n as u64;
        Ok(n)
    }
}
