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

use log::{debug, warn};

use crate::error::{Result, StoreError};
use crate::segment::index::SegmentIndex;
use crate::segment::selection::Selection;

/// The part of the data a reader exposes.
///
/// Segments `first_segment..first_segment + segment_count` of the index
/// overlap the byte range `byte_start..byte_end`. Segment numbers used by the
/// reader are relative to `first_segment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    byte_start: u64,
    byte_end: u64,
    first_segment: u64,
    segment_count: u64,
}

/// Reads the selected segments of a data stream.
///
/// By default every segment is read. [`SegmentReader::include`] and
/// [`SegmentReader::exclude`] narrow the selection; they must be called
/// before the first read. Requests naming a segment outside the reader are
/// ignored.
///
/// A reader may be bounded to a window of the stream. Segment 0 is then the
/// segment holding the start of the window, and segments crossing the window
/// edges are clipped to it. All byte offsets reported by the reader are
/// offsets into the whole data stream.
pub struct SegmentReader<D: Read + Seek> {
    data: D,
    index: Arc<SegmentIndex>,
    data_len: u64,
    window: Window,
    selection: Selection,

    /// Byte ranges still to be read, fixed by the first read.
    ranges: Option<Vec<(u64, u64)>>,
    next_range: usize,

    /// Offset in the data of the next byte to read.
    position: u64,
    needs_seek: bool,
}

impl<D: Read + Seek> SegmentReader<D> {
    /// Creates a reader over the whole data stream.
    pub fn new(mut data: D, index: Arc<SegmentIndex>) -> Result<Self> {
        let data_len = data_len(&mut data, &index)?;
        let window = Window {
            byte_start: 0,
            byte_end: data_len,
            first_segment: 0,
            segment_count: index.segment_count(),
        };
        Ok(Self::from_parts(data, index, data_len, window))
    }

    /// Creates a reader over bytes `byte_start..byte_end` of the data.
    pub fn with_byte_window(mut data: D, index: Arc<SegmentIndex>, byte_start: u64, byte_end: u64) -> Result<Self> {
        let data_len = data_len(&mut data, &index)?;
        if byte_start > byte_end || byte_end > data_len {
            return Err(StoreError::InvalidReaderState(format!(
                "Window {}..{} is outside {} bytes of data",
                byte_start, byte_end, data_len
            )));
        }

        let first_segment = match byte_start {
            0 => 0,
            start => index.segment_at(start, data_len, true).unwrap_or(0),
        };
        let last_segment = if byte_end < data_len {
            index.segment_at(byte_end, data_len, false).unwrap_or(0)
        } else {
            index.segment_count() - 1
        };

        let window = Window {
            byte_start,
            byte_end,
            first_segment,
            segment_count: (last_segment + 1).saturating_sub(first_segment),
        };
        Ok(Self::from_parts(data, index, data_len, window))
    }

    /// Creates a reader over segments `first..end` of the data.
    pub fn with_segment_window(mut data: D, index: Arc<SegmentIndex>, first: u64, end: u64) -> Result<Self> {
        let data_len = data_len(&mut data, &index)?;
        if first > end || end > index.segment_count() {
            return Err(StoreError::InvalidReaderState(format!(
                "Segments {}..{} are outside a stream of {} segments",
                first,
                end,
                index.segment_count()
            )));
        }

        let (byte_start, byte_end) = index.byte_span(first, end, data_len);

        let window = Window {
            byte_start,
            byte_end,
            first_segment: first,
            segment_count: end - first,
        };
        Ok(Self::from_parts(data, index, data_len, window))
    }

    fn from_parts(data: D, index: Arc<SegmentIndex>, data_len: u64, window: Window) -> Self {
        debug!(
            "Segment reader over bytes {}..{} with {} segments",
            window.byte_start, window.byte_end, window.segment_count
        );
        Self {
            data,
            index,
            data_len,
            window,
            selection: Selection::default(),
            ranges: None,
            next_range: 0,
            position: window.byte_start,
            needs_seek: true,
        }
    }

    /// Number of segments visible through this reader.
    pub fn count(&self) -> u64 {
        self.window.segment_count
    }

    /// Number of bytes in the window, whatever the selection.
    pub fn size(&self) -> u64 {
        self.window.byte_end - self.window.byte_start
    }

    /// The window as a byte range of the data.
    pub fn window(&self) -> (u64, u64) {
        (self.window.byte_start, self.window.byte_end)
    }

    /// Length of the whole data stream.
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    pub fn index(&self) -> &Arc<SegmentIndex> {
        &self.index
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Returns the data source, consuming the reader.
    pub fn into_inner(self) -> D {
        self.data
    }

    /// Reads `segment`, switching to reading only included segments.
    pub fn include(&mut self, segment: u64) {
        if self.can_select(Some(segment)) {
            self.selection.include(segment);
        }
    }

    /// Skips `segment`, switching to reading every segment not excluded.
    pub fn exclude(&mut self, segment: u64) {
        if self.can_select(Some(segment)) {
            self.selection.exclude(segment);
        }
    }

    pub fn include_all(&mut self) {
        if self.can_select(None) {
            self.selection.include_all();
        }
    }

    pub fn exclude_all(&mut self) {
        if self.can_select(None) {
            self.selection.exclude_all();
        }
    }

    fn can_select(&self, segment: Option<u64>) -> bool {
        if self.ranges.is_some() {
            warn!("Ignoring segment selection change after reading has started");
            return false;
        }
        match segment {
            Some(segment) if segment >= self.count() => {
                debug!(
                    "Ignoring request for segment {} of a reader with {} segments",
                    segment,
                    self.count()
                );
                false
            }
            _ => true,
        }
    }

    /// Byte range of `segment`, clipped to the window.
    pub fn segment_byte_range(&self, segment: u64) -> Option<(u64, u64)> {
        if segment >= self.count() {
            return None;
        }
        let physical = self.window.first_segment + segment;
        let start = self.index.segment_start(physical).max(self.window.byte_start);
        let end = self
            .index
            .segment_end(physical, self.data_len)
            .min(self.window.byte_end);
        Some((start, end))
    }

    /// Offset where `segment` starts. `count()` maps to the end of the window.
    pub fn byte_offset(&self, segment: u64) -> Option<u64> {
        if segment == self.count() {
            return Some(self.window.byte_end);
        }
        self.segment_byte_range(segment).map(|(start, _)| start)
    }

    /// Offset where `segment` ends.
    pub fn byte_offset_end(&self, segment: u64) -> Option<u64> {
        self.segment_byte_range(segment).map(|(_, end)| end)
    }

    /// Finds the segment holding `offset`.
    ///
    /// See [`SegmentIndex::segment_at`] for how offsets on a boundary are
    /// resolved. Offsets outside the window have no segment.
    pub fn segment_at_byte_offset(&self, offset: u64, start_boundary: bool) -> Option<u64> {
        if self.count() == 0 || offset < self.window.byte_start || offset > self.window.byte_end {
            return None;
        }
        let physical = self.index.segment_at(offset, self.data_len, start_boundary)?;
        let logical = physical.saturating_sub(self.window.first_segment);
        Some(min(logical, self.count() - 1))
    }

    /// Byte ranges of the selected segments, with touching ranges merged.
    fn selected_ranges(&self) -> Vec<(u64, u64)> {
        let mut ranges: Vec<(u64, u64)> = Vec::new();
        for segment in self.selection.selected(self.count()) {
            let Some((start, end)) = self.segment_byte_range(segment) else {
                continue;
            };
            if start >= end {
                continue;
            }
            match ranges.last_mut() {
                Some(last) if last.1 == start => last.1 = end,
                _ => ranges.push((start, end)),
            }
        }
        ranges
    }
}

/// Length of the data, checked against the index.
fn data_len<D: Seek>(data: &mut D, index: &SegmentIndex) -> Result<u64> {
    let len = data.seek(SeekFrom::End(0))?;
    index.validate_against(len)?;
    Ok(len)
}

impl<D: Read + Seek> Read for SegmentReader<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.ranges.is_none() {
            self.ranges = Some(self.selected_ranges());
        }

        loop {
            let range = self
                .ranges
                .as_ref()
                .and_then(|ranges| ranges.get(self.next_range).copied());
            let Some((start, end)) = range else {
                return Ok(0);
            };

            if self.position < start {
                self.position = start;
                self.needs_seek = true;
            }
            if self.position >= end {
                self.next_range += 1;
                continue;
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
                    format!("Data ended at {} inside segment bytes {}..{}", self.position, start, end),
                ));
            }
            self.position += n as u64;
            return Ok(n);
        }
    }
}
