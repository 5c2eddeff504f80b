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

//! The segment index: byte offsets that split a stream into records.
//!
//! The index file is a flat sequence of big-endian `u64` values. Value `i` is
//! the uncompressed offset where segment `i` ends and segment `i + 1` begins.
//! The first segment implicitly starts at 0 and the last one ends at the end
//! of the data, so an index of `n` offsets describes `n + 1` segments and a
//! missing index describes a single segment covering the whole stream.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::{BufMut, BytesMut};
use log::debug;

use crate::constants::SEGMENT_INDEX_ENTRY_SIZE;
use crate::error::{Result, StoreError};

/// Immutable, validated segment index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentIndex {
    offsets: Vec<u64>,
}

impl SegmentIndex {
    /// An index with no recorded offsets: the whole stream is one segment.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds an index from recorded offsets.
    ///
    /// Offsets must never decrease. Equal neighbours are allowed and describe
    /// an empty segment.
    pub fn from_offsets(offsets: Vec<u64>) -> Result<Self> {
        if let Some(i) = offsets.windows(2).position(|w| w[1] < w[0]) {
            return Err(StoreError::CorruptIndex(format!(
                "Segment offset {} at position {} is before offset {}",
                offsets[i + 1],
                i + 1,
                offsets[i]
            )));
        }
        Ok(Self { offsets })
    }

    /// Reads a serialized index.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;

        if raw.len() as u64 % SEGMENT_INDEX_ENTRY_SIZE != 0 {
            return Err(StoreError::CorruptIndex(format!(
                "Segment index length {} is not a multiple of {}",
                raw.len(),
                SEGMENT_INDEX_ENTRY_SIZE
            )));
        }

        let mut cursor = &raw[..];
        let mut offsets = Vec::with_capacity(raw.len() / SEGMENT_INDEX_ENTRY_SIZE as usize);
        while !cursor.is_empty() {
            offsets.push(cursor.read_u64::<BigEndian>()?);
        }

        debug!("Loaded segment index with {} offsets", offsets.len());
        Self::from_offsets(offsets)
    }

    /// Reads an index that may not exist.
    pub fn load<R: Read>(reader: Option<R>) -> Result<Self> {
        match reader {
            Some(reader) => Self::read_from(reader),
            None => Ok(Self::empty()),
        }
    }

    /// Serializes the offsets.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.offsets.len() * SEGMENT_INDEX_ENTRY_SIZE as usize);
        for offset in &self.offsets {
            buf.put_u64(*offset);
        }
        buf
    }

    /// Writes the serialized offsets to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for offset in &self.offsets {
            writer.write_u64::<BigEndian>(*offset)?;
        }
        Ok(())
    }

    /// The recorded offsets.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Returns true if no offsets were recorded.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Number of segments described, which is always at least one.
    pub fn segment_count(&self) -> u64 {
        self.offsets.len() as u64 + 1
    }

    /// Offset where `segment` starts.
    ///
    /// `segment` must be below [`SegmentIndex::segment_count`].
    pub fn segment_start(&self, segment: u64) -> u64 {
        match segment {
            0 => 0,
            n => self.offsets[n as usize - 1],
        }
    }

    /// Offset where `segment` ends, given the length of the data.
    pub fn segment_end(&self, segment: u64, data_len: u64) -> u64 {
        self.offsets
            .get(segment as usize)
            .copied()
            .unwrap_or(data_len)
    }

    /// Byte range covered by segments `first..end`.
    ///
    /// An empty range sits where segment `first` starts.
    pub fn byte_span(&self, first: u64, end: u64, data_len: u64) -> (u64, u64) {
        let start = if first < self.segment_count() {
            self.segment_start(first)
        } else {
            data_len
        };
        if end <= first {
            (start, start)
        } else {
            (start, self.segment_end(end - 1, data_len))
        }
    }

    /// Checks that every offset lies inside data of `data_len` bytes.
    pub fn validate_against(&self, data_len: u64) -> Result<()> {
        match self.offsets.last() {
            Some(&last) if last > data_len => Err(StoreError::CorruptIndex(format!(
                "Segment offset {} is past the end of {} bytes of data",
                last, data_len
            ))),
            _ => Ok(()),
        }
    }

    /// Finds the segment holding byte `offset` of data of `data_len` bytes.
    ///
    /// An offset can sit on a boundary shared by two segments (or several, if
    /// some are empty). With `start_boundary` the segment starting at the
    /// offset wins, taking the first of any empty segments that start there.
    /// Otherwise the segment ending at the offset wins. Offsets past the end
    /// of the data have no segment.
    pub fn segment_at(&self, offset: u64, data_len: u64, start_boundary: bool) -> Option<u64> {
        if offset > data_len {
            return None;
        }

        if start_boundary {
            if offset == 0 {
                return Some(0);
            }
            // Offset `i` is where segment `i + 1` starts.
            let before = self.offsets.partition_point(|&o| o < offset);
            let segment = if self.offsets.get(before) == Some(&offset) {
                before + 1
            } else {
                before
            };
            Some(segment as u64)
        } else {
            Some(self.offsets.partition_point(|&o| o < offset) as u64)
        }
    }
}
