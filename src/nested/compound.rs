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

use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::nested::boundary::BoundaryIndex;
use crate::segment::{SegmentIndex, SegmentReader};

/// Random access to the records of each entry of a nested stream.
///
/// [`CompoundReader::entry_reader`] returns a segment reader bounded to one
/// entry, whose segments are numbered from 0 within that entry. Finding the
/// entry and its segments are both index lookups, and only the blocks holding
/// the selected records are decompressed.
pub struct CompoundReader<D: Read + Seek> {
    data: D,
    segments: Arc<SegmentIndex>,
    boundaries: Arc<BoundaryIndex>,
}

impl<D: Read + Seek> CompoundReader<D> {
    pub fn new(mut data: D, segments: Arc<SegmentIndex>, boundaries: Arc<BoundaryIndex>) -> Result<Self> {
        let data_len = data.seek(SeekFrom::End(0))?;
        segments.validate_against(data_len)?;
        boundaries.validate_against(segments.segment_count())?;

        Ok(Self {
            data,
            segments,
            boundaries,
        })
    }

    pub fn entry_count(&self) -> u64 {
        self.boundaries.entry_count()
    }

    /// Opens a reader over the records of `entry`, or `None` if there is no
    /// such entry.
    pub fn entry_reader(&mut self, entry: u64) -> Result<Option<SegmentReader<&mut D>>> {
        let Some(span) = self.boundaries.entry(entry) else {
            debug!(
                "Ignoring request for entry {} of a stream with {} entries",
                entry,
                self.entry_count()
            );
            return Ok(None);
        };

        let reader = SegmentReader::with_segment_window(&mut self.data, self.segments.clone(), span.start, span.end)?;
        Ok(Some(reader))
    }

    /// Returns the data source, consuming the reader.
    pub fn into_inner(self) -> D {
        self.data
    }
}
