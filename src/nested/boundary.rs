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

//! The boundary index: which inner segments make up each entry.
//!
//! The index file holds one pair of big-endian `u64` values per entry, the
//! first inner segment of the entry and the segment after its last one.
//! When the file is missing the whole stream is a single entry.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::debug;

use crate::constants::BOUNDARY_INDEX_ENTRY_SIZE;
use crate::error::{Result, StoreError};

/// Half-open range of inner segments belonging to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySpan {
    pub start: u64,
    pub end: u64,
}

impl EntrySpan {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of inner segments in the entry.
    pub fn segment_count(&self) -> u64 {
        self.end - self.start
    }
}

/// Immutable, validated boundary index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryIndex {
    entries: Vec<EntrySpan>,
}

impl BoundaryIndex {
    /// Builds an index from entry spans, which must be ordered and must not
    /// overlap.
    pub fn from_entries(entries: Vec<EntrySpan>) -> Result<Self> {
        let mut previous_end = 0;
        for (i, entry) in entries.iter().enumerate() {
            if entry.start > entry.end || entry.start < previous_end {
                return Err(StoreError::CorruptIndex(format!(
                    "Entry {} spans segments {}..{} after an entry ending at {}",
                    i, entry.start, entry.end, previous_end
                )));
            }
            previous_end = entry.end;
        }
        Ok(Self { entries })
    }

    /// The index used when no boundary file exists: one entry holding every
    /// segment.
    pub fn single(segment_count: u64) -> Self {
        Self {
            entries: vec![EntrySpan::new(0, segment_count)],
        }
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;

        if raw.len() as u64 % BOUNDARY_INDEX_ENTRY_SIZE != 0 {
            return Err(StoreError::CorruptIndex(format!(
                "Boundary index length {} is not a multiple of {}",
                raw.len(),
                BOUNDARY_INDEX_ENTRY_SIZE
            )));
        }

        let mut cursor = &raw[..];
        let mut entries = Vec::with_capacity(raw.len() / BOUNDARY_INDEX_ENTRY_SIZE as usize);
        while !cursor.is_empty() {
            let start = cursor.read_u64::<BigEndian>()?;
            let end = cursor.read_u64::<BigEndian>()?;
            entries.push(EntrySpan::new(start, end));
        }

        debug!("Loaded boundary index with {} entries", entries.len());
        Self::from_entries(entries)
    }

    /// Reads an index that may not exist, given the number of inner segments.
    pub fn load<R: Read>(reader: Option<R>, segment_count: u64) -> Result<Self> {
        let index = match reader {
            Some(reader) => Self::read_from(reader)?,
            None => Self::single(segment_count),
        };
        index.validate_against(segment_count)?;
        Ok(index)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for entry in &self.entries {
            writer.write_u64::<BigEndian>(entry.start)?;
            writer.write_u64::<BigEndian>(entry.end)?;
        }
        Ok(())
    }

    /// Checks that every entry lies inside a stream of `segment_count` segments.
    pub fn validate_against(&self, segment_count: u64) -> Result<()> {
        match self.entries.last() {
            Some(last) if last.end > segment_count => Err(StoreError::CorruptIndex(format!(
                "Entry ends at segment {} of a stream with {} segments",
                last.end, segment_count
            ))),
            _ => Ok(()),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn entry(&self, entry: u64) -> Option<EntrySpan> {
        self.entries.get(entry as usize).copied()
    }

    pub fn entries(&self) -> &[EntrySpan] {
        &self.entries
    }
}
