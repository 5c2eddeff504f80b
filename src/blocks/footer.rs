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

//! Block table and footer encoding.
//!
//! Footer layout (all integers big-endian):
//!
//! ```text
//! +--------+------------+-------------+-----------+-------------+----------+-------------+
//! | magic  | block_size | block_count | total_len | compression | reserved | footer_hash |
//! |   8    |     8      |      8      |     8     |      1      |    7     |      8      |
//! +--------+------------+-------------+-----------+-------------+----------+-------------+
//! ```
//!
//! `footer_hash` is a HighwayHash of the first 40 bytes.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::{BufMut, BytesMut};

use crate::blocks::utils;
use crate::compression::CompressionType;
use crate::constants::{BLOCK_TABLE_ENTRY_SIZE, FOOTER_MAGIC, FOOTER_SIZE};
use crate::error::{Result, StoreError};
use crate::hash::highway_hash;

/// The fixed-size trailer of a block compressed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFooter {
    /// Uncompressed size of every block but the last.
    pub block_size: u64,
    /// Number of blocks in the file.
    pub block_count: u64,
    /// Total uncompressed length of the stream.
    pub total_len: u64,
    /// Compression applied to every block.
    pub compression_type: CompressionType,
}

impl BlockFooter {
    /// Serializes the footer.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(FOOTER_SIZE as usize);
        buf.put_slice(&FOOTER_MAGIC);
        buf.put_u64(self.block_size);
        buf.put_u64(self.block_count);
        buf.put_u64(self.total_len);
        buf.put_u8(self.compression_type.as_byte());
        buf.put_bytes(0, 7);

        let hash = highway_hash(&buf[..]);
        buf.put_u64(hash);
        buf
    }

    /// Parses and validates a footer.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != FOOTER_SIZE as usize {
            return Err(StoreError::CorruptFooter(format!(
                "Expected {} footer bytes, got {}",
                FOOTER_SIZE,
                data.len()
            )));
        }

        if data[0..8] != FOOTER_MAGIC {
            return Err(StoreError::CorruptFooter("Bad magic".to_string()));
        }

        let stored_hash = (&data[40..48]).read_u64::<BigEndian>()?;
        if highway_hash(&data[0..40]) != stored_hash {
            return Err(StoreError::CorruptFooter("Footer hash mismatch".to_string()));
        }

        let mut cursor = Cursor::new(&data[8..33]);
        let block_size = cursor.read_u64::<BigEndian>()?;
        let block_count = cursor.read_u64::<BigEndian>()?;
        let total_len = cursor.read_u64::<BigEndian>()?;
        let compression_type = CompressionType::from_byte(cursor.read_u8()?)?;

        utils::validate_block_size(block_size)
            .map_err(|_| StoreError::CorruptFooter(format!("Invalid block size {}", block_size)))?;

        let expected_count = utils::block_count_for(total_len, block_size);
        if expected_count != block_count {
            return Err(StoreError::CorruptFooter(format!(
                "Block count {} does not match {} bytes in blocks of {}",
                block_count, total_len, block_size
            )));
        }

        Ok(Self {
            block_size,
            block_count,
            total_len,
            compression_type,
        })
    }

    /// Size in bytes of the block table this footer describes.
    pub fn table_len(&self) -> Result<u64> {
        table_len_for(self.block_count)
    }

    /// Uncompressed length of block `index`.
    pub fn block_len(&self, index: u64) -> u64 {
        utils::uncompressed_block_len(index, self.total_len, self.block_size)
    }
}

/// One row of the block table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTableEntry {
    /// Length of the compressed block in the file.
    pub compressed_len: u64,
    /// HighwayHash of the compressed block bytes.
    pub hash: u64,
}

/// A table entry resolved to its position in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLocation {
    /// File offset of the first compressed byte.
    pub offset: u64,
    /// Length of the compressed block.
    pub compressed_len: u64,
    /// Expected HighwayHash of the compressed bytes.
    pub hash: u64,
}

fn table_len_for(block_count: u64) -> Result<u64> {
    block_count.checked_mul(BLOCK_TABLE_ENTRY_SIZE).ok_or_else(|| {
        StoreError::CorruptFooter(format!("Block count {} is too large for a block table", block_count))
    })
}

/// Serializes a block table.
pub fn encode_table(entries: &[BlockTableEntry]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(entries.len() * BLOCK_TABLE_ENTRY_SIZE as usize);
    for entry in entries {
        buf.put_u64(entry.compressed_len);
        buf.put_u64(entry.hash);
    }
    buf
}

/// Parses a block table and resolves block offsets.
///
/// `data_len` is the number of bytes between the start of the file and the
/// start of the table; the compressed blocks must fill it exactly.
pub fn decode_table(data: &[u8], block_count: u64, data_len: u64) -> Result<Vec<BlockLocation>> {
    if data.len() as u64 != table_len_for(block_count)? {
        return Err(StoreError::CorruptFooter(format!(
            "Block table holds {} bytes, expected {} entries",
            data.len(),
            block_count
        )));
    }

    let mut cursor = Cursor::new(data);
    let mut locations = Vec::with_capacity(block_count as usize);
    let mut offset = 0u64;

    for _ in 0..block_count {
        let compressed_len = cursor.read_u64::<BigEndian>()?;
        let hash = cursor.read_u64::<BigEndian>()?;
        locations.push(BlockLocation {
            offset,
            compressed_len,
            hash,
        });
        offset = offset.checked_add(compressed_len).ok_or_else(|| {
            StoreError::CorruptFooter("Block lengths overflow".to_string())
        })?;
    }

    if offset != data_len {
        return Err(StoreError::CorruptFooter(format!(
            "Blocks cover {} bytes but {} bytes precede the table",
            offset, data_len
        )));
    }

    Ok(locations)
}
