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

use bytes::{Bytes, BytesMut};
use log::{debug, warn};

use crate::blocks::footer::{decode_table, BlockFooter, BlockLocation};
use crate::blocks::utils;
use crate::compression::{create_decompressor, CompressionType, Decompressor};
use crate::constants::{DEFAULT_BLOCK_SIZE, FOOTER_SIZE};
use crate::error::{Result, StoreError};
use crate::hash::highway_hash;

/// The block currently held in decompressed form.
struct CachedBlock {
    index: u64,
    data: Bytes,
}

/// Random access reader over a block compressed file.
///
/// The footer and block table are read and validated when the reader is
/// opened; block data is only touched when a read needs it. Damage inside a
/// block is therefore reported by the read that reaches that block, as an
/// `io::ErrorKind::InvalidData` error wrapping [`StoreError::CorruptBlock`],
/// while other blocks stay readable.
///
/// Positions used by [`Seek`] and reported by [`BlockReader::position`] are
/// offsets into the uncompressed stream.
pub struct BlockReader<Source: Read + Seek> {
    /// The underlying source to read compressed data from.
    source: Source,

    footer: BlockFooter,

    /// Location of every block in the source.
    blocks: Vec<BlockLocation>,

    decompressor: Box<dyn Decompressor + Send>,

    /// Current offset in the uncompressed stream.
    position: u64,

    /// Offset remembered by [`BlockReader::mark`].
    mark: Option<u64>,

    /// Only the most recently used block is kept.
    current: Option<CachedBlock>,
}

impl<Source: Read + Seek> BlockReader<Source> {
    /// Opens a block compressed stream, reading its footer and block table.
    ///
    /// A zero-length source is treated as an empty stream.
    pub fn open(mut source: Source) -> Result<Self> {
        let file_len = source.seek(SeekFrom::End(0))?;

        if file_len == 0 {
            debug!("Opening zero-length block file as an empty stream");
            return Self::from_parts(
                source,
                BlockFooter {
                    block_size: DEFAULT_BLOCK_SIZE,
                    block_count: 0,
                    total_len: 0,
                    compression_type: CompressionType::None,
                },
                Vec::new(),
            );
        }

        if file_len < FOOTER_SIZE {
            return Err(StoreError::CorruptFooter(format!(
                "File of {} bytes is too short for a footer",
                file_len
            )));
        }

        let mut footer_bytes = [0u8; FOOTER_SIZE as usize];
        source.seek(SeekFrom::Start(file_len - FOOTER_SIZE))?;
        source.read_exact(&mut footer_bytes)?;
        let footer = BlockFooter::decode(&footer_bytes)?;

        let table_len = footer.table_len()?;
        if table_len > file_len - FOOTER_SIZE {
            return Err(StoreError::CorruptFooter(format!(
                "Block count {} does not fit in a file of {} bytes",
                footer.block_count, file_len
            )));
        }

        let table_start = file_len - FOOTER_SIZE - table_len;
        let mut table_bytes = vec![0u8; table_len as usize];
        source.seek(SeekFrom::Start(table_start))?;
        source.read_exact(&mut table_bytes)?;
        let blocks = decode_table(&table_bytes, footer.block_count, table_start)?;

        debug!(
            "Opened block file: {} bytes in {} blocks of {} ({:?})",
            footer.total_len, footer.block_count, footer.block_size, footer.compression_type
        );

        Self::from_parts(source, footer, blocks)
    }

    fn from_parts(source: Source, footer: BlockFooter, blocks: Vec<BlockLocation>) -> Result<Self> {
        Ok(Self {
            source,
            decompressor: create_decompressor(footer.compression_type)?,
            footer,
            blocks,
            position: 0,
            mark: None,
            current: None,
        })
    }

    /// Total uncompressed length of the stream.
    pub fn len(&self) -> u64 {
        self.footer.total_len
    }

    /// Returns true if the stream holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.footer.total_len == 0
    }

    /// Uncompressed size of each block.
    pub fn block_size(&self) -> u64 {
        self.footer.block_size
    }

    /// Number of blocks in the file.
    pub fn block_count(&self) -> u64 {
        self.footer.block_count
    }

    /// Compression used by the blocks of this file.
    pub fn compression_type(&self) -> CompressionType {
        self.footer.compression_type
    }

    /// Current offset in the uncompressed stream.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Remembers the current position for a later [`BlockReader::reset`].
    pub fn mark(&mut self) {
        self.mark = Some(self.position);
    }

    /// Returns to the position remembered by the last [`BlockReader::mark`].
    ///
    /// The block holding that position is decompressed again on the next read
    /// if it is no longer cached.
    pub fn reset(&mut self) -> Result<()> {
        match self.mark {
            Some(mark) => {
                self.position = mark;
                Ok(())
            }
            None => Err(StoreError::InvalidReaderState(
                "Cannot reset a block reader that has not been marked".to_string(),
            )),
        }
    }

    /// Returns the underlying source, consuming self.
    pub fn into_inner(self) -> Source {
        self.source
    }

    /// Makes block `index` the cached block, decompressing it if needed.
    fn load_block(&mut self, index: u64) -> Result<Bytes> {
        if let Some(cached) = &self.current {
            if cached.index == index {
                return Ok(cached.data.clone());
            }
        }

        let location = self.blocks[index as usize];
        let mut compressed = BytesMut::zeroed(location.compressed_len as usize);
        self.source.seek(SeekFrom::Start(location.offset))?;
        if let Err(e) = self.source.read_exact(&mut compressed) {
            return Err(match e.kind() {
                io::ErrorKind::UnexpectedEof => StoreError::CorruptBlock {
                    block: index,
                    reason: "Truncated block data".to_string(),
                },
                _ => StoreError::Io(e),
            });
        }

        if highway_hash(&compressed) != location.hash {
            warn!("Block {} failed its checksum", index);
            return Err(StoreError::CorruptBlock {
                block: index,
                reason: "Block hash mismatch".to_string(),
            });
        }

        let expected_len = self.footer.block_len(index) as usize;
        let data = self
            .decompressor
            .decompress(compressed.freeze(), expected_len)
            .map_err(|e| StoreError::CorruptBlock {
                block: index,
                reason: e.to_string(),
            })?;

        debug!("Loaded block {} ({} bytes)", index, data.len());
        self.current = Some(CachedBlock {
            index,
            data: data.clone(),
        });
        Ok(data)
    }
}

impl<Source: Read + Seek> Read for BlockReader<Source> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.position >= self.footer.total_len {
            return Ok(0);
        }

        let block_size = self.footer.block_size;
        let index = utils::block_index(self.position, block_size);
        let block = self.load_block(index)?;

        let offset_in_block = (self.position - index * block_size) as usize;
        let available = &block[offset_in_block..];
        let n = min(buf.len(), available.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n as u64;

        Ok(n)
    }
}

impl<Source: Read + Seek> Seek for BlockReader<Source> {
    /// Moves the cursor without touching block data. Seeking past the end is
    /// allowed; reads from there return end of stream.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => self.footer.total_len.checked_add_signed(delta),
        };

        match target {
            Some(offset) => {
                self.position = offset;
                Ok(offset)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}
