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

use bytes::{BufMut, BytesMut};
use log::{debug, warn};

use crate::blocks::footer::{encode_table, BlockFooter, BlockTableEntry};
use crate::blocks::utils;
use crate::compression::{create_compressor, CompressionType, Compressor};
use crate::constants::DEFAULT_BLOCK_SIZE;
use crate::error::{Result, StoreError};
use crate::hash::highway_hash;
use crate::io::{CloseWrite, StreamPosition};

/// Configuration options for BlockWriter.
#[derive(Debug, Clone)]
pub struct BlockWriterConfig {
    /// Uncompressed size of a block in bytes (default: 1 MiB).
    pub block_size: u64,

    /// Compression applied to each block.
    pub compression_type: CompressionType,

    /// Level passed to the compressor.
    pub compression_level: i32,
}

impl Default for BlockWriterConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            compression_type: CompressionType::Gzip,
            compression_level: CompressionType::Gzip.default_level(),
        }
    }
}

impl BlockWriterConfig {
    /// Creates a new BlockWriterConfig with custom block size.
    ///
    /// Small block sizes are mostly useful in tests, where they make block
    /// boundaries easy to hit with human-readable data.
    pub fn with_block_size(block_size: u64) -> Result<Self> {
        utils::validate_block_size(block_size)?;
        Ok(Self {
            block_size,
            ..Self::default()
        })
    }

    /// Returns a copy of this config using the given compression.
    pub fn with_compression(mut self, compression_type: CompressionType, level: i32) -> Result<Self> {
        // Building a compressor validates the level for the codec.
        create_compressor(compression_type, level)?;
        self.compression_type = compression_type;
        self.compression_level = level;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        utils::validate_block_size(self.block_size)
    }
}

/// Writer for block compressed files.
///
/// Bytes written through [`Write`] are buffered until a full block has been
/// collected, then the block is compressed and appended to the sink. Only the
/// final block may be shorter than `block_size`.
///
/// [`BlockWriter::close`] must be called to emit the last block, the block
/// table and the footer. Without it the file cannot be opened.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
/// use std::io::Write;
/// use rastore::blocks::BlockWriter;
///
/// let file = File::create("example.bgz").unwrap();
/// let mut writer = BlockWriter::new(file).unwrap();
/// writer.write_all(b"first line\n").unwrap();
/// writer.close().unwrap();
/// ```
pub struct BlockWriter<Sink: CloseWrite> {
    /// The underlying sink.
    sink: Sink,

    /// Configuration options.
    config: BlockWriterConfig,

    compressor: Box<dyn Compressor + Send>,

    /// Uncompressed bytes of the block being collected.
    buffer: BytesMut,

    /// Table rows of the blocks written so far.
    table: Vec<BlockTableEntry>,

    /// Uncompressed bytes accepted so far.
    position: u64,

    /// Compressed bytes written to the sink so far.
    compressed_position: u64,

    closed: bool,

    /// Set once a sink or compressor error has lost data.
    failed: bool,
}

impl<Sink: CloseWrite> BlockWriter<Sink> {
    /// Creates a new BlockWriter with default configuration.
    pub fn new(sink: Sink) -> Result<Self> {
        Self::with_config(sink, BlockWriterConfig::default())
    }

    /// Creates a new BlockWriter with custom configuration.
    pub fn with_config(sink: Sink, config: BlockWriterConfig) -> Result<Self> {
        config.validate()?;
        let compressor = create_compressor(config.compression_type, config.compression_level)?;

        Ok(Self {
            sink,
            buffer: BytesMut::with_capacity(config.block_size as usize),
            config,
            compressor,
            table: Vec::new(),
            position: 0,
            compressed_position: 0,
            closed: false,
            failed: false,
        })
    }

    /// Returns the configuration of this writer.
    pub fn config(&self) -> &BlockWriterConfig {
        &self.config
    }

    /// Number of blocks written to the sink so far.
    pub fn block_count(&self) -> u64 {
        self.table.len() as u64
    }

    /// Number of compressed bytes written to the sink so far.
    pub fn compressed_position(&self) -> u64 {
        self.compressed_position
    }

    /// Returns true once [`BlockWriter::close`] has completed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns true if a write failed; such a writer can no longer be closed.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &Sink {
        &self.sink
    }

    /// Returns the underlying sink, consuming the writer.
    pub fn into_inner(self) -> Sink {
        self.sink
    }

    /// Appends bytes to the stream, emitting every block that fills up.
    fn append(&mut self, mut data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(StoreError::WritingClosedFile);
        }
        self.check_not_failed()?;

        let block_size = self.config.block_size as usize;
        while !data.is_empty() {
            let room = block_size - self.buffer.len();
            let take = std::cmp::min(room, data.len());
            self.buffer.put_slice(&data[..take]);
            self.position += take as u64;
            data = &data[take..];

            if self.buffer.len() == block_size {
                if let Err(e) = self.write_block() {
                    warn!("Block file write failed, the file will not be committed: {}", e);
                    self.failed = true;
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Compresses the collected block and appends it to the sink.
    fn write_block(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let block_len = self.buffer.len();
        let compressed = self.compressor.compress(&self.buffer[..])?;
        self.sink.write_all(compressed)?;

        let entry = BlockTableEntry {
            compressed_len: compressed.len() as u64,
            hash: highway_hash(compressed),
        };
        debug!(
            "Wrote block {} ({} -> {} bytes)",
            self.table.len(),
            block_len,
            entry.compressed_len
        );

        self.buffer.clear();
        self.table.push(entry);
        self.compressed_position += entry.compressed_len;
        Ok(())
    }

    /// Writes the final block, the block table and the footer, then closes the sink.
    ///
    /// Calling close more than once is a no-op. A writer whose sink has
    /// failed refuses to close, leaving the sink unclosed.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.check_not_failed()?;

        let result = self.finish();
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn finish(&mut self) -> Result<()> {
        self.write_block()?;

        let footer = BlockFooter {
            block_size: self.config.block_size,
            block_count: self.table.len() as u64,
            total_len: self.position,
            compression_type: self.config.compression_type,
        };

        self.sink.write_all(&encode_table(&self.table))?;
        self.sink.write_all(&footer.encode())?;
        self.sink.close()?;
        self.closed = true;

        debug!(
            "Closed block file: {} bytes in {} blocks ({} compressed)",
            self.position, footer.block_count, self.compressed_position
        );
        Ok(())
    }

    fn check_not_failed(&self) -> Result<()> {
        if self.failed {
            return Err(StoreError::InvalidWriterState(
                "A previous write to the block file failed".to_string(),
            ));
        }
        Ok(())
    }
}

impl<Sink: CloseWrite> Write for BlockWriter<Sink> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf)?;
        Ok(buf.len())
    }

    /// Flushes the sink. A partially filled block stays buffered, as every
    /// block but the last must hold exactly `block_size` bytes.
    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl<Sink: CloseWrite> StreamPosition for BlockWriter<Sink> {
    fn position(&self) -> u64 {
        self.position
    }
}

impl<Sink: CloseWrite> CloseWrite for BlockWriter<Sink> {
    fn close(&mut self) -> Result<()> {
        BlockWriter::close(self)
    }
}
