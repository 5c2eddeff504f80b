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

//! Zstd compression of blocks using the zstd-rs crate.

use crate::compression::core::{Compressor, Decompressor};
use crate::error::{Result, StoreError};
use bytes::Bytes;

/// Zstd compressor implementation
///
/// Maintains internal buffers for efficient compression operations.
#[derive(Debug)]
pub struct ZstdCompressor {
    /// Internal buffer for compressed data
    compressed_buffer: Vec<u8>,
    /// Compression level (1-22, higher = better compression but slower)
    compression_level: i32,
}

impl ZstdCompressor {
    /// Create a new ZstdCompressor with specified compression level (1-22).
    pub fn with_level(level: i32) -> Result<Self> {
        if !(1..=22).contains(&level) {
            return Err(StoreError::InvalidConfig(format!(
                "Invalid zstd compression level: {}. Must be between 1 and 22.",
                level
            )));
        }

        Ok(Self {
            compressed_buffer: Vec::new(),
            compression_level: level,
        })
    }
}

impl Compressor for ZstdCompressor {
    fn compress<'a>(&'a mut self, data: &'a [u8]) -> Result<&'a [u8]> {
        self.compressed_buffer.clear();

        let max_compressed_size = zstd::zstd_safe::compress_bound(data.len());
        self.compressed_buffer.resize(max_compressed_size, 0);

        match zstd::bulk::compress_to_buffer(data, &mut self.compressed_buffer, self.compression_level) {
            Ok(compressed_size) => Ok(&self.compressed_buffer[..compressed_size]),
            Err(e) => Err(StoreError::Other(format!("Zstd compression failed: {}", e))),
        }
    }
}

/// Zstd decompressor implementation
#[derive(Debug, Default)]
pub struct ZstdDecompressor {
    /// Reusable buffer for decompressed data to avoid allocations
    buffer: Vec<u8>,
}

impl ZstdDecompressor {
    /// Create a new ZstdDecompressor with an empty output buffer.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }
}

impl Decompressor for ZstdDecompressor {
    fn decompress(&mut self, compressed_data: Bytes, expected_output_size: usize) -> Result<Bytes> {
        self.buffer.resize(expected_output_size, 0);

        match zstd::bulk::decompress_to_buffer(&compressed_data[..], &mut self.buffer) {
            Ok(actual_size) => {
                if actual_size != expected_output_size {
                    return Err(StoreError::Other(format!(
                        "Zstd decompression size mismatch: expected {}, got {}",
                        expected_output_size, actual_size
                    )));
                }

                // mem::take leaves an empty Vec ready for the next block
                Ok(Bytes::from(std::mem::take(&mut self.buffer)))
            }
            Err(e) => Err(StoreError::Other(format!("Zstd decompression failed: {}", e))),
        }
    }
}
