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

//! Gzip compression of blocks using flate2.
//!
//! Every block is written as a complete gzip member, so a block can be
//! decompressed without any of its neighbours.

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::compression::core::{Compressor, Decompressor};
use crate::error::{Result, StoreError};

/// Gzip compressor with a reusable output buffer.
#[derive(Debug)]
pub struct GzipCompressor {
    compressed_buffer: Vec<u8>,
    compression_level: u32,
}

impl GzipCompressor {
    /// Create a new GzipCompressor with the default level (6).
    pub fn new() -> Self {
        Self {
            compressed_buffer: Vec::new(),
            compression_level: 6,
        }
    }

    /// Create a new GzipCompressor with specified compression level (0-9).
    pub fn with_level(level: i32) -> Result<Self> {
        if !(0..=9).contains(&level) {
            return Err(StoreError::InvalidConfig(format!(
                "Invalid gzip compression level: {}. Must be between 0 and 9.",
                level
            )));
        }

        Ok(Self {
            compressed_buffer: Vec::new(),
            compression_level: level as u32,
        })
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for GzipCompressor {
    fn compress<'a>(&'a mut self, data: &'a [u8]) -> Result<&'a [u8]> {
        let mut buffer = std::mem::take(&mut self.compressed_buffer);
        buffer.clear();

        let mut encoder = GzEncoder::new(buffer, Compression::new(self.compression_level));
        encoder
            .write_all(data)
            .map_err(|e| StoreError::Other(format!("Gzip compression failed: {}", e)))?;
        self.compressed_buffer = encoder
            .finish()
            .map_err(|e| StoreError::Other(format!("Gzip compression failed: {}", e)))?;

        Ok(&self.compressed_buffer)
    }
}

/// Gzip decompressor.
#[derive(Debug, Default)]
pub struct GzipDecompressor {
    buffer: Vec<u8>,
}

impl GzipDecompressor {
    /// Create a new GzipDecompressor with an empty output buffer.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }
}

impl Decompressor for GzipDecompressor {
    fn decompress(&mut self, compressed_data: Bytes, expected_output_size: usize) -> Result<Bytes> {
        self.buffer.clear();
        self.buffer.reserve(expected_output_size);

        let mut decoder = GzDecoder::new(&compressed_data[..]);
        decoder
            .read_to_end(&mut self.buffer)
            .map_err(|e| StoreError::Other(format!("Gzip decompression failed: {}", e)))?;

        if self.buffer.len() != expected_output_size {
            return Err(StoreError::Other(format!(
                "Gzip decompression size mismatch: expected {}, got {}",
                expected_output_size,
                self.buffer.len()
            )));
        }

        Ok(Bytes::from(std::mem::take(&mut self.buffer)))
    }
}
