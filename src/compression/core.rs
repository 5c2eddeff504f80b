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

use bytes::Bytes;

use crate::compression::gzip::{GzipCompressor, GzipDecompressor};
use crate::constants::{COMPRESSION_TYPE_GZIP, COMPRESSION_TYPE_NONE, COMPRESSION_TYPE_ZSTD};
use crate::error::{Result, StoreError};

/// Compression applied independently to every block of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Gzip,
    Zstd,
}

impl CompressionType {
    pub(crate) fn as_byte(&self) -> u8 {
        match self {
            CompressionType::None => COMPRESSION_TYPE_NONE,
            CompressionType::Gzip => COMPRESSION_TYPE_GZIP,
            CompressionType::Zstd => COMPRESSION_TYPE_ZSTD,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            COMPRESSION_TYPE_NONE => Ok(CompressionType::None),
            COMPRESSION_TYPE_GZIP => Ok(CompressionType::Gzip),
            COMPRESSION_TYPE_ZSTD if cfg!(feature = "zstd") => Ok(CompressionType::Zstd),
            other => Err(StoreError::UnsupportedCompressionType(other)),
        }
    }

    /// The level used when none is configured.
    pub fn default_level(&self) -> i32 {
        match self {
            CompressionType::None => 0,
            CompressionType::Gzip => 6,
            CompressionType::Zstd => 3,
        }
    }
}

/// Compresses one block at a time, reusing internal buffers between calls.
pub trait Compressor {
    fn compress<'a>(&'a mut self, data: &'a [u8]) -> Result<&'a [u8]>;
}

/// Decompresses one block at a time.
///
/// `expected_output_size` is the uncompressed block length recorded when the
/// block was written; a mismatch is an error.
pub trait Decompressor {
    fn decompress(&mut self, compressed_data: Bytes, expected_output_size: usize) -> Result<Bytes>;
}

/// Blocks stored without compression.
#[derive(Debug, Default)]
pub struct NoCompression;

impl Compressor for NoCompression {
    fn compress<'a>(&'a mut self, data: &'a [u8]) -> Result<&'a [u8]> {
        Ok(data)
    }
}

impl Decompressor for NoCompression {
    fn decompress(&mut self, compressed_data: Bytes, expected_output_size: usize) -> Result<Bytes> {
        if compressed_data.len() != expected_output_size {
            return Err(StoreError::Other(format!(
                "Stored block size mismatch: expected {}, got {}",
                expected_output_size,
                compressed_data.len()
            )));
        }
        Ok(compressed_data)
    }
}

pub(crate) fn create_compressor(
    compression_type: CompressionType,
    level: i32,
) -> Result<Box<dyn Compressor + Send>> {
    match compression_type {
        CompressionType::None => Ok(Box::new(NoCompression)),
        CompressionType::Gzip => Ok(Box::new(GzipCompressor::with_level(level)?)),
        #[cfg(feature = "zstd")]
        CompressionType::Zstd => Ok(Box::new(crate::compression::zstd::ZstdCompressor::with_level(level)?)),
        #[cfg(not(feature = "zstd"))]
        CompressionType::Zstd => Err(StoreError::UnsupportedCompressionType(COMPRESSION_TYPE_ZSTD)),
    }
}

pub(crate) fn create_decompressor(
    compression_type: CompressionType,
) -> Result<Box<dyn Decompressor + Send>> {
    match compression_type {
        CompressionType::None => Ok(Box::new(NoCompression)),
        CompressionType::Gzip => Ok(Box::new(GzipDecompressor::new())),
        #[cfg(feature = "zstd")]
        CompressionType::Zstd => Ok(Box::new(crate::compression::zstd::ZstdDecompressor::new())),
        #[cfg(not(feature = "zstd"))]
        CompressionType::Zstd => Err(StoreError::UnsupportedCompressionType(COMPRESSION_TYPE_ZSTD)),
    }
}
