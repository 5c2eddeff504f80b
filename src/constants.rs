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

//! Constants used in the rastore file formats.

/// Default uncompressed size of a block in bytes (1 MiB).
pub const DEFAULT_BLOCK_SIZE: u64 = 1 << 20;

/// Magic bytes opening the footer of a block compressed file.
pub const FOOTER_MAGIC: [u8; 8] = *b"RABGZIP1";

/// Size of the fixed footer at the end of a block compressed file.
pub const FOOTER_SIZE: u64 = 48;

/// Size of one block table entry: compressed length and block hash.
pub const BLOCK_TABLE_ENTRY_SIZE: u64 = 16;

/// Size of one segment index entry (a single u64 offset).
pub const SEGMENT_INDEX_ENTRY_SIZE: u64 = 8;

/// Size of one boundary index entry (start and end segment).
pub const BOUNDARY_INDEX_ENTRY_SIZE: u64 = 16;

/// Compression type: None
pub const COMPRESSION_TYPE_NONE: u8 = 0;

/// Compression type: Gzip
pub const COMPRESSION_TYPE_GZIP: u8 = b'g';

/// Compression type: Zstd
pub const COMPRESSION_TYPE_ZSTD: u8 = b'z';

/// Extension of block compressed data files.
pub const DATA_FILE_EXTENSION: &str = "bgz";

/// Extension of segment index files.
pub const SEGMENT_INDEX_EXTENSION: &str = "seg.dat";

/// Extension of boundary index files.
pub const BOUNDARY_INDEX_EXTENSION: &str = "bdy.dat";

/// Extension appended to a file while it is being written.
pub const LOCK_EXTENSION: &str = "lock";

/// The HighwayHash key used for block and footer checksums.
/// This is 'rastore/', 'blocks\n\0', 'rastore/', 'blocks\n\0' in 64-bit chunks.
pub const HIGHWAY_HASH_KEY: [u64; 4] = [
    0x2f65726f74736172,
    0x000a736b636f6c62,
    0x2f65726f74736172,
    0x000a736b636f6c62,
];
