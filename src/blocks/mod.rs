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

//! Block compressed files with random access.
//!
//! A data stream is cut into fixed-size blocks (by default 1 MiB of
//! uncompressed bytes). Every block is compressed on its own, so a reader can
//! seek to any byte offset and only decompress the block holding it.
//!
//! # Key Components
//!
//! - [`writer::BlockWriter`]: buffers bytes, compresses full blocks and writes
//!   the block table and footer on close.
//! - [`reader::BlockReader`]: a `Read + Seek` view over the uncompressed
//!   stream that decompresses blocks lazily and caches only the current one.
//! - [`footer`]: encoding of the block table and footer.
//!
//! # File Structure
//!
//! ```text
//! +-----------+-----------+-----+-----------------------+----------+
//! |  block 0  |  block 1  | ... | block table           |  footer  |
//! | (gzipped) | (gzipped) |     | count x (len, hash)   | 48 bytes |
//! +-----------+-----------+-----+-----------------------+----------+
//! ```
//!
//! The footer has a fixed size so a reader finds it by seeking to
//! `file_len - 48`; it holds the block count and block size, which locate
//! the table without scanning any block data.

pub mod footer;
pub mod reader;
pub(crate) mod utils;
pub mod writer;

#[cfg(test)]
mod tests;

pub use reader::BlockReader;
pub use writer::{BlockWriter, BlockWriterConfig};
