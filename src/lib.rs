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

//! rastore stores compressed log streams with random access to their records.
//!
//! A stream is a block compressed data file that can be read from any offset,
//! a segment index marking where each record ends, and a boundary index
//! grouping records into entries. Readers use the indexes to fetch "record N
//! of entry M" by decompressing only the blocks that hold it.

pub mod blocks;
pub mod compression;
pub mod constants;
pub mod error;
pub mod fs;
pub(crate) mod hash;
pub mod io;
pub mod nested;
pub mod segment;

pub use error::{Result, StoreError};
