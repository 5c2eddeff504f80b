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

//! Segmented streams.
//!
//! A segmented stream is a data stream plus a segment index recording where
//! each logical record ends. Readers use the index to expose only some of
//! the records, or a window of the stream, without scanning the data.
//!
//! ```text
//! data:   | A A A | B B | C C C C | D |
//! index:        3     5         9
//! ```
//!
//! The data is usually a block compressed stream, so skipping a segment costs
//! a seek rather than a decompression of everything in between.

pub mod index;
pub mod reader;
pub mod selection;
pub mod writer;

#[cfg(test)]
mod tests;

pub use index::SegmentIndex;
pub use reader::SegmentReader;
pub use selection::Selection;
pub use writer::{SegmentSink, SegmentWriter};
