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

//! Nested streams: entries made of segments.
//!
//! A nested stream adds a second index above a segmented stream. Each entry,
//! typically one source document, covers a run of inner segments, typically
//! one per record:
//!
//! ```text
//! segments: | 0 | 1 | 2 | 3 | 4 |
//! entries:  |   0   |     1     |
//! ```
//!
//! [`NestedWriter`] records the entries as they are written, [`NestedReader`]
//! reads whole entries and [`CompoundReader`] reads selected records of an
//! entry.

pub mod boundary;
pub mod compound;
pub mod reader;
pub mod writer;

#[cfg(test)]
mod tests;

pub use boundary::{BoundaryIndex, EntrySpan};
pub use compound::CompoundReader;
pub use reader::NestedReader;
pub use writer::NestedWriter;
