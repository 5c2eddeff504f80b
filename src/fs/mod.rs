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

//! Streams on disk.
//!
//! A stream is stored as up to three files sharing a base name, see
//! [`StreamPaths`]. [`StreamTarget`] writes them and [`StreamSource`] reads
//! them back. Every file is written through a [`LockingFile`], so a crash
//! leaves lock files behind rather than truncated streams.
//!
//! [`FileDeleter`] removes the files of deleted streams and prunes the empty
//! directories they leave.

pub mod deleter;
pub mod locking_file;
pub mod paths;
pub mod source;
pub mod target;

pub use deleter::{FileDeleter, TaskContext, Unterminated};
pub use locking_file::LockingFile;
pub use paths::{FsPrefix, StreamPaths};
pub use source::StreamSource;
pub use target::{StreamTarget, StreamTargetConfig};
