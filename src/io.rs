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

//! Small I/O seams shared by the writer layers.
//!
//! Every writer in this crate wraps another one: the segment writer wraps a
//! block writer, the nested writer wraps a segment writer, and at the bottom a
//! [`crate::fs::LockingFile`] commits bytes to disk. Two traits let those
//! layers compose:
//!
//! - [`StreamPosition`]: the number of bytes written so far, which is what a
//!   segment boundary records.
//! - [`CloseWrite`]: an explicit, fallible close that propagates down the stack
//!   so trailers, indexes and renames happen exactly once.

use std::fs::File;
use std::io::{Cursor, Result as IoResult, Write};

use crate::error::Result;

/// A sink that reports its logical write position.
pub trait StreamPosition {
    /// Number of bytes written through this sink so far.
    fn position(&self) -> u64;
}

/// A sink that must be closed explicitly to finish its output.
///
/// `close` must be idempotent.
pub trait CloseWrite: Write {
    fn close(&mut self) -> Result<()>;
}

impl CloseWrite for Vec<u8> {
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl CloseWrite for Cursor<Vec<u8>> {
    fn close(&mut self) -> Result<()> {
        self.flush()?;
        Ok(())
    }
}

impl CloseWrite for File {
    fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.sync_all()?;
        Ok(())
    }
}

impl<T: CloseWrite + ?Sized> CloseWrite for &mut T {
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// A wrapper around any `Write` sink that counts the bytes written through it.
///
/// This gives a [`StreamPosition`] to sinks that have none of their own, such
/// as a plain file or an in-memory buffer holding an uncompressed stream.
pub struct PositionTracker<Sink: Write> {
    /// The underlying sink to write to
    sink: Sink,

    /// Bytes written since the tracker was created
    position: u64,
}

impl<Sink: Write> PositionTracker<Sink> {
    /// Create a new PositionTracker wrapping the given sink.
    pub fn new(sink: Sink) -> Self {
        Self { sink, position: 0 }
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &Sink {
        &self.sink
    }

    /// Returns the underlying sink, consuming self.
    pub fn into_inner(self) -> Sink {
        self.sink
    }
}

impl<Sink: Write> Write for PositionTracker<Sink> {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        let written = self.sink.write(buf)?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> IoResult<()> {
        self.sink.flush()
    }
}

impl<Sink: Write> StreamPosition for PositionTracker<Sink> {
    fn position(&self) -> u64 {
        self.position
    }
}

impl<Sink: CloseWrite> CloseWrite for PositionTracker<Sink> {
    fn close(&mut self) -> Result<()> {
        self.sink.close()
    }
}
