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

//! Integration tests for streams written to and read from disk.

use std::fs;
use std::io::{self, Read, Write};
use std::thread;

use tempfile::tempdir;

use rastore::blocks::{BlockWriter, BlockWriterConfig};
use rastore::compression::CompressionType;
use rastore::error::{Result, StoreError};
use rastore::fs::{LockingFile, StreamPaths, StreamSource, StreamTarget, StreamTargetConfig};
use rastore::io::CloseWrite;
use rastore::nested::NestedWriter;
use rastore::segment::SegmentWriter;

fn small_blocks() -> StreamTargetConfig {
    StreamTargetConfig {
        block_config: BlockWriterConfig::with_block_size(32).unwrap(),
    }
}

/// Writes each entry as a list of records.
fn write_stream(paths: &StreamPaths, entries: &[&[&str]]) -> Result<()> {
    let mut target = StreamTarget::with_config(paths.clone(), small_blocks())?;
    for records in entries {
        target.put_next_entry()?;
        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                target.add_segment()?;
            }
            target.write_all(record.as_bytes())?;
        }
        target.close_entry()?;
    }
    target.close()
}

fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

#[test]
fn test_record_of_entry_from_disk() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempdir().expect("Failed to create temp dir");
    let paths = StreamPaths::for_id(dir.path(), 1234);
    write_stream(&paths, &[&["1A\n1B\n", "1C\n1D\n"], &["2A\n2B\n", "2C\n2D\n"]])?;

    assert_eq!(
        file_names(paths.dir()),
        vec!["001234.bdy.dat", "001234.bgz", "001234.seg.dat"]
    );

    let source = StreamSource::open(paths)?;
    assert_eq!(source.boundary_index().entry_count(), 2);
    assert_eq!(source.segment_index().segment_count(), 4);

    let mut compound = source.compound_reader()?;
    let mut reader = compound.entry_reader(1)?.expect("entry 1 exists");
    reader.include(1);
    let mut record = String::new();
    reader.read_to_string(&mut record)?;
    assert_eq!(record, "2C\n2D\n");

    let mut nested = source.nested_reader()?;
    assert!(nested.entry(0));
    let mut entry = String::new();
    nested.read_to_string(&mut entry)?;
    assert_eq!(entry, "1A\n1B\n1C\n1D\n");

    Ok(())
}

#[test]
fn test_single_record_stream_has_only_data_file() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let paths = StreamPaths::new(dir.path(), "single");
    write_stream(&paths, &[&["just one record\n"]])?;

    assert_eq!(file_names(dir.path()), vec!["single.bgz"]);

    let source = StreamSource::open(paths)?;
    assert_eq!(source.segment_index().segment_count(), 1);
    assert_eq!(source.boundary_index().entry_count(), 1);

    let mut all = String::new();
    source.segment_reader()?.read_to_string(&mut all)?;
    assert_eq!(all, "just one record\n");
    Ok(())
}

#[test]
fn test_single_entry_has_no_boundary_file() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let paths = StreamPaths::new(dir.path(), "doc");
    write_stream(&paths, &[&["a\n", "b\n", "c\n"]])?;

    assert_eq!(file_names(dir.path()), vec!["doc.bgz", "doc.seg.dat"]);

    let source = StreamSource::open(paths)?;
    let mut reader = source.segment_reader()?;
    reader.exclude(1);
    let mut out = String::new();
    reader.read_to_string(&mut out)?;
    assert_eq!(out, "a\nc\n");
    Ok(())
}

#[test]
fn test_dropped_target_is_committed() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let paths = StreamPaths::new(dir.path(), "dropped");
    {
        let mut target = StreamTarget::create(paths.clone())?;
        target.put_next_entry()?;
        target.write_all(b"written before drop")?;
    }

    assert_eq!(file_names(dir.path()), vec!["dropped.bgz"]);
    let mut data = String::new();
    StreamSource::open(paths)?.data_reader()?.read_to_string(&mut data)?;
    assert_eq!(data, "written before drop");
    Ok(())
}

/// A data file that fails once `budget` bytes have been written.
struct FullDisk {
    file: LockingFile,
    budget: usize,
}

impl Write for FullDisk {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.budget {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.budget -= buf.len();
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl CloseWrite for FullDisk {
    fn close(&mut self) -> Result<()> {
        self.file.close()
    }
}

#[test]
fn test_failed_data_write_commits_no_files() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempdir().expect("Failed to create temp dir");
    let paths = StreamPaths::new(dir.path(), "failed");
    {
        let data = FullDisk {
            file: LockingFile::create(paths.data())?,
            budget: 40,
        };
        let config = small_blocks()
            .block_config
            .with_compression(CompressionType::None, 0)?;
        let blocks = BlockWriter::with_config(data, config)?;
        let segments = SegmentWriter::new(blocks, LockingFile::create_lazy(paths.segment_index())?);
        let mut writer = NestedWriter::new(segments, LockingFile::create_lazy(paths.boundary_index())?);

        writer.put_next_entry()?;
        writer.write_all(&[b'a'; 20])?;
        writer.add_segment()?;
        writer.write_all(&[b'b'; 20])?;
        writer.close_entry()?;

        writer.put_next_entry()?;
        assert!(writer.write_all(&[b'c'; 30]).is_err());
        assert!(writer.close().is_err());
        assert!(!writer.is_closed());
    }

    // Neither committed files nor lock files are left behind.
    assert!(file_names(dir.path()).is_empty());

    // The stream can be written again from scratch.
    write_stream(&paths, &[&["again"]])?;
    assert_eq!(file_names(dir.path()), vec!["failed.bgz"]);
    Ok(())
}

#[test]
fn test_concurrent_writers_on_same_stream() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let paths = StreamPaths::new(dir.path(), "busy");

    let mut first = StreamTarget::create(paths.clone())?;
    assert!(matches!(
        StreamTarget::create(paths.clone()),
        Err(StoreError::AlreadyLocked(_))
    ));

    first.put_next_entry()?;
    first.write_all(b"mine")?;
    first.close()?;
    assert!(first.is_closed());
    assert_eq!(file_names(dir.path()), vec!["busy.bgz"]);
    Ok(())
}

#[test]
fn test_missing_stream() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = StreamSource::open(StreamPaths::new(dir.path(), "absent"));
    assert!(matches!(result, Err(StoreError::Io(_))));
}

#[test]
fn test_streams_written_in_parallel() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");

    let handles: Vec<_> = (0..8u64)
        .map(|id| {
            let paths = StreamPaths::for_id(dir.path(), id * 1000 + 7);
            thread::spawn(move || -> Result<StreamPaths> {
                let config = StreamTargetConfig {
                    block_config: BlockWriterConfig::with_block_size(64)?
                        .with_compression(CompressionType::Gzip, 1)?,
                };
                let mut target = StreamTarget::with_config(paths.clone(), config)?;
                for entry in 0..5 {
                    target.put_next_entry()?;
                    for record in 0..10 {
                        if record > 0 {
                            target.add_segment()?;
                        }
                        writeln!(target, "id={} entry={} record={}", id, entry, record)?;
                    }
                    target.close_entry()?;
                }
                target.close()?;
                Ok(paths)
            })
        })
        .collect();

    for (id, handle) in handles.into_iter().enumerate() {
        let paths = handle.join().expect("writer thread panicked")?;
        let source = StreamSource::open(paths)?;
        let mut compound = source.compound_reader()?;

        let mut reader = compound.entry_reader(3)?.expect("entry 3 exists");
        reader.include(7);
        let mut record = String::new();
        reader.read_to_string(&mut record)?;
        assert_eq!(record, format!("id={} entry=3 record=7\n", id));
    }

    Ok(())
}
