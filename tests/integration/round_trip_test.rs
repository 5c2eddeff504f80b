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

//! Integration tests for block compressed files on disk.
//!
//! These tests write through a real file and read back byte for byte,
//! sequentially and from random positions.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::NamedTempFile;

use rastore::blocks::{BlockReader, BlockWriter, BlockWriterConfig};
use rastore::compression::CompressionType;
use rastore::error::Result;
use rastore::segment::{SegmentIndex, SegmentReader, SegmentWriter};

/// Helper function to write data to a temp file as blocks.
fn write_blocks(data: &[u8], config: BlockWriterConfig) -> Result<NamedTempFile> {
    let file = NamedTempFile::new().expect("Failed to create temp file");

    let mut writer = BlockWriter::with_config(file.reopen()?, config)?;
    // Uneven write sizes so writes straddle block boundaries.
    for chunk in data.chunks(333) {
        writer.write_all(chunk)?;
    }
    writer.close()?;

    Ok(file)
}

fn random_data(rng: &mut StdRng, len: usize) -> Vec<u8> {
    // Text-like bytes so compression has something to do.
    (0..len).map(|_| b"abc def\n"[rng.gen_range(0..8)]).collect()
}

#[test]
fn test_sizes_around_block_boundaries() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(1);
    let block_size = 64u64;

    for len in [0, 1, 63, 64, 65, 128, 640, 1000] {
        let data = random_data(&mut rng, len);
        let config = BlockWriterConfig::with_block_size(block_size)?;
        let file = write_blocks(&data, config)?;

        let mut reader = BlockReader::open(File::open(file.path())?)?;
        assert_eq!(reader.len(), len as u64);
        assert_eq!(reader.block_count(), (len as u64).div_ceil(block_size));

        let mut read_back = Vec::new();
        reader.read_to_end(&mut read_back)?;
        assert_eq!(read_back, data, "len={}", len);
    }

    Ok(())
}

#[test]
fn test_random_access_with_each_codec() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(2);
    let data = random_data(&mut rng, 50_000);

    for compression_type in [CompressionType::None, CompressionType::Gzip, CompressionType::Zstd] {
        let config = BlockWriterConfig::with_block_size(4096)?
            .with_compression(compression_type, compression_type.default_level())?;
        let file = write_blocks(&data, config)?;
        let mut reader = BlockReader::open(File::open(file.path())?)?;
        assert_eq!(reader.compression_type(), compression_type);

        for _ in 0..100 {
            let start = rng.gen_range(0..data.len());
            let len = rng.gen_range(0..10_000).min(data.len() - start);

            reader.seek(SeekFrom::Start(start as u64))?;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            assert_eq!(buf, &data[start..start + len]);
        }
    }

    Ok(())
}

#[test]
fn test_default_config_round_trip() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(3);
    let data = random_data(&mut rng, 3 * 1024 * 1024 + 17);
    let file = write_blocks(&data, BlockWriterConfig::default())?;

    let mut reader = BlockReader::open(File::open(file.path())?)?;
    assert_eq!(reader.block_count(), 4);

    let mut read_back = Vec::new();
    reader.read_to_end(&mut read_back)?;
    assert!(read_back == data);

    // Compressed output is smaller than the input for text.
    assert!(std::fs::metadata(file.path())?.len() < data.len() as u64);
    Ok(())
}

#[test]
fn test_mark_and_reset_on_file() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(4);
    let data = random_data(&mut rng, 10_000);
    let file = write_blocks(&data, BlockWriterConfig::with_block_size(100)?)?;

    let mut reader = BlockReader::open(File::open(file.path())?)?;
    reader.seek(SeekFrom::Start(250))?;
    reader.mark();

    let mut first = vec![0u8; 1000];
    reader.read_exact(&mut first)?;
    reader.reset()?;
    let mut second = vec![0u8; 1000];
    reader.read_exact(&mut second)?;

    assert_eq!(first, second);
    assert_eq!(first, &data[250..1250]);
    Ok(())
}

#[test]
fn test_segments_on_compressed_file() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(5);
    let records: Vec<Vec<u8>> = (0..200)
        .map(|i| {
            let mut record = format!("record {} ", i).into_bytes();
            let extra = rng.gen_range(0..300);
            record.extend(random_data(&mut rng, extra));
            record.push(b'\n');
            record
        })
        .collect();

    let data_file = NamedTempFile::new().expect("Failed to create temp file");
    let index_file = NamedTempFile::new().expect("Failed to create temp file");

    let config = BlockWriterConfig::with_block_size(512)?;
    let blocks = BlockWriter::with_config(data_file.reopen()?, config)?;
    let mut writer = SegmentWriter::new(blocks, index_file.reopen()?);
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            writer.add_segment()?;
        }
        writer.write_all(record)?;
    }
    writer.close()?;

    let index = Arc::new(SegmentIndex::read_from(File::open(index_file.path())?)?);
    assert_eq!(index.segment_count(), 200);

    for _ in 0..20 {
        let picks: Vec<usize> = {
            let mut picks: Vec<usize> = (0..5).map(|_| rng.gen_range(0..records.len())).collect();
            picks.sort();
            picks.dedup();
            picks
        };

        let data = BlockReader::open(File::open(data_file.path())?)?;
        let mut reader = SegmentReader::new(data, index.clone())?;
        for pick in &picks {
            reader.include(*pick as u64);
        }

        let mut read_back = Vec::new();
        reader.read_to_end(&mut read_back)?;
        let expected: Vec<u8> = picks.iter().flat_map(|p| records[*p].clone()).collect();
        assert_eq!(read_back, expected);
    }

    Ok(())
}
