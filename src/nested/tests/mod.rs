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


#[doc(hidden)]
pub(crate) mod helpers {
    use std::io::{Cursor, Write};
    use std::sync::Arc;

    use crate::blocks::{BlockReader, BlockWriter, BlockWriterConfig};
    use crate::nested::{BoundaryIndex, CompoundReader, NestedReader, NestedWriter};
    use crate::segment::{SegmentIndex, SegmentWriter};

    /// The three files of a nested stream, in memory.
    pub struct Files {
        pub data: Vec<u8>,
        pub segments: Vec<u8>,
        pub boundaries: Vec<u8>,
    }

    /// Writes each entry as a list of records over a block compressed stream.
    pub fn write_nested(entries: &[Vec<String>]) -> Files {
        let config = BlockWriterConfig::with_block_size(16).unwrap();
        let blocks = BlockWriter::with_config(Cursor::new(Vec::new()), config).unwrap();
        let mut writer = NestedWriter::new(SegmentWriter::new(blocks, Vec::new()), Vec::new());

        for records in entries {
            writer.put_next_entry().unwrap();
            for (i, record) in records.iter().enumerate() {
                if i > 0 {
                    writer.add_segment().unwrap();
                }
                writer.write_all(record.as_bytes()).unwrap();
            }
            writer.close_entry().unwrap();
        }
        writer.close().unwrap();

        let (segments, boundaries) = writer.into_inner();
        let (blocks, segments) = segments.into_inner();
        Files {
            data: blocks.into_inner().into_inner(),
            segments,
            boundaries,
        }
    }

    /// Entry `b` of `bdy_count`, each holding `seg_count` records.
    pub fn numbered(bdy_count: usize, seg_count: usize) -> Vec<Vec<String>> {
        (1..=bdy_count)
            .map(|b| (1..=seg_count).map(|s| format!("B={},S={}\n", b, s)).collect())
            .collect()
    }

    pub fn indexes(files: &Files) -> (Arc<SegmentIndex>, Arc<BoundaryIndex>) {
        let segments = match files.segments.is_empty() {
            true => SegmentIndex::load::<&[u8]>(None).unwrap(),
            false => SegmentIndex::load(Some(&files.segments[..])).unwrap(),
        };
        let boundaries = match files.boundaries.is_empty() {
            true => BoundaryIndex::load::<&[u8]>(None, segments.segment_count()).unwrap(),
            false => BoundaryIndex::load(Some(&files.boundaries[..]), segments.segment_count()).unwrap(),
        };
        (Arc::new(segments), Arc::new(boundaries))
    }

    pub fn compound(files: &Files) -> CompoundReader<BlockReader<Cursor<Vec<u8>>>> {
        let (segments, boundaries) = indexes(files);
        let data = BlockReader::open(Cursor::new(files.data.clone())).unwrap();
        CompoundReader::new(data, segments, boundaries).unwrap()
    }

    pub fn nested(files: &Files) -> NestedReader<BlockReader<Cursor<Vec<u8>>>> {
        let (segments, boundaries) = indexes(files);
        let data = BlockReader::open(Cursor::new(files.data.clone())).unwrap();
        NestedReader::new(data, segments, boundaries).unwrap()
    }

    pub fn entries(list: &[&[&str]]) -> Vec<Vec<String>> {
        list.iter()
            .map(|records| records.iter().map(|r| r.to_string()).collect())
            .collect()
    }
}
