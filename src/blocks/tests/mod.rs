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


// Helper re-exports for tests
#[doc(hidden)]
pub(crate) mod helpers {
    use std::io::{Cursor, Write};

    use crate::blocks::reader::BlockReader;
    use crate::blocks::writer::{BlockWriter, BlockWriterConfig};
    use crate::compression::CompressionType;

    /// Deterministic, mildly compressible test data.
    pub fn test_data(len: usize) -> Vec<u8> {
        (0..len).map(|i| b"abcdefghij\n"[i % 11] ^ ((i / 97) as u8)).collect()
    }

    pub fn config(block_size: u64, compression_type: CompressionType) -> BlockWriterConfig {
        BlockWriterConfig::with_block_size(block_size)
            .unwrap()
            .with_compression(compression_type, compression_type.default_level())
            .unwrap()
    }

    /// Writes `data` through a block writer and returns the file bytes.
    pub fn write_blocks(data: &[u8], config: BlockWriterConfig) -> Vec<u8> {
        let mut writer = BlockWriter::with_config(Cursor::new(Vec::new()), config).unwrap();
        writer.write_all(data).unwrap();
        writer.close().unwrap();
        writer.into_inner().into_inner()
    }

    pub fn open(file: Vec<u8>) -> BlockReader<Cursor<Vec<u8>>> {
        BlockReader::open(Cursor::new(file)).unwrap()
    }
}
