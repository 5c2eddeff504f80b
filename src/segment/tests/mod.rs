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
    use std::io::{Cursor, Read, Write};
    use std::sync::Arc;

    use crate::io::PositionTracker;
    use crate::segment::{SegmentIndex, SegmentReader, SegmentWriter};

    /// Writes `parts` as consecutive segments, returning the data and index bytes.
    pub fn write_segments(parts: &[&str]) -> (Vec<u8>, Vec<u8>) {
        let mut writer = SegmentWriter::new(PositionTracker::new(Vec::new()), Vec::new());
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                writer.add_segment().unwrap();
            }
            writer.write_all(part.as_bytes()).unwrap();
        }
        writer.close().unwrap();

        let (data, index) = writer.into_inner();
        (data.into_inner(), index)
    }

    pub fn load_index(index: &[u8]) -> Arc<SegmentIndex> {
        Arc::new(SegmentIndex::read_from(index).unwrap())
    }

    pub fn reader(parts: &[&str]) -> SegmentReader<Cursor<Vec<u8>>> {
        let (data, index) = write_segments(parts);
        SegmentReader::new(Cursor::new(data), load_index(&index)).unwrap()
    }

    pub fn read_string<R: Read>(mut reader: R) -> String {
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        out
    }
}
