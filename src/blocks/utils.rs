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

//! Common helpers for block arithmetic.

use crate::error::{Result, StoreError};

/// Largest accepted block size. A block is held in memory while it is
/// compressed or decompressed.
pub const MAX_BLOCK_SIZE: u64 = 1 << 30;

/// Validates a configured block size.
pub fn validate_block_size(block_size: u64) -> Result<()> {
    if block_size == 0 || block_size > MAX_BLOCK_SIZE {
        return Err(StoreError::InvalidConfig(format!(
            "Block size ({}) must be between 1 and {} bytes",
            block_size, MAX_BLOCK_SIZE
        )));
    }
    Ok(())
}

/// Index of the block holding the uncompressed byte at `pos`.
pub fn block_index(pos: u64, block_size: u64) -> u64 {
    pos / block_size
}

/// Number of blocks needed to hold `total_len` uncompressed bytes.
pub fn block_count_for(total_len: u64, block_size: u64) -> u64 {
    total_len.div_ceil(block_size)
}

/// Uncompressed length of block `index` in a stream of `total_len` bytes.
///
/// Every block but the last is exactly `block_size` long.
pub fn uncompressed_block_len(index: u64, total_len: u64, block_size: u64) -> u64 {
    let start = index * block_size;
    if start >= total_len {
        return 0;
    }
    std::cmp::min(block_size, total_len - start)
}
