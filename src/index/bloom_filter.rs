// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The bloom-filter index: one split-block bloom filter per data page.
//!
//! Each filter is a sequence of 256-bit blocks, eight 32-bit words each,
//! probed with xxHash64 (seed 0). A page's filter additionally records
//! whether the page contains nulls, so `IS NULL` predicates can use the
//! index too.
//!
//! Index page body: `num_entries` records of `| len: u32 | filter |`,
//! where a filter is `| has_null: u8 | blocks |`.

use std::hash::Hasher;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use twox_hash::XxHash64;

use crate::basic::{Compression, PageType};
use crate::errors::Result;
use crate::segment::meta::PagePointer;
use crate::segment::page_io::{read_and_decompress_page, PageFooter, PageReadOptions, ReadableBlock};

const SALT: [u32; 8] = [
    0x47b6137b_u32,
    0x44974d91_u32,
    0x8824ad5b_u32,
    0xa2b7289d_u32,
    0x705495c7_u32,
    0x2df1424b_u32,
    0x9efc4947_u32,
    0x5c6bfb31_u32,
];

/// Each block is 256 bits, broken up into eight contiguous 32-bit words.
type Block = [u32; 8];

/// Returns a block in which each word has exactly one bit set, derived
/// from `x`.
fn mask(x: u32) -> Block {
    let mut result = [0_u32; 8];
    for i in 0..8 {
        let y = x.wrapping_mul(SALT[i]);
        result[i] = 1 << (y >> 27);
    }
    result
}

fn block_insert(block: &mut Block, hash: u32) {
    let mask = mask(hash);
    for i in 0..8 {
        block[i] |= mask[i];
    }
}

fn block_check(block: &Block, hash: u32) -> bool {
    let mask = mask(hash);
    for i in 0..8 {
        if block[i] & mask[i] == 0 {
            return false;
        }
    }
    true
}

// per convention the hash seed is 0
const SEED: u64 = 0;

fn hash_bytes<A: AsRef<[u8]>>(value: A) -> u64 {
    let mut hasher = XxHash64::with_seed(SEED);
    hasher.write(value.as_ref());
    hasher.finish()
}

/// A split-block bloom filter.
#[derive(Debug, Clone)]
pub struct Sbbf(Vec<Block>);

impl Sbbf {
    /// A filter sized for roughly `ndv` distinct values; block count is
    /// rounded up to a power of two with at least one block.
    pub fn with_ndv(ndv: usize) -> Self {
        // ~16 bits per value, 256 bits per block
        let blocks = ((ndv * 16 + 255) / 256).next_power_of_two().max(1);
        Self(vec![[0; 8]; blocks])
    }

    fn hash_to_block_index(&self, hash: u64) -> usize {
        (((hash >> 32).saturating_mul(self.0.len() as u64)) >> 32) as usize
    }

    pub fn insert(&mut self, hash: u64) {
        let block_index = self.hash_to_block_index(hash);
        block_insert(&mut self.0[block_index], hash as u32);
    }

    pub fn insert_bytes<A: AsRef<[u8]>>(&mut self, value: A) {
        self.insert(hash_bytes(value))
    }

    pub fn check(&self, hash: u64) -> bool {
        let block_index = self.hash_to_block_index(hash);
        block_check(&self.0[block_index], hash as u32)
    }

    pub fn check_bytes<A: AsRef<[u8]>>(&self, value: A) -> bool {
        self.check(hash_bytes(value))
    }

    fn serialized_len(&self) -> usize {
        self.0.len() * 32
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        for block in &self.0 {
            for word in block {
                out.extend_from_slice(&word.to_le_bytes());
            }
        }
    }

    fn parse(data: &[u8]) -> Result<Self> {
        if data.is_empty() || data.len() % 32 != 0 || !(data.len() / 32).is_power_of_two() {
            return Err(corruption_err!(
                "bloom filter of {} bytes is not a power-of-two block sequence",
                data.len()
            ));
        }
        let blocks = data
            .chunks_exact(32)
            .map(|chunk| {
                let mut block = [0u32; 8];
                for (i, word) in block.iter_mut().enumerate() {
                    *word = LittleEndian::read_u32(&chunk[i * 4..]);
                }
                block
            })
            .collect();
        Ok(Self(blocks))
    }
}

/// One page's bloom filter together with its null marker.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    sbbf: Sbbf,
    has_null: bool,
}

impl BloomFilter {
    pub fn new(sbbf: Sbbf, has_null: bool) -> Self {
        Self { sbbf, has_null }
    }

    pub fn has_null(&self) -> bool {
        self.has_null
    }

    pub fn test_bytes<A: AsRef<[u8]>>(&self, value: A) -> bool {
        self.sbbf.check_bytes(value)
    }

    pub fn test_hash(&self, hash: u64) -> bool {
        self.sbbf.check(hash)
    }

    pub(crate) fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.sbbf.serialized_len());
        out.push(self.has_null as u8);
        self.sbbf.write_to(&mut out);
        out
    }

    fn parse(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(corruption_err!("empty bloom filter record"));
        }
        Ok(Self {
            has_null: data[0] != 0,
            sbbf: Sbbf::parse(&data[1..])?,
        })
    }
}

/// Parsed bloom-filter index of one column. Individual filters are
/// parsed on demand through the iterator.
#[derive(Debug)]
pub struct BloomFilterIndexReader {
    filters: Vec<Bytes>,
}

impl BloomFilterIndexReader {
    pub fn load(
        block: &dyn ReadableBlock,
        index_page: PagePointer,
        codec: Compression,
        verify_checksum: bool,
    ) -> Result<Self> {
        let opts = PageReadOptions {
            block,
            page_pointer: index_page,
            codec,
            verify_checksum,
            use_page_cache: false,
            kept_in_memory: true,
            page_type: PageType::INDEX_PAGE,
            stats: None,
        };
        let (_handle, body, footer) = read_and_decompress_page(&opts)?;
        let num_entries = match footer {
            PageFooter::Index { num_entries } => num_entries as usize,
            _ => unreachable!("page type checked by the page reader"),
        };
        let mut filters = Vec::with_capacity(num_entries);
        let mut pos = 0;
        for _ in 0..num_entries {
            if pos + 4 > body.len() {
                return Err(corruption_err!("bloom filter index truncated at byte {}", pos));
            }
            let len = LittleEndian::read_u32(&body[pos..pos + 4]) as usize;
            pos += 4;
            if pos + len > body.len() {
                return Err(corruption_err!("bloom filter record overflows the index page"));
            }
            filters.push(body.slice(pos..pos + len));
            pos += len;
        }
        Ok(Self { filters })
    }

    pub fn num_pages(&self) -> usize {
        self.filters.len()
    }

    pub fn new_iterator(self: &Arc<Self>) -> BloomFilterIndexIterator {
        BloomFilterIndexIterator {
            reader: Arc::clone(self),
        }
    }
}

/// Reads per-page filters out of a [`BloomFilterIndexReader`].
#[derive(Debug)]
pub struct BloomFilterIndexIterator {
    reader: Arc<BloomFilterIndexReader>,
}

impl BloomFilterIndexIterator {
    pub fn read_bloom_filter(&self, page_index: usize) -> Result<BloomFilter> {
        let record = self.reader.filters.get(page_index).ok_or_else(|| {
            corruption_err!(
                "no bloom filter for page {} of {}",
                page_index,
                self.reader.filters.len()
            )
        })?;
        BloomFilter::parse(record)
    }
}

/// Serializes per-page filters into an index page body; the load
/// counterpart is [`BloomFilterIndexReader::load`].
pub fn serialize_bloom_filters(filters: &[BloomFilter]) -> Vec<u8> {
    let mut out = Vec::new();
    for filter in filters {
        let record = filter.serialize();
        out.extend_from_slice(&(record.len() as u32).to_le_bytes());
        out.extend_from_slice(&record);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::page_io::{build_page, MemoryBlock};

    #[test]
    fn test_sbbf_membership() {
        let mut sbbf = Sbbf::with_ndv(100);
        for i in 0..100 {
            sbbf.insert_bytes(format!("value-{i}"));
        }
        for i in 0..100 {
            assert!(sbbf.check_bytes(format!("value-{i}")));
        }
        let misses = (0..1000)
            .filter(|i| sbbf.check_bytes(format!("absent-{i}")))
            .count();
        assert!(misses < 50, "false positive rate too high: {misses}/1000");
    }

    #[test]
    fn test_filter_index_roundtrip() {
        let mut present = Sbbf::with_ndv(10);
        present.insert_bytes(17i32.to_le_bytes());
        let absent = Sbbf::with_ndv(10);

        let body = serialize_bloom_filters(&[
            BloomFilter::new(absent, false),
            BloomFilter::new(present, true),
        ]);
        let page = build_page(
            Compression::UNCOMPRESSED,
            &body,
            &PageFooter::Index { num_entries: 2 },
        )
        .unwrap();
        let pp = PagePointer::new(0, page.len() as u32);
        let block = MemoryBlock::new(page.into());
        let reader = Arc::new(
            BloomFilterIndexReader::load(&block, pp, Compression::UNCOMPRESSED, true).unwrap(),
        );
        assert_eq!(reader.num_pages(), 2);

        let iter = reader.new_iterator();
        let bf0 = iter.read_bloom_filter(0).unwrap();
        assert!(!bf0.test_bytes(17i32.to_le_bytes()));
        assert!(!bf0.has_null());
        let bf1 = iter.read_bloom_filter(1).unwrap();
        assert!(bf1.test_bytes(17i32.to_le_bytes()));
        assert!(bf1.has_null());
        assert!(iter.read_bloom_filter(2).is_err());
    }

    #[test]
    fn test_bad_filter_length_rejected() {
        assert!(Sbbf::parse(&[0u8; 33]).is_err());
        assert!(Sbbf::parse(&[0u8; 96]).is_err()); // 3 blocks, not a power of two
        assert!(Sbbf::parse(&[]).is_err());
    }
}
