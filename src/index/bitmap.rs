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

//! The bitmap index: a per-value inverted index.
//!
//! Two index pages: a dictionary page holding the sorted distinct values
//! (binary-plain encoded) and a bitmap page holding one ordinal set per
//! dictionary entry, plus a trailing set for null rows when the column
//! has nulls. An ordinal set is serialized as
//! `| count: u32 | ordinal: u64 x count |`.

use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::basic::{Compression, Ordinal, PageType};
use crate::encodings::binary_plain::BinaryPlainDecoder;
use crate::encodings::PageDecoder;
use crate::errors::Result;
use crate::row_ranges::{RowRange, RowRanges};
use crate::segment::meta::PagePointer;
use crate::segment::page_io::{read_and_decompress_page, PageFooter, PageReadOptions, ReadableBlock};

/// Parsed bitmap index of one column.
#[derive(Debug)]
pub struct BitmapIndexReader {
    dict: Vec<Bytes>,
    bitmaps: Vec<Bytes>,
    has_null_bitmap: bool,
}

impl BitmapIndexReader {
    pub fn load(
        block: &dyn ReadableBlock,
        dict_page: PagePointer,
        bitmap_page: PagePointer,
        codec: Compression,
        verify_checksum: bool,
    ) -> Result<Self> {
        let read = |pp: PagePointer| -> Result<(Bytes, usize)> {
            let opts = PageReadOptions {
                block,
                page_pointer: pp,
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
            Ok((body, num_entries))
        };

        let (dict_body, dict_entries) = read(dict_page)?;
        let dict_decoder = BinaryPlainDecoder::new(dict_body)?;
        if dict_decoder.count() != dict_entries {
            return Err(corruption_err!(
                "bitmap dictionary holds {} values, footer says {}",
                dict_decoder.count(),
                dict_entries
            ));
        }
        let dict = dict_decoder.dict_word_info();

        let (bitmap_body, bitmap_entries) = read(bitmap_page)?;
        let bitmap_decoder = BinaryPlainDecoder::new(bitmap_body)?;
        if bitmap_decoder.count() != bitmap_entries {
            return Err(corruption_err!(
                "bitmap index holds {} sets, footer says {}",
                bitmap_decoder.count(),
                bitmap_entries
            ));
        }
        let bitmaps = bitmap_decoder.dict_word_info();

        let has_null_bitmap = match bitmaps.len().checked_sub(dict.len()) {
            Some(0) => false,
            Some(1) => true,
            _ => {
                return Err(corruption_err!(
                    "bitmap index: {} sets for {} dictionary values",
                    bitmaps.len(),
                    dict.len()
                ));
            }
        };
        Ok(Self {
            dict,
            bitmaps,
            has_null_bitmap,
        })
    }

    /// Number of distinct non-null values.
    pub fn bitmap_nums(&self) -> usize {
        self.dict.len()
    }

    pub fn has_null_bitmap(&self) -> bool {
        self.has_null_bitmap
    }

    pub fn new_iterator(self: &Arc<Self>) -> BitmapIndexIterator {
        BitmapIndexIterator {
            reader: Arc::clone(self),
        }
    }
}

/// Point lookups into a [`BitmapIndexReader`].
#[derive(Debug)]
pub struct BitmapIndexIterator {
    reader: Arc<BitmapIndexReader>,
}

impl BitmapIndexIterator {
    /// Rank of `value` in the dictionary, or `None` when absent.
    pub fn seek_dictionary(&self, value: &[u8]) -> Option<usize> {
        self.reader
            .dict
            .binary_search_by(|probe| probe.as_ref().cmp(value))
            .ok()
    }

    /// Ordinal set of the dictionary entry at `rank`.
    pub fn read_bitmap(&self, rank: usize) -> Result<RowRanges> {
        let record = self.reader.bitmaps.get(rank).ok_or_else(|| {
            corruption_err!("no bitmap at rank {} of {}", rank, self.reader.bitmaps.len())
        })?;
        parse_ordinal_set(record)
    }

    /// Ordinal set of the null rows; empty when the column has none.
    pub fn read_null_bitmap(&self) -> Result<RowRanges> {
        if !self.reader.has_null_bitmap {
            return Ok(RowRanges::new_empty());
        }
        self.read_bitmap(self.reader.dict.len())
    }
}

fn parse_ordinal_set(record: &Bytes) -> Result<RowRanges> {
    if record.len() < 4 {
        return Err(corruption_err!("ordinal set record truncated"));
    }
    let count = LittleEndian::read_u32(&record[..4]) as usize;
    if record.len() != 4 + count * 8 {
        return Err(corruption_err!(
            "ordinal set of {} bytes does not hold {} ordinals",
            record.len(),
            count
        ));
    }
    let mut ranges = RowRanges::new_empty();
    for i in 0..count {
        let ordinal = LittleEndian::read_u64(&record[4 + i * 8..]);
        ranges.add(RowRange::new(ordinal, ordinal + 1));
    }
    Ok(ranges)
}

/// Serializes one ordinal set; the load counterpart is
/// [`BitmapIndexIterator::read_bitmap`].
pub fn serialize_ordinal_set(ordinals: &[Ordinal]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + ordinals.len() * 8);
    out.extend_from_slice(&(ordinals.len() as u32).to_le_bytes());
    for ordinal in ordinals {
        out.extend_from_slice(&ordinal.to_le_bytes());
    }
    out
}
