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

//! The ordinal index: maps row ordinals to data pages.
//!
//! One entry per data page: the page's first ordinal and its location.
//! The last ordinal of page `i` is derived from the next entry, or from
//! the column row count for the final page.
//!
//! Index page body: `num_entries` records of
//! `| first ordinal: u64 | page offset: u64 | page size: u32 |`.

use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};

use crate::basic::{Compression, Ordinal, PageType};
use crate::errors::Result;
use crate::segment::meta::PagePointer;
use crate::segment::page_io::{read_and_decompress_page, PageFooter, PageReadOptions, ReadableBlock};

const ENTRY_SIZE: usize = 20;

/// Parsed ordinal index of one column.
#[derive(Debug)]
pub struct OrdinalIndexReader {
    entries: Vec<(Ordinal, PagePointer)>,
    num_rows: u64,
}

impl OrdinalIndexReader {
    /// Reads and parses the index page at `root_page`.
    pub fn load(
        block: &dyn ReadableBlock,
        root_page: PagePointer,
        num_rows: u64,
        codec: Compression,
        verify_checksum: bool,
    ) -> Result<Self> {
        let opts = PageReadOptions {
            block,
            page_pointer: root_page,
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
        if body.len() != num_entries * ENTRY_SIZE {
            return Err(corruption_err!(
                "ordinal index body of {} bytes does not hold {} entries",
                body.len(),
                num_entries
            ));
        }
        let mut entries = Vec::with_capacity(num_entries);
        let mut prev: Option<Ordinal> = None;
        for i in 0..num_entries {
            let rec = &body[i * ENTRY_SIZE..(i + 1) * ENTRY_SIZE];
            let first_ordinal = LittleEndian::read_u64(&rec[0..8]);
            let offset = LittleEndian::read_u64(&rec[8..16]);
            let size = LittleEndian::read_u32(&rec[16..20]);
            if prev.is_some_and(|p| first_ordinal <= p) {
                return Err(corruption_err!(
                    "ordinal index entries out of order at page {}",
                    i
                ));
            }
            prev = Some(first_ordinal);
            entries.push((first_ordinal, PagePointer::new(offset, size)));
        }
        Ok(Self { entries, num_rows })
    }

    pub fn num_data_pages(&self) -> usize {
        self.entries.len()
    }

    pub fn get_first_ordinal(&self, page_index: usize) -> Ordinal {
        self.entries[page_index].0
    }

    pub fn get_last_ordinal(&self, page_index: usize) -> Ordinal {
        if page_index + 1 < self.entries.len() {
            self.entries[page_index + 1].0 - 1
        } else {
            self.num_rows - 1
        }
    }

    /// Cursor at the first data page; invalid when the index is empty.
    pub fn begin(self: &Arc<Self>) -> OrdinalPageIndexIterator {
        OrdinalPageIndexIterator {
            index: Arc::clone(self),
            cur: 0,
        }
    }

    /// Cursor at the page containing `ordinal`, or the last page that
    /// starts before it; invalid when every page starts after `ordinal`.
    pub fn seek_at_or_before(self: &Arc<Self>, ordinal: Ordinal) -> OrdinalPageIndexIterator {
        let idx = self.entries.partition_point(|(first, _)| *first <= ordinal);
        OrdinalPageIndexIterator {
            index: Arc::clone(self),
            // idx == 0 means ordinal precedes the first page; park the
            // cursor past the end to mark it invalid
            cur: if idx == 0 { self.entries.len() } else { idx - 1 },
        }
    }
}

/// Forward cursor over the pages of an [`OrdinalIndexReader`].
#[derive(Debug, Clone)]
pub struct OrdinalPageIndexIterator {
    index: Arc<OrdinalIndexReader>,
    cur: usize,
}

impl OrdinalPageIndexIterator {
    pub fn valid(&self) -> bool {
        self.cur < self.index.entries.len()
    }

    pub fn next(&mut self) {
        if self.cur < self.index.entries.len() {
            self.cur += 1;
        }
    }

    pub fn page(&self) -> PagePointer {
        self.index.entries[self.cur].1
    }

    pub fn page_index(&self) -> usize {
        self.cur
    }

    pub fn first_ordinal(&self) -> Ordinal {
        self.index.get_first_ordinal(self.cur)
    }

    pub fn last_ordinal(&self) -> Ordinal {
        self.index.get_last_ordinal(self.cur)
    }
}

/// Serializes ordinal index entries into an index page body; the load
/// counterpart is [`OrdinalIndexReader::load`].
pub fn serialize_entries(entries: &[(Ordinal, PagePointer)]) -> Vec<u8> {
    let mut out = Vec::with_capacity(entries.len() * ENTRY_SIZE);
    for (first_ordinal, pp) in entries {
        out.extend_from_slice(&first_ordinal.to_le_bytes());
        out.extend_from_slice(&pp.offset.to_le_bytes());
        out.extend_from_slice(&pp.size.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::page_io::{build_page, MemoryBlock};

    fn build_index(entries: &[(Ordinal, PagePointer)], num_rows: u64) -> Arc<OrdinalIndexReader> {
        let body = serialize_entries(entries);
        let page = build_page(
            Compression::UNCOMPRESSED,
            &body,
            &PageFooter::Index {
                num_entries: entries.len() as u32,
            },
        )
        .unwrap();
        let pp = PagePointer::new(0, page.len() as u32);
        let block = MemoryBlock::new(page.into());
        Arc::new(
            OrdinalIndexReader::load(&block, pp, num_rows, Compression::UNCOMPRESSED, true)
                .unwrap(),
        )
    }

    fn three_pages() -> Arc<OrdinalIndexReader> {
        build_index(
            &[
                (0, PagePointer::new(0, 10)),
                (100, PagePointer::new(10, 10)),
                (250, PagePointer::new(20, 10)),
            ],
            300,
        )
    }

    #[test]
    fn test_bounds() {
        let index = three_pages();
        assert_eq!(index.num_data_pages(), 3);
        assert_eq!(index.get_first_ordinal(0), 0);
        assert_eq!(index.get_last_ordinal(0), 99);
        assert_eq!(index.get_first_ordinal(1), 100);
        assert_eq!(index.get_last_ordinal(1), 249);
        assert_eq!(index.get_last_ordinal(2), 299);
    }

    #[test]
    fn test_begin_and_walk() {
        let index = three_pages();
        let mut iter = index.begin();
        let mut seen = Vec::new();
        while iter.valid() {
            seen.push((iter.page_index(), iter.first_ordinal(), iter.last_ordinal()));
            iter.next();
        }
        assert_eq!(seen, vec![(0, 0, 99), (1, 100, 249), (2, 250, 299)]);
    }

    #[test]
    fn test_seek_at_or_before() {
        let index = three_pages();
        assert_eq!(index.seek_at_or_before(0).page_index(), 0);
        assert_eq!(index.seek_at_or_before(99).page_index(), 0);
        assert_eq!(index.seek_at_or_before(100).page_index(), 1);
        assert_eq!(index.seek_at_or_before(249).page_index(), 1);
        assert_eq!(index.seek_at_or_before(1000).page_index(), 2);
    }

    #[test]
    fn test_seek_before_first_page_is_invalid() {
        let index = build_index(&[(10, PagePointer::new(0, 10))], 20);
        assert!(!index.seek_at_or_before(5).valid());
        assert!(index.seek_at_or_before(10).valid());
    }

    #[test]
    fn test_empty_index_begin_invalid() {
        let index = build_index(&[], 0);
        assert!(!index.begin().valid());
    }

    #[test]
    fn test_out_of_order_entries_rejected() {
        let body = serialize_entries(&[
            (50, PagePointer::new(0, 10)),
            (10, PagePointer::new(10, 10)),
        ]);
        let page = build_page(
            Compression::UNCOMPRESSED,
            &body,
            &PageFooter::Index { num_entries: 2 },
        )
        .unwrap();
        let pp = PagePointer::new(0, page.len() as u32);
        let block = MemoryBlock::new(page.into());
        let err = OrdinalIndexReader::load(&block, pp, 100, Compression::UNCOMPRESSED, true)
            .unwrap_err();
        assert!(err.to_string().contains("out of order"), "{err}");
    }
}
