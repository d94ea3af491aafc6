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

//! Test fixtures: an in-memory segment builder that writes columns the
//! way a segment writer would (pages, ordinal/zone-map/bloom/bitmap
//! indices, dictionary pages), plus simple predicates and counting
//! blocks.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::basic::{Compression, Encoding, FieldType, Ordinal};
use crate::encodings::binary_dict::BinaryDictEncoder;
use crate::encodings::binary_plain::BinaryPlainEncoder;
use crate::encodings::rle::RleEncoder;
use crate::errors::Result;
use crate::index::bitmap::serialize_ordinal_set;
use crate::index::bloom_filter::{serialize_bloom_filters, BloomFilter, Sbbf};
use crate::index::ordinal::serialize_entries;
use crate::index::zone_map::serialize_zone_maps;
use crate::predicate::{Bounds, ColumnPredicate, DelState};
use crate::segment::meta::{ColumnIndexMeta, ColumnMeta, PagePointer, ZoneMap};
use crate::segment::page_io::{
    build_page, DataPageFooter, MemoryBlock, PageFooter, ReadableBlock,
};
use crate::types::CellValue;

// ---------------------------------------------------------------------
// Cell helpers

pub fn i32_cells(values: &[Option<i32>]) -> Vec<Option<Vec<u8>>> {
    values
        .iter()
        .map(|v| v.map(|v| v.to_le_bytes().to_vec()))
        .collect()
}

pub fn u32_cells(values: &[u32]) -> Vec<Option<Vec<u8>>> {
    values.iter().map(|v| Some(v.to_le_bytes().to_vec())).collect()
}

pub fn u8_cells(values: &[u8]) -> Vec<Option<Vec<u8>>> {
    values.iter().map(|v| Some(vec![*v])).collect()
}

pub fn str_cells(values: &[Option<&str>]) -> Vec<Option<Vec<u8>>> {
    values
        .iter()
        .map(|v| v.map(|s| s.as_bytes().to_vec()))
        .collect()
}

pub fn int_zone_map(min: i32, max: i32) -> ZoneMap {
    ZoneMap {
        min: Bytes::from(min.to_string()),
        max: Bytes::from(max.to_string()),
        has_null: false,
        has_not_null: true,
        pass_all: false,
    }
}

pub fn pass_all_zone_map(min: i32, max: i32) -> ZoneMap {
    ZoneMap {
        pass_all: true,
        ..int_zone_map(min, max)
    }
}

pub fn empty_zone_map() -> ZoneMap {
    ZoneMap {
        min: Bytes::new(),
        max: Bytes::new(),
        has_null: false,
        has_not_null: false,
        pass_all: false,
    }
}

// ---------------------------------------------------------------------
// Segment builder

/// Description of one column to write into a test segment.
pub struct ColumnSpec {
    pub column_id: u32,
    pub field_type: FieldType,
    pub encoding: Encoding,
    pub codec: Compression,
    pub nullable: bool,
    pub rows_per_page: usize,
    /// `None` cells are nulls; `Some` cells carry the encoded value
    /// bytes (little-endian for fixed types, raw for binary).
    pub cells: Vec<Option<Vec<u8>>>,
    /// Explicit per-page zone maps; length must equal the page count.
    pub zone_maps: Option<Vec<ZoneMap>>,
    pub segment_zone_map: Option<ZoneMap>,
    pub with_bloom_filter: bool,
    pub with_bitmap_index: bool,
}

impl ColumnSpec {
    pub fn new(column_id: u32, field_type: FieldType, cells: Vec<Option<Vec<u8>>>) -> Self {
        let encoding = if field_type.is_binary() {
            Encoding::BINARY_PLAIN
        } else {
            Encoding::PLAIN
        };
        Self {
            column_id,
            field_type,
            encoding,
            codec: Compression::LZ4,
            nullable: false,
            rows_per_page: 100,
            cells,
            zone_maps: None,
            segment_zone_map: None,
            with_bloom_filter: false,
            with_bitmap_index: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn rows_per_page(mut self, rows: usize) -> Self {
        self.rows_per_page = rows;
        self
    }

    pub fn dict_encoded(mut self) -> Self {
        self.encoding = Encoding::DICT;
        self
    }

    pub fn zone_maps(mut self, page_zone_maps: Vec<ZoneMap>, segment: ZoneMap) -> Self {
        self.zone_maps = Some(page_zone_maps);
        self.segment_zone_map = Some(segment);
        self
    }

    pub fn bloom_filter(mut self) -> Self {
        self.with_bloom_filter = true;
        self
    }

    pub fn bitmap_index(mut self) -> Self {
        self.with_bitmap_index = true;
        self
    }
}

/// Writes columns into one contiguous in-memory segment.
#[derive(Default)]
pub struct SegmentBuilder {
    buf: Vec<u8>,
}

impl SegmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn append_page(
        &mut self,
        codec: Compression,
        body: &[u8],
        footer: &PageFooter,
    ) -> Result<PagePointer> {
        let page = build_page(codec, body, footer)?;
        let pp = PagePointer::new(self.buf.len() as u64, page.len() as u32);
        self.buf.extend_from_slice(&page);
        Ok(pp)
    }

    /// Writes one column's pages and indices, returning its metadata.
    pub fn add_column(&mut self, spec: ColumnSpec) -> Result<ColumnMeta> {
        let num_rows = spec.cells.len() as u64;

        // dictionary for dict-encoded columns, in first-seen order
        let mut dict_words: Vec<Vec<u8>> = Vec::new();
        let mut dict_codes: BTreeMap<Vec<u8>, u32> = BTreeMap::new();
        if spec.encoding == Encoding::DICT {
            for cell in spec.cells.iter().flatten() {
                if !dict_codes.contains_key(cell) {
                    dict_codes.insert(cell.clone(), dict_words.len() as u32);
                    dict_words.push(cell.clone());
                }
            }
        }

        let mut ordinal_entries: Vec<(Ordinal, PagePointer)> = Vec::new();
        let mut bloom_filters: Vec<BloomFilter> = Vec::new();
        let mut first_ordinal: Ordinal = 0;
        for page_cells in spec.cells.chunks(spec.rows_per_page.max(1)) {
            let non_null: Vec<&Vec<u8>> = page_cells.iter().flatten().collect();

            let mut body = match spec.encoding {
                Encoding::PLAIN => {
                    let mut body = Vec::new();
                    for cell in &non_null {
                        body.extend_from_slice(cell);
                    }
                    body
                }
                Encoding::BINARY_PLAIN => {
                    let mut enc = BinaryPlainEncoder::new();
                    for cell in &non_null {
                        enc.put(cell);
                    }
                    enc.finish()
                }
                Encoding::DICT => {
                    let mut enc = BinaryDictEncoder::new();
                    for cell in &non_null {
                        enc.put(dict_codes[cell.as_slice()]);
                    }
                    enc.finish()
                }
                Encoding::RLE => {
                    return Err(unsupported_err!("RLE data pages in the test builder"));
                }
            };

            let page_has_null = page_cells.iter().any(|c| c.is_none());
            let nullmap_size = if page_has_null {
                let mut enc = RleEncoder::new();
                for cell in page_cells {
                    enc.append(cell.is_none(), 1);
                }
                let bitmap = enc.finish();
                body.extend_from_slice(&bitmap);
                bitmap.len() as u32
            } else {
                0
            };

            let footer = PageFooter::Data(DataPageFooter {
                first_ordinal,
                num_values: page_cells.len() as u32,
                nullmap_size,
            });
            let pp = self.append_page(spec.codec, &body, &footer)?;
            ordinal_entries.push((first_ordinal, pp));
            first_ordinal += page_cells.len() as u64;

            if spec.with_bloom_filter {
                let mut sbbf = Sbbf::with_ndv(non_null.len().max(1));
                for cell in &non_null {
                    sbbf.insert_bytes(cell);
                }
                bloom_filters.push(BloomFilter::new(sbbf, page_has_null));
            }
        }

        let mut indexes = Vec::new();
        let ordinal_page = self.append_page(
            spec.codec,
            &serialize_entries(&ordinal_entries),
            &PageFooter::Index {
                num_entries: ordinal_entries.len() as u32,
            },
        )?;
        indexes.push(ColumnIndexMeta::Ordinal {
            root_page: ordinal_page,
        });

        if let Some(zone_maps) = &spec.zone_maps {
            assert_eq!(
                zone_maps.len(),
                ordinal_entries.len(),
                "one zone map per data page"
            );
            let index_page = self.append_page(
                spec.codec,
                &serialize_zone_maps(zone_maps),
                &PageFooter::Index {
                    num_entries: zone_maps.len() as u32,
                },
            )?;
            indexes.push(ColumnIndexMeta::ZoneMap {
                index_page,
                segment_zone_map: spec
                    .segment_zone_map
                    .clone()
                    .expect("segment zone map set together with page zone maps"),
            });
        }

        if spec.with_bloom_filter {
            let index_page = self.append_page(
                spec.codec,
                &serialize_bloom_filters(&bloom_filters),
                &PageFooter::Index {
                    num_entries: bloom_filters.len() as u32,
                },
            )?;
            indexes.push(ColumnIndexMeta::BloomFilter { index_page });
        }

        if spec.with_bitmap_index {
            let mut by_value: BTreeMap<Vec<u8>, Vec<Ordinal>> = BTreeMap::new();
            let mut null_rows: Vec<Ordinal> = Vec::new();
            for (ordinal, cell) in spec.cells.iter().enumerate() {
                match cell {
                    Some(cell) => by_value
                        .entry(cell.clone())
                        .or_default()
                        .push(ordinal as u64),
                    None => null_rows.push(ordinal as u64),
                }
            }
            let mut dict_enc = BinaryPlainEncoder::new();
            let mut bitmap_enc = BinaryPlainEncoder::new();
            for (value, ordinals) in &by_value {
                dict_enc.put(value);
                bitmap_enc.put(&serialize_ordinal_set(ordinals));
            }
            if !null_rows.is_empty() {
                bitmap_enc.put(&serialize_ordinal_set(&null_rows));
            }
            let dict_count = dict_enc.count() as u32;
            let bitmap_count = bitmap_enc.count() as u32;
            let dict_page = self.append_page(
                spec.codec,
                &dict_enc.finish(),
                &PageFooter::Index {
                    num_entries: dict_count,
                },
            )?;
            let bitmap_page = self.append_page(
                spec.codec,
                &bitmap_enc.finish(),
                &PageFooter::Index {
                    num_entries: bitmap_count,
                },
            )?;
            indexes.push(ColumnIndexMeta::Bitmap {
                dict_page,
                bitmap_page,
            });
        }

        let dict_page = if spec.encoding == Encoding::DICT {
            let mut enc = BinaryPlainEncoder::new();
            for word in &dict_words {
                enc.put(word);
            }
            let num_values = enc.count() as u32;
            Some(self.append_page(
                spec.codec,
                &enc.finish(),
                &PageFooter::Dict { num_values },
            )?)
        } else {
            None
        };

        Ok(ColumnMeta {
            column_id: spec.column_id,
            field_type: spec.field_type,
            length: 0,
            encoding: spec.encoding,
            compression: spec.codec,
            is_nullable: spec.nullable,
            num_rows,
            dict_page,
            indexes,
            children: Vec::new(),
        })
    }

    pub fn finish(self) -> Arc<MemoryBlock> {
        Arc::new(MemoryBlock::new(self.buf.into()))
    }
}

// ---------------------------------------------------------------------
// Counting block

/// Block wrapper that counts reads per offset, for asserting how often a
/// given page was fetched.
pub struct CountingBlock<B> {
    inner: B,
    reads: Mutex<BTreeMap<u64, u64>>,
}

impl<B: ReadableBlock> CountingBlock<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            reads: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn reads_at(&self, offset: u64) -> u64 {
        self.reads.lock().unwrap().get(&offset).copied().unwrap_or(0)
    }
}

impl<B: ReadableBlock> ReadableBlock for CountingBlock<B> {
    fn read_at(&self, offset: u64, len: usize) -> Result<Bytes> {
        *self.reads.lock().unwrap().entry(offset).or_insert(0) += 1;
        self.inner.read_at(offset, len)
    }

    fn len(&self) -> u64 {
        self.inner.len()
    }
}

// ---------------------------------------------------------------------
// Predicates

/// Matches everything.
pub struct TruePredicate;

impl ColumnPredicate for TruePredicate {
    fn eval_bounds(&self, _bounds: &Bounds<'_>) -> bool {
        true
    }
}

/// `column > value`, with null bounds sorting low.
pub struct GreaterThan(pub CellValue);

impl ColumnPredicate for GreaterThan {
    fn eval_bounds(&self, bounds: &Bounds<'_>) -> bool {
        matches!(
            bounds.max.partial_cmp_value(&self.0),
            Some(std::cmp::Ordering::Greater)
        )
    }
}

/// `column == value`; supports bloom filter probing with the encoded
/// cell bytes.
pub struct EqualsCell {
    pub cell: CellValue,
    pub raw: Vec<u8>,
}

impl EqualsCell {
    pub fn int(value: i32) -> Self {
        Self {
            cell: CellValue::Int32(value),
            raw: value.to_le_bytes().to_vec(),
        }
    }
}

impl ColumnPredicate for EqualsCell {
    fn eval_bounds(&self, bounds: &Bounds<'_>) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        let above_min = matches!(
            bounds.min.partial_cmp_value(&self.cell),
            Some(Less) | Some(Equal)
        );
        let below_max = matches!(
            bounds.max.partial_cmp_value(&self.cell),
            Some(Greater) | Some(Equal)
        );
        above_min && below_max
    }

    fn eval_bloom_filter(&self, bf: &crate::index::bloom_filter::BloomFilter) -> bool {
        bf.test_bytes(&self.raw)
    }

    fn can_do_bloom_filter(&self) -> bool {
        true
    }
}

/// Delete predicate wholly covering zones with `max <= value`.
pub struct DeleteUpTo(pub CellValue);

impl ColumnPredicate for DeleteUpTo {
    fn eval_bounds(&self, _bounds: &Bounds<'_>) -> bool {
        true
    }

    fn del_eval(&self, bounds: &Bounds<'_>) -> DelState {
        use std::cmp::Ordering::{Equal, Less};
        match bounds.max.partial_cmp_value(&self.0) {
            Some(Less) | Some(Equal) => DelState::Satisfied,
            _ => DelState::PartialSatisfied,
        }
    }
}
