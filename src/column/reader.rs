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

//! The per-column reader handle.
//!
//! A [`ColumnReader`] owns a column's metadata and lazily-loaded
//! indices, answers predicate pushdown with [`RowRanges`], reads pages
//! on behalf of its iterators, and is the factory for them. Once built
//! it is shared-readable: pushdown, zone-map matching and iterator
//! construction may run concurrently; the only mutation is the
//! load-once index initialisation behind [`OnceCell`]s.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::basic::{Compression, Encoding, FieldType, Ordinal, PageType};
use crate::column::iterator::{
    ArrayColumnIterator, ColumnIterator, EmptyColumnIterator, ScalarColumnIterator,
};
use crate::column::{ColumnIteratorOptions, ColumnReaderOptions};
use crate::encodings::EncodingInfo;
use crate::errors::Result;
use crate::index::bitmap::{BitmapIndexIterator, BitmapIndexReader};
use crate::index::bloom_filter::BloomFilterIndexReader;
use crate::index::ordinal::{OrdinalIndexReader, OrdinalPageIndexIterator};
use crate::index::zone_map::ZoneMapIndexReader;
use crate::predicate::{Bounds, ColumnPredicate, DelState};
use crate::row_ranges::{RowRange, RowRanges};
use crate::segment::meta::{ColumnIndexMeta, ColumnMeta, PagePointer, ZoneMap};
use crate::segment::page_io::{
    read_and_decompress_page, PageFooter, PageHandle, PageReadOptions,
};
use crate::types::{get_type_info, CellValue, TypeInfo};

pub struct ColumnReader {
    opts: ColumnReaderOptions,
    meta: ColumnMeta,
    num_rows: u64,
    path: String,

    // resolved by init(); absent on array parents, which have no data
    // stream of their own
    type_info: Option<&'static TypeInfo>,
    encoding_info: Option<&'static EncodingInfo>,
    codec: Compression,

    ordinal_index_meta: Option<PagePointer>,
    zone_map_index_meta: Option<(PagePointer, ZoneMap)>,
    bitmap_index_meta: Option<(PagePointer, PagePointer)>,
    bf_index_meta: Option<PagePointer>,

    ordinal_index: OnceCell<Arc<OrdinalIndexReader>>,
    zone_map_index: OnceCell<ZoneMapIndexReader>,
    bitmap_index: OnceCell<Arc<BitmapIndexReader>>,
    bloom_filter_index: OnceCell<Arc<BloomFilterIndexReader>>,

    sub_readers: Vec<Arc<ColumnReader>>,
}

impl std::fmt::Debug for ColumnReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnReader")
            .field("path", &self.path)
            .field("num_rows", &self.num_rows)
            .finish_non_exhaustive()
    }
}

impl ColumnReader {
    /// Builds a reader for a column. Scalar readers are initialised
    /// immediately; array readers recursively build their child readers
    /// (item, offsets and, when nullable, null markers) and take their
    /// row count from the offsets child.
    pub fn create(
        opts: ColumnReaderOptions,
        meta: ColumnMeta,
        num_rows: u64,
        path: &str,
    ) -> Result<Arc<ColumnReader>> {
        if meta.field_type.is_scalar() {
            let mut reader = ColumnReader::new(opts, meta, num_rows, path);
            reader.init()?;
            return Ok(Arc::new(reader));
        }
        match meta.field_type {
            FieldType::ARRAY => {
                let expected_children = if meta.is_nullable { 3 } else { 2 };
                if meta.children.len() != expected_children {
                    return Err(corruption_err!(
                        "Bad file {}: array column {} has {} children, expected {}",
                        path,
                        meta.column_id,
                        meta.children.len(),
                        expected_children
                    ));
                }
                let mut sub_readers = Vec::with_capacity(meta.children.len());
                for child in &meta.children {
                    sub_readers.push(ColumnReader::create(
                        opts.clone(),
                        child.clone(),
                        child.num_rows,
                        path,
                    )?);
                }
                // the array's row count is the offsets child's row count
                let num_rows = meta.children[1].num_rows;
                let mut reader = ColumnReader::new(opts, meta, num_rows, path);
                reader.sub_readers = sub_readers;
                // array parents have no stream or indices; init is skipped
                Ok(Arc::new(reader))
            }
            t => Err(unsupported_err!("unsupported type for column reader: {}", t)),
        }
    }

    fn new(opts: ColumnReaderOptions, meta: ColumnMeta, num_rows: u64, path: &str) -> Self {
        let codec = meta.compression;
        Self {
            opts,
            meta,
            num_rows,
            path: path.to_string(),
            type_info: None,
            encoding_info: None,
            codec,
            ordinal_index_meta: None,
            zone_map_index_meta: None,
            bitmap_index_meta: None,
            bf_index_meta: None,
            ordinal_index: OnceCell::new(),
            zone_map_index: OnceCell::new(),
            bitmap_index: OnceCell::new(),
            bloom_filter_index: OnceCell::new(),
            sub_readers: Vec::new(),
        }
    }

    fn init(&mut self) -> Result<()> {
        let type_info = get_type_info(self.meta.field_type)?;
        self.type_info = Some(type_info);
        self.encoding_info = Some(EncodingInfo::get(type_info, self.meta.encoding)?);

        for index_meta in &self.meta.indexes {
            match index_meta {
                ColumnIndexMeta::Ordinal { root_page } => {
                    if self.ordinal_index_meta.replace(*root_page).is_some() {
                        return Err(self.duplicate_index_err("ordinal"));
                    }
                }
                ColumnIndexMeta::ZoneMap {
                    index_page,
                    segment_zone_map,
                } => {
                    if self
                        .zone_map_index_meta
                        .replace((*index_page, segment_zone_map.clone()))
                        .is_some()
                    {
                        return Err(self.duplicate_index_err("zone map"));
                    }
                }
                ColumnIndexMeta::Bitmap {
                    dict_page,
                    bitmap_page,
                } => {
                    if self
                        .bitmap_index_meta
                        .replace((*dict_page, *bitmap_page))
                        .is_some()
                    {
                        return Err(self.duplicate_index_err("bitmap"));
                    }
                }
                ColumnIndexMeta::BloomFilter { index_page } => {
                    if self.bf_index_meta.replace(*index_page).is_some() {
                        return Err(self.duplicate_index_err("bloom filter"));
                    }
                }
            }
        }
        // An empty item column of a flushed empty array legitimately has
        // no ordinal index; everything else must carry one.
        if self.ordinal_index_meta.is_none() && !self.is_empty() {
            return Err(corruption_err!(
                "Bad file {}: missing ordinal index for column {}",
                self.path,
                self.meta.column_id
            ));
        }
        Ok(())
    }

    fn duplicate_index_err(&self, kind: &str) -> crate::errors::SegmentError {
        corruption_err!(
            "Bad file {}: duplicate {} index for column {}",
            self.path,
            kind,
            self.meta.column_id
        )
    }

    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn is_nullable(&self) -> bool {
        self.meta.is_nullable
    }

    pub fn field_type(&self) -> FieldType {
        self.meta.field_type
    }

    pub fn has_zone_map(&self) -> bool {
        self.zone_map_index_meta.is_some()
    }

    pub fn has_bitmap_index(&self) -> bool {
        self.bitmap_index_meta.is_some()
    }

    pub fn has_bloom_filter_index(&self) -> bool {
        self.bf_index_meta.is_some()
    }

    pub(crate) fn dict_page_pointer(&self) -> Option<PagePointer> {
        self.meta.dict_page
    }

    pub(crate) fn type_info(&self) -> Result<&'static TypeInfo> {
        self.type_info
            .ok_or_else(|| internal_err!("column reader for {} was not initialised", self.meta.column_id))
    }

    pub(crate) fn encoding_info(&self) -> Result<&'static EncodingInfo> {
        self.encoding_info
            .ok_or_else(|| internal_err!("column reader for {} was not initialised", self.meta.column_id))
    }

    pub(crate) fn encoding(&self) -> Encoding {
        self.meta.encoding
    }

    /// Reads one page on behalf of an iterator: reader-level config
    /// (codec, checksum and memory hints) combined with the caller's
    /// block handle, stats sink and page type.
    pub fn read_page(
        &self,
        iter_opts: &ColumnIteratorOptions,
        page_pointer: PagePointer,
        page_type: PageType,
    ) -> Result<(PageHandle, bytes::Bytes, PageFooter)> {
        let opts = PageReadOptions {
            block: iter_opts.block.as_ref(),
            page_pointer,
            codec: self.codec,
            verify_checksum: self.opts.verify_checksum,
            use_page_cache: iter_opts.use_page_cache,
            kept_in_memory: self.opts.kept_in_memory,
            page_type,
            stats: Some(&iter_opts.stats),
        };
        read_and_decompress_page(&opts)
    }

    // ------------------------------------------------------------------
    // Lazy index loading

    fn ensure_index_loaded(&self) -> Result<()> {
        self.load_ordinal_index()?;
        self.load_zone_map_index()?;
        self.load_bitmap_index()?;
        self.load_bloom_filter_index()?;
        Ok(())
    }

    fn load_ordinal_index(&self) -> Result<()> {
        if let Some(root_page) = self.ordinal_index_meta {
            self.ordinal_index.get_or_try_init(|| {
                debug!(column_id = self.meta.column_id, "loading ordinal index");
                OrdinalIndexReader::load(
                    self.opts.block.as_ref(),
                    root_page,
                    self.num_rows,
                    self.codec,
                    self.opts.verify_checksum,
                )
                .map(Arc::new)
            })?;
        }
        Ok(())
    }

    fn load_zone_map_index(&self) -> Result<()> {
        if let Some((index_page, _)) = &self.zone_map_index_meta {
            self.zone_map_index.get_or_try_init(|| {
                debug!(column_id = self.meta.column_id, "loading zone map index");
                ZoneMapIndexReader::load(
                    self.opts.block.as_ref(),
                    *index_page,
                    self.codec,
                    self.opts.verify_checksum,
                )
            })?;
        }
        Ok(())
    }

    fn load_bitmap_index(&self) -> Result<()> {
        if let Some((dict_page, bitmap_page)) = self.bitmap_index_meta {
            self.bitmap_index.get_or_try_init(|| {
                debug!(column_id = self.meta.column_id, "loading bitmap index");
                BitmapIndexReader::load(
                    self.opts.block.as_ref(),
                    dict_page,
                    bitmap_page,
                    self.codec,
                    self.opts.verify_checksum,
                )
                .map(Arc::new)
            })?;
        }
        Ok(())
    }

    fn load_bloom_filter_index(&self) -> Result<()> {
        if let Some(index_page) = self.bf_index_meta {
            self.bloom_filter_index.get_or_try_init(|| {
                debug!(column_id = self.meta.column_id, "loading bloom filter index");
                BloomFilterIndexReader::load(
                    self.opts.block.as_ref(),
                    index_page,
                    self.codec,
                    self.opts.verify_checksum,
                )
                .map(Arc::new)
            })?;
        }
        Ok(())
    }

    fn ordinal_index(&self) -> Result<&Arc<OrdinalIndexReader>> {
        self.ordinal_index
            .get()
            .ok_or_else(|| internal_err!("ordinal index of column {} is not loaded", self.meta.column_id))
    }

    // ------------------------------------------------------------------
    // Predicate pushdown

    /// Segment-level zone-map check. `true` means the segment may hold
    /// matching rows.
    pub fn match_condition(&self, cond: Option<&dyn ColumnPredicate>) -> Result<bool> {
        let (_, segment_zone_map) = match (&self.zone_map_index_meta, cond) {
            (Some(meta), Some(_)) => meta,
            _ => return Ok(true),
        };
        let (min, max) = self.parse_zone_map(segment_zone_map)?;
        Ok(self.zone_map_match_condition(segment_zone_map, &min, &max, cond))
    }

    /// Decodes a zone map's bounds. Nulls sort low: a zone with nulls
    /// gets a null min, and a zone with only nulls a null max as well.
    fn parse_zone_map(&self, zone_map: &ZoneMap) -> Result<(CellValue, CellValue)> {
        let mut min = CellValue::Null;
        let mut max = CellValue::Null;
        if zone_map.has_not_null {
            let type_info = self.type_info()?;
            let parse = |raw: &[u8]| -> Result<CellValue> {
                let s = std::str::from_utf8(raw)
                    .map_err(|_| corruption_err!("zone map bound is not valid utf-8"))?;
                type_info.from_string(s)
            };
            min = parse(&zone_map.min)?;
            max = parse(&zone_map.max)?;
        }
        if zone_map.has_null {
            min = CellValue::Null;
            if !zone_map.has_not_null {
                max = CellValue::Null;
            }
        }
        Ok((min, max))
    }

    fn zone_map_match_condition(
        &self,
        zone_map: &ZoneMap,
        min: &CellValue,
        max: &CellValue,
        cond: Option<&dyn ColumnPredicate>,
    ) -> bool {
        if !zone_map.has_not_null && !zone_map.has_null {
            return false; // no rows in this zone
        }
        let cond = match cond {
            None => return true,
            Some(_) if zone_map.pass_all => return true,
            Some(cond) => cond,
        };
        cond.eval_bounds(&Bounds { min, max })
    }

    /// Replaces `row_ranges` with the union of the ordinal ranges of the
    /// pages whose zone maps may satisfy `cond` and are not wholly
    /// covered by `delete_cond`. Callers that pre-seeded the output must
    /// intersect externally.
    pub fn get_row_ranges_by_zone_map(
        &self,
        cond: Option<&dyn ColumnPredicate>,
        delete_cond: Option<&dyn ColumnPredicate>,
        row_ranges: &mut RowRanges,
    ) -> Result<()> {
        self.ensure_index_loaded()?;
        let page_indexes = self.get_filtered_pages(cond, delete_cond)?;
        self.calculate_row_ranges(&page_indexes, row_ranges)?;
        Ok(())
    }

    fn get_filtered_pages(
        &self,
        cond: Option<&dyn ColumnPredicate>,
        delete_cond: Option<&dyn ColumnPredicate>,
    ) -> Result<Vec<usize>> {
        let zone_map_index = self.zone_map_index.get().ok_or_else(|| {
            internal_err!("zone map pushdown on column {} without a zone map index", self.meta.column_id)
        })?;
        let zone_maps = zone_map_index.page_zone_maps();
        let page_count = zone_map_index.num_pages();
        let mut page_indexes = Vec::new();
        for (i, zone_map) in zone_maps.iter().enumerate().take(page_count) {
            if zone_map.pass_all {
                page_indexes.push(i);
                continue;
            }
            let (min, max) = self.parse_zone_map(zone_map)?;
            if !self.zone_map_match_condition(zone_map, &min, &max, cond) {
                continue;
            }
            let wholly_deleted = delete_cond.is_some_and(|del| {
                del.del_eval(&Bounds {
                    min: &min,
                    max: &max,
                }) == DelState::Satisfied
            });
            if !wholly_deleted {
                page_indexes.push(i);
            }
        }
        debug!(
            total_pages = page_count,
            accepted_pages = page_indexes.len(),
            "zone map pushdown"
        );
        Ok(page_indexes)
    }

    fn calculate_row_ranges(
        &self,
        page_indexes: &[usize],
        row_ranges: &mut RowRanges,
    ) -> Result<()> {
        row_ranges.clear();
        let ordinal_index = self.ordinal_index()?;
        for &i in page_indexes {
            let first = ordinal_index.get_first_ordinal(i);
            let last = ordinal_index.get_last_ordinal(i);
            row_ranges.add(RowRange::new(first, last + 1));
        }
        Ok(())
    }

    /// Intersects `row_ranges` with the ordinal ranges of the covered
    /// pages whose bloom filters may contain a matching value.
    pub fn get_row_ranges_by_bloom_filter(
        &self,
        cond: &dyn ColumnPredicate,
        row_ranges: &mut RowRanges,
    ) -> Result<()> {
        self.ensure_index_loaded()?;
        let bf_index = self.bloom_filter_index.get().ok_or_else(|| {
            internal_err!(
                "bloom filter pushdown on column {} without a bloom filter index",
                self.meta.column_id
            )
        })?;
        let ordinal_index = self.ordinal_index()?;
        let bf_iter = bf_index.new_iterator();

        // pages covered by the input ranges
        let mut page_ids = std::collections::BTreeSet::new();
        for i in 0..row_ranges.range_size() {
            let from = row_ranges.get_range_from(i);
            let to = row_ranges.get_range_to(i);
            let mut idx = from;
            let mut iter = ordinal_index.seek_at_or_before(from);
            while idx < to && iter.valid() {
                page_ids.insert(iter.page_index());
                idx = iter.last_ordinal() + 1;
                iter.next();
            }
        }

        let mut bf_row_ranges = RowRanges::new_empty();
        for page_id in page_ids {
            let bf = bf_iter.read_bloom_filter(page_id)?;
            if cond.eval_bloom_filter(&bf) {
                bf_row_ranges.add(RowRange::new(
                    ordinal_index.get_first_ordinal(page_id),
                    ordinal_index.get_last_ordinal(page_id) + 1,
                ));
            }
        }
        let input = row_ranges.clone();
        RowRanges::ranges_intersection(&input, &bf_row_ranges, row_ranges);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cursors and iterators

    /// Ordinal-index cursor at the first data page.
    pub fn seek_to_first(&self) -> Result<OrdinalPageIndexIterator> {
        self.ensure_index_loaded()?;
        let iter = self.ordinal_index()?.begin();
        if !iter.valid() {
            return Err(not_found_err!("failed to seek to the first row"));
        }
        Ok(iter)
    }

    /// Ordinal-index cursor at the page containing `ordinal` or the last
    /// page starting before it.
    pub fn seek_at_or_before(&self, ordinal: Ordinal) -> Result<OrdinalPageIndexIterator> {
        self.ensure_index_loaded()?;
        let iter = self.ordinal_index()?.seek_at_or_before(ordinal);
        if !iter.valid() {
            return Err(not_found_err!("failed to seek to ordinal {}", ordinal));
        }
        Ok(iter)
    }

    /// Iterator over the bitmap (inverted) index.
    pub fn new_bitmap_index_iterator(&self) -> Result<BitmapIndexIterator> {
        self.ensure_index_loaded()?;
        let bitmap_index = self.bitmap_index.get().ok_or_else(|| {
            not_found_err!("column {} has no bitmap index", self.meta.column_id)
        })?;
        Ok(bitmap_index.new_iterator())
    }

    /// Builds a cursor over this column's values.
    pub fn new_iterator(self: &Arc<Self>) -> Result<Box<dyn ColumnIterator>> {
        if self.is_empty() {
            return Ok(Box::new(EmptyColumnIterator::new()));
        }
        if self.meta.field_type.is_scalar() {
            return Ok(Box::new(ScalarColumnIterator::new(Arc::clone(self))));
        }
        match self.meta.field_type {
            FieldType::ARRAY => {
                let item_iterator = self.sub_readers[0].new_iterator()?;
                let length_iterator = ScalarColumnIterator::new(Arc::clone(&self.sub_readers[1]));
                let null_iterator = if self.is_nullable() {
                    Some(self.sub_readers[2].new_iterator()?)
                } else {
                    None
                };
                Ok(Box::new(ArrayColumnIterator::new(
                    Arc::clone(self),
                    length_iterator,
                    item_iterator,
                    null_iterator,
                )))
            }
            t => Err(unsupported_err!("unsupported type to create iterator: {}", t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;

    use crate::block::{ColumnBlockView, ColumnVectorBatch, MutableFixedColumn};
    use crate::column::iterator::DefaultValueIterator;
    use crate::predicate::Bounds;
    use crate::segment::page_io::MemoryBlock;
    use crate::types::CellValue;
    use crate::util::test_common::*;

    fn build_single_column(spec: ColumnSpec) -> (Arc<ColumnReader>, Arc<MemoryBlock>) {
        let mut builder = SegmentBuilder::new();
        let meta = builder.add_column(spec).unwrap();
        let block = builder.finish();
        let num_rows = meta.num_rows;
        let reader = ColumnReader::create(
            ColumnReaderOptions::new(block.clone()),
            meta,
            num_rows,
            "segment-0.dat",
        )
        .unwrap();
        (reader, block)
    }

    fn new_initialized_iterator(
        reader: &Arc<ColumnReader>,
        block: Arc<dyn crate::segment::page_io::ReadableBlock>,
    ) -> (Box<dyn crate::column::iterator::ColumnIterator>, ColumnIteratorOptions) {
        let opts = ColumnIteratorOptions::new(block);
        let mut iter = reader.new_iterator().unwrap();
        iter.init(opts.clone()).unwrap();
        (iter, opts)
    }

    /// Reads up to `n` INT32 rows into a fresh nullable batch.
    fn read_i32_batch(
        iter: &mut dyn crate::column::iterator::ColumnIterator,
        n: usize,
    ) -> (Vec<Option<i32>>, bool) {
        let mut batch = ColumnVectorBatch::new_scalar(FieldType::INT32, n, true).unwrap();
        let mut view = ColumnBlockView::new(&mut batch, 0);
        let mut count = n;
        let mut has_null = false;
        iter.next_batch(&mut count, &mut view, &mut has_null).unwrap();
        let scalar = batch.as_scalar().unwrap();
        let out = (0..count)
            .map(|i| {
                if scalar.is_null_at(i) {
                    None
                } else {
                    Some(i32::from_le_bytes(scalar.fixed_at(i).try_into().unwrap()))
                }
            })
            .collect();
        (out, has_null)
    }

    fn ranges_of(row_ranges: &RowRanges) -> Vec<(u64, u64)> {
        (0..row_ranges.range_size())
            .map(|i| (row_ranges.get_range_from(i), row_ranges.get_range_to(i)))
            .collect()
    }

    // ------------------------------------------------------------------
    // Construction

    #[test]
    fn test_missing_ordinal_index_is_corruption() {
        let meta = crate::segment::meta::ColumnMeta::new_scalar(1, FieldType::INT32, 10);
        let block = Arc::new(MemoryBlock::new(Bytes::new()));
        let err = ColumnReader::create(ColumnReaderOptions::new(block), meta, 10, "seg.dat")
            .unwrap_err();
        assert!(err.to_string().contains("missing ordinal index"), "{err}");
    }

    #[test]
    fn test_empty_column_needs_no_ordinal_index() {
        let meta = crate::segment::meta::ColumnMeta::new_scalar(1, FieldType::INT32, 0);
        let block = Arc::new(MemoryBlock::new(Bytes::new()));
        let reader =
            ColumnReader::create(ColumnReaderOptions::new(block.clone()), meta, 0, "seg.dat")
                .unwrap();
        assert!(reader.is_empty());

        let (mut iter, _) = new_initialized_iterator(&reader, block);
        iter.seek_to_first().unwrap();
        iter.seek_to_ordinal(42).unwrap();
        let (rows, has_null) = read_i32_batch(iter.as_mut(), 100);
        assert!(rows.is_empty());
        assert!(!has_null);
    }

    #[test]
    fn test_duplicate_index_is_corruption() {
        let mut builder = SegmentBuilder::new();
        let mut meta = builder
            .add_column(ColumnSpec::new(7, FieldType::INT32, i32_cells(&[Some(1)])))
            .unwrap();
        let dup = meta.indexes[0].clone();
        meta.indexes.push(dup);
        let block = builder.finish();
        let err = ColumnReader::create(ColumnReaderOptions::new(block), meta, 1, "seg.dat")
            .unwrap_err();
        assert!(err.to_string().contains("duplicate ordinal index"), "{err}");
    }

    // ------------------------------------------------------------------
    // Scalar scans

    #[test]
    fn test_dense_scan_across_pages() {
        let values: Vec<Option<i32>> = (0..1000).map(Some).collect();
        let (reader, block) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values)).rows_per_page(100),
        );
        let (mut iter, opts) = new_initialized_iterator(&reader, block);
        iter.seek_to_first().unwrap();

        let mut all = Vec::new();
        loop {
            let (rows, has_null) = read_i32_batch(iter.as_mut(), 128);
            if rows.is_empty() {
                break;
            }
            assert!(!has_null);
            all.extend(rows);
        }
        assert_eq!(all, values);
        assert_eq!(iter.get_current_ordinal(), 1000);
        assert!(opts.stats.bytes_read() >= 4000);
    }

    #[test]
    fn test_nullable_scan_with_null_runs() {
        // 10k rows, every fifth row null: 4 not-null / 1 null runs
        let values: Vec<Option<i32>> =
            (0..10_000).map(|i| (i % 5 != 4).then_some(i)).collect();
        let (reader, block) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .nullable()
                .rows_per_page(1000),
        );
        let (mut iter, _) = new_initialized_iterator(&reader, block);
        iter.seek_to_first().unwrap();

        let mut all = Vec::new();
        loop {
            let (rows, has_null) = read_i32_batch(iter.as_mut(), 1024);
            if rows.is_empty() {
                break;
            }
            assert!(has_null, "every 1024-batch spans a null run");
            all.extend(rows);
        }
        assert_eq!(all.len(), 10_000);
        assert_eq!(all.iter().filter(|v| v.is_none()).count(), 2_000);
        assert_eq!(all, values);
        assert_eq!(iter.get_current_ordinal(), 10_000);
    }

    #[test]
    fn test_seek_is_idempotent() {
        let values: Vec<Option<i32>> =
            (0..4000).map(|i| (i % 7 != 3).then_some(i * 3)).collect();
        let (reader, block) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .nullable()
                .rows_per_page(500),
        );
        let (mut iter, _) = new_initialized_iterator(&reader, block);

        iter.seek_to_ordinal(1777).unwrap();
        let (first, _) = read_i32_batch(iter.as_mut(), 64);
        iter.seek_to_ordinal(1777).unwrap();
        let (second, _) = read_i32_batch(iter.as_mut(), 64);
        assert_eq!(first, second);
        assert_eq!(first, values[1777..1777 + 64]);
    }

    #[test]
    fn test_seek_back_rewinds_null_decoder() {
        // read 500 rows, seek back to 100, read 50: ordinals [100, 150)
        let values: Vec<Option<i32>> =
            (0..1000).map(|i| (i % 3 != 1).then_some(i)).collect();
        let (reader, block) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .nullable()
                .rows_per_page(1000),
        );
        let (mut iter, _) = new_initialized_iterator(&reader, block.clone());
        iter.seek_to_first().unwrap();
        let (head, _) = read_i32_batch(iter.as_mut(), 500);
        assert_eq!(head, values[..500]);

        iter.seek_to_ordinal(100).unwrap();
        let (replay, _) = read_i32_batch(iter.as_mut(), 50);
        assert_eq!(replay, values[100..150]);

        // the same output as a fresh iterator seeking forward
        let (mut fresh, _) = new_initialized_iterator(&reader, block);
        fresh.seek_to_ordinal(100).unwrap();
        let (fresh_rows, _) = read_i32_batch(fresh.as_mut(), 50);
        assert_eq!(fresh_rows, replay);
    }

    #[test]
    fn test_random_seeks_match_sequential_read() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let values: Vec<Option<i32>> =
            (0..5000).map(|i| (i % 13 != 7).then_some(i ^ 0x5a5a)).collect();
        let (reader, block) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .nullable()
                .rows_per_page(700),
        );
        let (mut iter, _) = new_initialized_iterator(&reader, block);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let ordinal = rng.gen_range(0..values.len() - 32);
            iter.seek_to_ordinal(ordinal as u64).unwrap();
            let (got, _) = read_i32_batch(iter.as_mut(), 32);
            assert_eq!(got, values[ordinal..ordinal + 32], "seek to {ordinal}");
        }
    }

    #[test]
    fn test_seek_across_pages_and_forward_within_page() {
        let values: Vec<Option<i32>> =
            (0..3000).map(|i| (i % 11 != 0).then_some(i)).collect();
        let (reader, block) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .nullable()
                .rows_per_page(300),
        );
        let (mut iter, _) = new_initialized_iterator(&reader, block);

        for &ordinal in &[0usize, 299, 300, 1234, 2999, 50, 2000] {
            iter.seek_to_ordinal(ordinal as u64).unwrap();
            assert_eq!(iter.get_current_ordinal(), ordinal as u64);
            let want = values[ordinal..(ordinal + 8).min(values.len())].to_vec();
            let (got, _) = read_i32_batch(iter.as_mut(), want.len());
            assert_eq!(got, want, "seek to {ordinal}");
        }
    }

    #[test]
    fn test_vectorized_scan() {
        let values: Vec<Option<i32>> =
            (0..800).map(|i| (i % 4 != 2).then_some(i)).collect();
        let (reader, block) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .nullable()
                .rows_per_page(128),
        );
        let (mut iter, opts) = new_initialized_iterator(&reader, block);
        iter.seek_to_first().unwrap();

        let mut col = MutableFixedColumn::new(4);
        let mut n = 800;
        let mut has_null = false;
        iter.next_batch_vec(&mut n, &mut col, &mut has_null).unwrap();
        assert_eq!(n, 800);
        assert!(has_null);
        for (i, expected) in values.iter().enumerate() {
            match expected {
                Some(v) => {
                    assert!(!col.is_null_at(i));
                    assert_eq!(col.fixed_at(i), v.to_le_bytes());
                }
                None => assert!(col.is_null_at(i)),
            }
        }
        assert!(opts.stats.bytes_read() >= 3200);
    }

    #[test]
    fn test_seek_to_page_start() {
        let values: Vec<Option<i32>> = (0..600).map(Some).collect();
        let (reader, block) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values)).rows_per_page(200),
        );
        let (mut iter, _) = new_initialized_iterator(&reader, block);
        iter.seek_to_ordinal(450).unwrap();
        iter.seek_to_page_start().unwrap();
        assert_eq!(iter.get_current_ordinal(), 400);
        let (rows, _) = read_i32_batch(iter.as_mut(), 3);
        assert_eq!(rows, vec![Some(400), Some(401), Some(402)]);
    }

    // ------------------------------------------------------------------
    // Zone maps

    #[test]
    fn test_match_condition() {
        let values: Vec<Option<i32>> = (1..=100).map(Some).collect();
        let (reader, _) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .zone_maps(vec![int_zone_map(1, 100)], int_zone_map(1, 100)),
        );
        assert!(reader.match_condition(None).unwrap());
        assert!(reader
            .match_condition(Some(&GreaterThan(CellValue::Int32(50))))
            .unwrap());
        assert!(!reader
            .match_condition(Some(&GreaterThan(CellValue::Int32(150))))
            .unwrap());
    }

    #[test]
    fn test_match_condition_without_zone_map() {
        let values: Vec<Option<i32>> = (0..10).map(Some).collect();
        let (reader, _) =
            build_single_column(ColumnSpec::new(1, FieldType::INT32, i32_cells(&values)));
        assert!(reader
            .match_condition(Some(&GreaterThan(CellValue::Int32(i32::MAX))))
            .unwrap());
    }

    #[test]
    fn test_zone_map_pushdown() {
        // four pages of 100 rows: [1..10], pass_all [11..20], [21..30], empty
        let values: Vec<Option<i32>> = (0..400).map(Some).collect();
        let (reader, _) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .rows_per_page(100)
                .zone_maps(
                    vec![
                        int_zone_map(1, 10),
                        pass_all_zone_map(11, 20),
                        int_zone_map(21, 30),
                        empty_zone_map(),
                    ],
                    int_zone_map(1, 30),
                ),
        );

        let mut ranges = RowRanges::new_empty();
        reader
            .get_row_ranges_by_zone_map(
                Some(&GreaterThan(CellValue::Int32(15))),
                None,
                &mut ranges,
            )
            .unwrap();
        assert_eq!(ranges_of(&ranges), vec![(100, 300)]);

        // no condition: every non-empty zone is accepted
        reader
            .get_row_ranges_by_zone_map(None, None, &mut ranges)
            .unwrap();
        assert_eq!(ranges_of(&ranges), vec![(0, 300)]);
    }

    #[test]
    fn test_zone_map_pushdown_full_range_under_true_condition() {
        let values: Vec<Option<i32>> = (0..300).map(Some).collect();
        let (reader, _) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .rows_per_page(100)
                .zone_maps(
                    vec![
                        int_zone_map(0, 99),
                        int_zone_map(100, 199),
                        int_zone_map(200, 299),
                    ],
                    int_zone_map(0, 299),
                ),
        );
        let mut ranges = RowRanges::new_empty();
        reader
            .get_row_ranges_by_zone_map(Some(&TruePredicate), None, &mut ranges)
            .unwrap();
        assert_eq!(ranges_of(&ranges), vec![(0, 300)]);
        assert_eq!(ranges.count(), reader.num_rows());
    }

    #[test]
    fn test_zone_map_pass_all_skips_condition_evaluation() {
        struct PanickingPredicate;
        impl ColumnPredicate for PanickingPredicate {
            fn eval_bounds(&self, _bounds: &Bounds<'_>) -> bool {
                panic!("pass_all must short-circuit evaluation")
            }
        }
        let values: Vec<Option<i32>> = (0..100).map(Some).collect();
        let (reader, _) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .zone_maps(vec![pass_all_zone_map(0, 99)], pass_all_zone_map(0, 99)),
        );
        let mut ranges = RowRanges::new_empty();
        reader
            .get_row_ranges_by_zone_map(Some(&PanickingPredicate), None, &mut ranges)
            .unwrap();
        assert_eq!(ranges_of(&ranges), vec![(0, 100)]);
        assert!(reader.match_condition(Some(&PanickingPredicate)).unwrap());
    }

    #[test]
    fn test_zone_map_pushdown_with_delete_condition() {
        let values: Vec<Option<i32>> = (0..300).map(Some).collect();
        let (reader, _) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .rows_per_page(100)
                .zone_maps(
                    vec![
                        int_zone_map(1, 10),
                        int_zone_map(11, 20),
                        int_zone_map(21, 30),
                    ],
                    int_zone_map(1, 30),
                ),
        );
        // zones with max <= 10 are wholly deleted
        let mut ranges = RowRanges::new_empty();
        reader
            .get_row_ranges_by_zone_map(
                Some(&TruePredicate),
                Some(&DeleteUpTo(CellValue::Int32(10))),
                &mut ranges,
            )
            .unwrap();
        assert_eq!(ranges_of(&ranges), vec![(100, 300)]);
    }

    // ------------------------------------------------------------------
    // Bloom filters

    #[test]
    fn test_bloom_filter_pushdown() {
        // three pages; 777 appears in pages 1 and 2 only
        let mut raw: Vec<i32> = (0..300).collect();
        raw[150] = 777;
        raw[250] = 777;
        let values: Vec<Option<i32>> = raw.into_iter().map(Some).collect();
        let (reader, _) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .rows_per_page(100)
                .bloom_filter(),
        );

        let mut ranges = RowRanges::create_single(0, 300);
        reader
            .get_row_ranges_by_bloom_filter(&EqualsCell::int(777), &mut ranges)
            .unwrap();
        assert_eq!(ranges_of(&ranges), vec![(100, 300)]);

        // a value in no page leaves nothing
        let mut ranges = RowRanges::create_single(0, 300);
        reader
            .get_row_ranges_by_bloom_filter(&EqualsCell::int(-123456), &mut ranges)
            .unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_bloom_filter_intersects_input_ranges() {
        let values: Vec<Option<i32>> = (0..300).map(Some).collect();
        let (reader, _) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .rows_per_page(100)
                .bloom_filter(),
        );
        // input covers only [0, 150); page 1's accepted range is clipped
        let mut ranges = RowRanges::create_single(0, 150);
        reader
            .get_row_ranges_by_bloom_filter(&EqualsCell::int(120), &mut ranges)
            .unwrap();
        assert_eq!(ranges_of(&ranges), vec![(100, 150)]);
    }

    // ------------------------------------------------------------------
    // Dictionary columns

    #[test]
    fn test_dict_column_reads_dictionary_once_per_iterator() {
        let words = ["alpha", "beta", "gamma", "delta"];
        let values: Vec<Option<&str>> =
            (0..300).map(|i| Some(words[i % words.len()])).collect();
        let mut builder = SegmentBuilder::new();
        let meta = builder
            .add_column(
                ColumnSpec::new(1, FieldType::VARCHAR, str_cells(&values))
                    .dict_encoded()
                    .rows_per_page(100),
            )
            .unwrap();
        let dict_offset = meta.dict_page.unwrap().offset;
        let inner = builder.finish();
        let block = Arc::new(CountingBlock::new((*inner).clone()));

        let reader = ColumnReader::create(
            ColumnReaderOptions::new(block.clone()),
            meta,
            300,
            "segment-0.dat",
        )
        .unwrap();

        let scan = |block: Arc<CountingBlock<MemoryBlock>>| {
            let mut iter = reader.new_iterator().unwrap();
            iter.init(ColumnIteratorOptions::new(block)).unwrap();
            iter.seek_to_first().unwrap();
            let mut all = Vec::new();
            loop {
                let mut batch =
                    ColumnVectorBatch::new_scalar(FieldType::VARCHAR, 64, false).unwrap();
                let mut view = ColumnBlockView::new(&mut batch, 0);
                let mut n = 64;
                let mut has_null = false;
                iter.next_batch(&mut n, &mut view, &mut has_null).unwrap();
                if n == 0 {
                    break;
                }
                let scalar = batch.as_scalar().unwrap();
                for i in 0..n {
                    all.push(String::from_utf8(scalar.binary_at(i).to_vec()).unwrap());
                }
            }
            all
        };

        let all = scan(block.clone());
        assert_eq!(all.len(), 300);
        for (i, got) in all.iter().enumerate() {
            assert_eq!(got, words[i % words.len()]);
        }
        // three data pages were decoded, the dictionary page exactly once
        assert_eq!(block.reads_at(dict_offset), 1);

        // a second iterator loads its own copy once more; the page cache
        // would dedup this in a full deployment
        let _ = scan(block.clone());
        assert_eq!(block.reads_at(dict_offset), 2);
    }

    // ------------------------------------------------------------------
    // Bitmap index

    #[test]
    fn test_bitmap_index_through_reader() {
        let values = i32_cells(&[Some(5), None, Some(3), Some(5), Some(9), None]);
        let (reader, _) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, values)
                .nullable()
                .bitmap_index(),
        );
        let iter = reader.new_bitmap_index_iterator().unwrap();
        let rank = iter.seek_dictionary(&5i32.to_le_bytes()).unwrap();
        let rows = iter.read_bitmap(rank).unwrap();
        assert!(rows.contains(0) && rows.contains(3) && !rows.contains(2));
        let nulls = iter.read_null_bitmap().unwrap();
        assert!(nulls.contains(1) && nulls.contains(5) && !nulls.contains(0));
    }

    #[test]
    fn test_bitmap_index_absent() {
        let (reader, _) = build_single_column(ColumnSpec::new(
            1,
            FieldType::INT32,
            i32_cells(&[Some(1)]),
        ));
        assert!(reader.new_bitmap_index_iterator().is_err());
    }

    // ------------------------------------------------------------------
    // Arrays

    fn build_array_column(
        item_cells: Vec<Option<Vec<u8>>>,
        lengths: &[u32],
        null_markers: Option<&[u8]>,
        item_nullable: bool,
    ) -> (Arc<ColumnReader>, Arc<MemoryBlock>) {
        let mut builder = SegmentBuilder::new();
        let mut item_spec = ColumnSpec::new(0, FieldType::INT32, item_cells).rows_per_page(100);
        if item_nullable {
            item_spec = item_spec.nullable();
        }
        let item_meta = builder.add_column(item_spec).unwrap();
        let offsets_meta = builder
            .add_column(
                ColumnSpec::new(1, FieldType::UINT32, u32_cells(lengths)).rows_per_page(100),
            )
            .unwrap();
        let mut children = vec![item_meta, offsets_meta];
        let nullable = null_markers.is_some();
        if let Some(markers) = null_markers {
            children.push(
                builder
                    .add_column(
                        ColumnSpec::new(2, FieldType::INT8, u8_cells(markers)).rows_per_page(100),
                    )
                    .unwrap(),
            );
        }
        let meta = ColumnMeta {
            column_id: 3,
            field_type: FieldType::ARRAY,
            length: 0,
            encoding: Encoding::PLAIN,
            compression: Compression::LZ4,
            is_nullable: nullable,
            num_rows: lengths.len() as u64,
            dict_page: None,
            indexes: Vec::new(),
            children,
        };
        let block = builder.finish();
        let reader = ColumnReader::create(
            ColumnReaderOptions::new(block.clone()),
            meta,
            lengths.len() as u64,
            "segment-0.dat",
        )
        .unwrap();
        (reader, block)
    }

    fn array_items_i32(batch: &ColumnVectorBatch, idx: usize) -> Option<Vec<i32>> {
        let arr = batch.as_array().unwrap();
        if arr.is_null_at(idx) {
            return None;
        }
        let items = arr.elements().as_scalar().unwrap();
        let from = arr.item_offset(idx) as usize;
        let to = arr.item_offset(idx + 1) as usize;
        Some(
            (from..to)
                .map(|i| i32::from_le_bytes(items.fixed_at(i).try_into().unwrap()))
                .collect(),
        )
    }

    #[test]
    fn test_array_of_nullable_arrays() {
        // arrays {[7, 8], NULL, [1, 2, 3]}
        let (reader, block) = build_array_column(
            i32_cells(&[Some(7), Some(8), Some(1), Some(2), Some(3)]),
            &[2, 0, 3],
            Some(&[0, 1, 0]),
            false,
        );
        assert_eq!(reader.num_rows(), 3);

        let (mut iter, _) = new_initialized_iterator(&reader, block);
        iter.seek_to_first().unwrap();

        let items = ColumnVectorBatch::new_scalar(FieldType::INT32, 2, false).unwrap();
        let mut batch = ColumnVectorBatch::new_array(items, 3, true).unwrap();
        {
            let mut view = ColumnBlockView::new(&mut batch, 0);
            let mut n = 3;
            let mut has_null = false;
            iter.next_batch(&mut n, &mut view, &mut has_null).unwrap();
            assert_eq!(n, 3);
            assert!(has_null, "nullable arrays always signal nullability");
        }

        let arr = batch.as_array().unwrap();
        assert_eq!(arr.item_offset(0), 0);
        assert_eq!(arr.item_offset(1), 2);
        assert_eq!(arr.item_offset(2), 2);
        assert_eq!(arr.item_offset(3), 5);
        assert_eq!(array_items_i32(&batch, 0), Some(vec![7, 8]));
        assert_eq!(array_items_i32(&batch, 1), None);
        assert_eq!(array_items_i32(&batch, 2), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_array_multiple_batches_accumulate_offsets() {
        // six arrays of lengths 1..=6 over items 0..21
        let items: Vec<Option<i32>> = (0..21).map(Some).collect();
        let lengths = [1u32, 2, 3, 4, 5, 6];
        let (reader, block) =
            build_array_column(i32_cells(&items), &lengths, None, false);
        let (mut iter, _) = new_initialized_iterator(&reader, block);
        iter.seek_to_first().unwrap();

        let item_batch = ColumnVectorBatch::new_scalar(FieldType::INT32, 4, false).unwrap();
        let mut batch = ColumnVectorBatch::new_array(item_batch, 6, false).unwrap();
        let mut view = ColumnBlockView::new(&mut batch, 0);
        for _ in 0..2 {
            let mut n = 3;
            let mut has_null = true;
            iter.next_batch(&mut n, &mut view, &mut has_null).unwrap();
            assert_eq!(n, 3);
            assert!(!has_null);
        }
        drop(view);

        let mut expected_offset = 0u64;
        let arr = batch.as_array().unwrap();
        for (i, len) in lengths.iter().enumerate() {
            assert_eq!(arr.item_offset(i), expected_offset);
            expected_offset += *len as u64;
        }
        assert_eq!(arr.item_offset(6), 21);
        assert_eq!(array_items_i32(&batch, 5), Some(vec![15, 16, 17, 18, 19, 20]));
    }

    #[test]
    fn test_array_seek_to_ordinal() {
        let items: Vec<Option<i32>> = (0..10).map(Some).collect();
        let lengths = [1u32, 2, 3, 4];
        let (reader, block) = build_array_column(i32_cells(&items), &lengths, None, false);
        let (mut iter, _) = new_initialized_iterator(&reader, block);

        iter.seek_to_ordinal(2).unwrap();
        assert_eq!(iter.get_current_ordinal(), 2);

        let item_batch = ColumnVectorBatch::new_scalar(FieldType::INT32, 8, false).unwrap();
        let mut batch = ColumnVectorBatch::new_array(item_batch, 2, false).unwrap();
        let mut view = ColumnBlockView::new(&mut batch, 0);
        let mut n = 2;
        let mut has_null = false;
        iter.next_batch(&mut n, &mut view, &mut has_null).unwrap();
        drop(view);
        assert_eq!(n, 2);
        assert_eq!(array_items_i32(&batch, 0), Some(vec![3, 4, 5]));
        assert_eq!(array_items_i32(&batch, 1), Some(vec![6, 7, 8, 9]));
    }

    #[test]
    fn test_array_with_nullable_items() {
        // one array [10, NULL, 30]
        let (reader, block) = build_array_column(
            i32_cells(&[Some(10), None, Some(30)]),
            &[3],
            None,
            true,
        );
        let (mut iter, _) = new_initialized_iterator(&reader, block);
        iter.seek_to_first().unwrap();

        let item_batch = ColumnVectorBatch::new_scalar(FieldType::INT32, 3, true).unwrap();
        let mut batch = ColumnVectorBatch::new_array(item_batch, 1, false).unwrap();
        let mut view = ColumnBlockView::new(&mut batch, 0);
        let mut n = 1;
        let mut has_null = false;
        iter.next_batch(&mut n, &mut view, &mut has_null).unwrap();
        drop(view);

        let arr = batch.as_array().unwrap();
        let items = arr.elements().as_scalar().unwrap();
        assert!(!items.is_null_at(0));
        assert!(items.is_null_at(1));
        assert!(!items.is_null_at(2));
        assert_eq!(items.fixed_at(2), 30i32.to_le_bytes());
    }

    // ------------------------------------------------------------------
    // Sharing

    #[test]
    fn test_reader_shared_across_threads() {
        let values: Vec<Option<i32>> = (0..2000).map(Some).collect();
        let (reader, block) = build_single_column(
            ColumnSpec::new(1, FieldType::INT32, i32_cells(&values))
                .rows_per_page(250)
                .zone_maps(
                    (0..8).map(|p| int_zone_map(p * 250, (p + 1) * 250 - 1)).collect(),
                    int_zone_map(0, 1999),
                ),
        );

        let mut handles = Vec::new();
        for t in 0..4u64 {
            let reader = Arc::clone(&reader);
            let block: Arc<dyn crate::segment::page_io::ReadableBlock> = block.clone();
            handles.push(std::thread::spawn(move || {
                // concurrent first-touch of the lazy indices
                let mut ranges = RowRanges::new_empty();
                reader
                    .get_row_ranges_by_zone_map(
                        Some(&GreaterThan(CellValue::Int32(999))),
                        None,
                        &mut ranges,
                    )
                    .unwrap();
                assert_eq!(ranges.count(), 1000);

                let mut iter = reader.new_iterator().unwrap();
                iter.init(ColumnIteratorOptions::new(block)).unwrap();
                iter.seek_to_ordinal(t * 100).unwrap();
                let mut batch =
                    ColumnVectorBatch::new_scalar(FieldType::INT32, 10, false).unwrap();
                let mut view = ColumnBlockView::new(&mut batch, 0);
                let mut n = 10;
                let mut has_null = false;
                iter.next_batch(&mut n, &mut view, &mut has_null).unwrap();
                assert_eq!(n, 10);
                let scalar = batch.as_scalar().unwrap();
                assert_eq!(
                    scalar.fixed_at(0),
                    ((t * 100) as i32).to_le_bytes(),
                    "thread {t}"
                );
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }

    // ------------------------------------------------------------------
    // Default values for absent columns

    #[test]
    fn test_default_value_iterator_alongside_reader() {
        // a column added to the schema after this segment was written
        let ti = crate::types::get_type_info(FieldType::INT32).unwrap();
        let mut iter = DefaultValueIterator::new(ti, true, Some("7".to_string()), false, 0);
        let block: Arc<dyn crate::segment::page_io::ReadableBlock> =
            Arc::new(MemoryBlock::new(Bytes::new()));
        iter.init(ColumnIteratorOptions::new(block)).unwrap();
        iter.seek_to_ordinal(500).unwrap();
        let (rows, has_null) = read_i32_batch(&mut iter, 16);
        assert!(!has_null);
        assert_eq!(rows, vec![Some(7); 16]);
    }
}
