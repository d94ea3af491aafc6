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

//! Column cursors: ordinal-addressable batched access to decoded values.
//!
//! A cursor is single-threaded. It owns its current [`ParsedPage`] and,
//! for dictionary-encoded columns, the dictionary word table, and holds
//! shared ownership of the [`ColumnReader`] it was built from.

use std::sync::Arc;

use bytes::Bytes;

use crate::basic::{Encoding, FieldType, Ordinal, PageType};
use crate::block::{ColumnBlockView, ColumnVectorBatch, MutableColumn};
use crate::column::reader::ColumnReader;
use crate::column::ColumnIteratorOptions;
use crate::encodings::binary_dict::BinaryDictDecoder;
use crate::encodings::binary_plain::BinaryPlainDecoder;
use crate::encodings::PageDecoder;
use crate::errors::Result;
use crate::index::ordinal::OrdinalPageIndexIterator;
use crate::predicate::ColumnPredicate;
use crate::row_ranges::RowRanges;
use crate::segment::page_io::PageFooter;
use crate::segment::parsed_page::{PageNulls, ParsedPage};
use crate::types::TypeInfo;
use crate::util::bit_util;

/// Batched cursor over one column.
///
/// Rows are produced in strictly ascending ordinal order between seeks.
/// `next_batch` and `next_batch_vec` shrink `*n` to the number of rows
/// actually produced and set `*has_null` when any null was emitted.
pub trait ColumnIterator: Send {
    fn init(&mut self, opts: ColumnIteratorOptions) -> Result<()>;

    fn seek_to_first(&mut self) -> Result<()>;

    fn seek_to_ordinal(&mut self, ordinal: Ordinal) -> Result<()>;

    /// Repositions to the first ordinal of the current page.
    fn seek_to_page_start(&mut self) -> Result<()> {
        Err(unsupported_err!("seek_to_page_start on this iterator"))
    }

    fn next_batch(
        &mut self,
        n: &mut usize,
        dst: &mut ColumnBlockView<'_>,
        has_null: &mut bool,
    ) -> Result<()>;

    fn next_batch_vec(
        &mut self,
        n: &mut usize,
        dst: &mut dyn MutableColumn,
        has_null: &mut bool,
    ) -> Result<()>;

    fn get_current_ordinal(&self) -> Ordinal;

    /// Narrows `row_ranges` using the zone-map index when the column has
    /// one; otherwise leaves it untouched.
    fn get_row_ranges_by_zone_map(
        &self,
        _cond: Option<&dyn ColumnPredicate>,
        _delete_cond: Option<&dyn ColumnPredicate>,
        _row_ranges: &mut RowRanges,
    ) -> Result<()> {
        Ok(())
    }

    /// Narrows `row_ranges` using the bloom-filter index when the
    /// predicate supports it and the column has one; otherwise leaves it
    /// untouched.
    fn get_row_ranges_by_bloom_filter(
        &self,
        _cond: &dyn ColumnPredicate,
        _row_ranges: &mut RowRanges,
    ) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Scalar columns

pub struct ScalarColumnIterator {
    reader: Arc<ColumnReader>,
    opts: Option<ColumnIteratorOptions>,
    page_iter: Option<OrdinalPageIndexIterator>,
    page: Option<ParsedPage>,
    current_ordinal: Ordinal,
    /// Dictionary word table, loaded at the first dict-encoded data
    /// page and kept for the iterator's lifetime.
    dict_words: Option<Arc<Vec<Bytes>>>,
}

impl ScalarColumnIterator {
    pub fn new(reader: Arc<ColumnReader>) -> Self {
        Self {
            reader,
            opts: None,
            page_iter: None,
            page: None,
            current_ordinal: 0,
            dict_words: None,
        }
    }

    fn opts(&self) -> Result<&ColumnIteratorOptions> {
        self.opts
            .as_ref()
            .ok_or_else(|| internal_err!("column iterator used before init"))
    }

    /// Reads and parses the data page under the cursor, loading the
    /// dictionary on the first dict-encoded page encountered.
    fn read_data_page(&mut self, iter: &OrdinalPageIndexIterator) -> Result<()> {
        let opts = self.opts()?.clone();
        let (handle, body, footer) =
            self.reader
                .read_page(&opts, iter.page(), PageType::DATA_PAGE)?;
        let footer = footer.as_data()?;
        let mut page = ParsedPage::create(
            handle,
            body,
            footer,
            self.reader.encoding_info()?,
            self.reader.type_info()?,
            iter.page(),
            iter.page_index(),
        )?;

        // The dictionary is loaded when the first data page that uses it
        // is read, so an untouched column costs no dictionary memory.
        // Non-dict-encoded fallback pages may coexist in the column and
        // decode without it.
        if self.reader.encoding() == Encoding::DICT {
            let dict_decoder = page
                .data_decoder
                .as_any_mut()
                .downcast_mut::<BinaryDictDecoder>()
                .ok_or_else(|| internal_err!("dict-encoded column produced a non-dict decoder"))?;
            if dict_decoder.is_dict_encoding() {
                let words = match self.dict_words.clone() {
                    Some(words) => words,
                    None => {
                        let words = Arc::new(self.load_dict_words(&opts)?);
                        self.dict_words = Some(Arc::clone(&words));
                        words
                    }
                };
                if let Some(dict_decoder) = page
                    .data_decoder
                    .as_any_mut()
                    .downcast_mut::<BinaryDictDecoder>()
                {
                    dict_decoder.set_dict(words);
                }
            }
        }

        self.page = Some(page);
        Ok(())
    }

    fn load_dict_words(&self, opts: &ColumnIteratorOptions) -> Result<Vec<Bytes>> {
        let dict_page = self
            .reader
            .dict_page_pointer()
            .ok_or_else(|| corruption_err!("dict-encoded column without a dictionary page"))?;
        let (_handle, body, footer) =
            self.reader
                .read_page(opts, dict_page, PageType::DICTIONARY_PAGE)?;
        let num_values = match footer {
            PageFooter::Dict { num_values } => num_values as usize,
            _ => unreachable!("page type checked by the page reader"),
        };
        // dictionary pages are always binary-plain encoded
        let decoder = BinaryPlainDecoder::new(body)?;
        if decoder.count() != num_values {
            return Err(corruption_err!(
                "dictionary page holds {} words, footer says {}",
                decoder.count(),
                num_values
            ));
        }
        Ok(decoder.dict_word_info())
    }

    /// Positions the page's decoders at row `offset_in_page`.
    ///
    /// With nulls, a forward seek skips from the null decoder's current
    /// position; a backward seek rewinds the null decoder to the start
    /// of the bitmap first. The value decoder lands on the row's
    /// position within the value stream.
    fn seek_to_pos_in_page(page: &mut ParsedPage, offset_in_page: u64) -> Result<()> {
        if page.offset_in_page == offset_in_page {
            return Ok(());
        }

        let mut pos_in_data = offset_in_page;
        if page.has_null() {
            let (offset_in_data, skips) = if offset_in_page > page.offset_in_page {
                // forward: reuse the null decoder's position
                (
                    page.data_decoder.current_index() as u64,
                    offset_in_page - page.offset_in_page,
                )
            } else {
                page.rewind_nulls();
                (0, offset_in_page)
            };
            let skipped_nulls = match &mut page.nulls {
                PageNulls::Nullable { decoder, .. } => decoder.skip(skips as usize)? as u64,
                PageNulls::Dense => unreachable!("has_null checked above"),
            };
            pos_in_data = offset_in_data + skips - skipped_nulls;
        }

        page.data_decoder
            .seek_to_position_in_page(pos_in_data as usize)?;
        page.offset_in_page = offset_in_page;
        Ok(())
    }

    /// Advances to the next data page; `Ok(true)` means end of stream.
    fn load_next_page(&mut self) -> Result<bool> {
        let mut iter = match self.page_iter.clone() {
            Some(iter) => iter,
            None => return Ok(true),
        };
        iter.next();
        if !iter.valid() {
            self.page_iter = Some(iter);
            return Ok(true);
        }
        self.read_data_page(&iter)?;
        self.page_iter = Some(iter);
        Ok(false)
    }

    fn type_info(&self) -> Result<&'static TypeInfo> {
        self.reader.type_info()
    }
}

impl ColumnIterator for ScalarColumnIterator {
    fn init(&mut self, opts: ColumnIteratorOptions) -> Result<()> {
        self.opts = Some(opts);
        Ok(())
    }

    fn seek_to_first(&mut self) -> Result<()> {
        let iter = self.reader.seek_to_first()?;
        self.read_data_page(&iter)?;
        self.page_iter = Some(iter);
        if let Some(page) = self.page.as_mut() {
            Self::seek_to_pos_in_page(page, 0)?;
        }
        self.current_ordinal = 0;
        Ok(())
    }

    fn seek_to_ordinal(&mut self, ordinal: Ordinal) -> Result<()> {
        // reuse the current page when it already holds the target row
        let page_usable = self.page.as_ref().is_some_and(|p| p.contains(ordinal))
            && self.page_iter.as_ref().is_some_and(|i| i.valid());
        if !page_usable {
            let iter = self.reader.seek_at_or_before(ordinal)?;
            self.read_data_page(&iter)?;
            self.page_iter = Some(iter);
        }
        let page = match self.page.as_mut() {
            Some(page) => page,
            None => return Err(internal_err!("no page loaded after seeking to {}", ordinal)),
        };
        Self::seek_to_pos_in_page(page, ordinal - page.first_ordinal)?;
        self.current_ordinal = ordinal;
        Ok(())
    }

    fn seek_to_page_start(&mut self) -> Result<()> {
        let first_ordinal = self
            .page
            .as_ref()
            .ok_or_else(|| internal_err!("seek_to_page_start without a loaded page"))?
            .first_ordinal;
        self.seek_to_ordinal(first_ordinal)
    }

    fn next_batch(
        &mut self,
        n: &mut usize,
        dst: &mut ColumnBlockView<'_>,
        has_null: &mut bool,
    ) -> Result<()> {
        let mut remaining = *n;
        *has_null = false;
        while remaining > 0 {
            if !self.page.as_ref().is_some_and(|p| p.has_remaining()) {
                if self.load_next_page()? {
                    break;
                }
            }

            let page = match self.page.as_mut() {
                Some(page) => page,
                None => return Err(internal_err!("no page loaded inside a batch read")),
            };
            let nrows_in_page = (remaining as u64).min(page.remaining()) as usize;
            let ParsedPage {
                data_decoder,
                nulls,
                offset_in_page,
                ..
            } = page;
            match nulls {
                PageNulls::Nullable { decoder, .. } => {
                    // Step the null stream in runs: a not-null run is
                    // decoded in one call, a null run only stamps null
                    // signs. Decoder call count scales with the number
                    // of runs, not rows.
                    let mut nrows_to_read = nrows_in_page;
                    while nrows_to_read > 0 {
                        let (is_null, this_run) = decoder.get_next_run(nrows_to_read)?;
                        if !is_null {
                            let mut num_rows = this_run;
                            data_decoder.next_batch(&mut num_rows, dst)?;
                            if num_rows != this_run {
                                return Err(corruption_err!(
                                    "value stream ended inside a page: wanted {}, got {}",
                                    this_run,
                                    num_rows
                                ));
                            }
                        } else {
                            *has_null = true;
                        }
                        dst.set_null_bits(this_run, is_null);

                        nrows_to_read -= this_run;
                        *offset_in_page += this_run as u64;
                        dst.advance(this_run);
                        self.current_ordinal += this_run as u64;
                    }
                }
                PageNulls::Dense => {
                    let mut nrows_to_read = nrows_in_page;
                    data_decoder.next_batch(&mut nrows_to_read, dst)?;
                    if nrows_to_read != nrows_in_page {
                        return Err(corruption_err!(
                            "value stream ended inside a page: wanted {}, got {}",
                            nrows_in_page,
                            nrows_to_read
                        ));
                    }
                    if dst.is_nullable() {
                        dst.set_null_bits(nrows_to_read, false);
                    }
                    *offset_in_page += nrows_to_read as u64;
                    dst.advance(nrows_to_read);
                    self.current_ordinal += nrows_to_read as u64;
                }
            }
            remaining -= nrows_in_page;
        }
        *n -= remaining;

        let elem_size = self.type_info()?.size();
        self.opts()?
            .stats
            .add_bytes_read((*n * elem_size + bit_util::bitmap_size(*n)) as u64);
        Ok(())
    }

    fn next_batch_vec(
        &mut self,
        n: &mut usize,
        dst: &mut dyn MutableColumn,
        has_null: &mut bool,
    ) -> Result<()> {
        let start_size = dst.byte_size();
        let mut remaining = *n;
        *has_null = false;
        while remaining > 0 {
            if !self.page.as_ref().is_some_and(|p| p.has_remaining()) {
                if self.load_next_page()? {
                    break;
                }
            }

            let page = match self.page.as_mut() {
                Some(page) => page,
                None => return Err(internal_err!("no page loaded inside a batch read")),
            };
            let nrows_in_page = (remaining as u64).min(page.remaining()) as usize;
            let ParsedPage {
                data_decoder,
                nulls,
                offset_in_page,
                ..
            } = page;
            match nulls {
                PageNulls::Nullable { decoder, .. } => {
                    let mut nrows_to_read = nrows_in_page;
                    while nrows_to_read > 0 {
                        let (is_null, this_run) = decoder.get_next_run(nrows_to_read)?;
                        if !is_null {
                            let mut num_rows = this_run;
                            data_decoder.next_batch_vec(&mut num_rows, dst)?;
                            if num_rows != this_run {
                                return Err(corruption_err!(
                                    "value stream ended inside a page: wanted {}, got {}",
                                    this_run,
                                    num_rows
                                ));
                            }
                        } else {
                            *has_null = true;
                            dst.insert_many_defaults(this_run);
                        }
                        nrows_to_read -= this_run;
                        *offset_in_page += this_run as u64;
                        self.current_ordinal += this_run as u64;
                    }
                }
                PageNulls::Dense => {
                    let mut nrows_to_read = nrows_in_page;
                    data_decoder.next_batch_vec(&mut nrows_to_read, dst)?;
                    if nrows_to_read != nrows_in_page {
                        return Err(corruption_err!(
                            "value stream ended inside a page: wanted {}, got {}",
                            nrows_in_page,
                            nrows_to_read
                        ));
                    }
                    *offset_in_page += nrows_to_read as u64;
                    self.current_ordinal += nrows_to_read as u64;
                }
            }
            remaining -= nrows_in_page;
        }
        *n -= remaining;

        self.opts()?.stats.add_bytes_read(
            (dst.byte_size() - start_size + bit_util::bitmap_size(*n)) as u64,
        );
        Ok(())
    }

    fn get_current_ordinal(&self) -> Ordinal {
        self.current_ordinal
    }

    fn get_row_ranges_by_zone_map(
        &self,
        cond: Option<&dyn ColumnPredicate>,
        delete_cond: Option<&dyn ColumnPredicate>,
        row_ranges: &mut RowRanges,
    ) -> Result<()> {
        if self.reader.has_zone_map() {
            self.reader
                .get_row_ranges_by_zone_map(cond, delete_cond, row_ranges)?;
        }
        Ok(())
    }

    fn get_row_ranges_by_bloom_filter(
        &self,
        cond: &dyn ColumnPredicate,
        row_ranges: &mut RowRanges,
    ) -> Result<()> {
        if cond.can_do_bloom_filter() && self.reader.has_bloom_filter_index() {
            self.reader.get_row_ranges_by_bloom_filter(cond, row_ranges)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Array columns

/// Assembles array batches from the offsets, item and null-marker child
/// columns.
pub struct ArrayColumnIterator {
    reader: Arc<ColumnReader>,
    length_iterator: ScalarColumnIterator,
    item_iterator: Box<dyn ColumnIterator>,
    null_iterator: Option<Box<dyn ColumnIterator>>,
    current_ordinal: Ordinal,
}

impl ArrayColumnIterator {
    pub(crate) fn new(
        reader: Arc<ColumnReader>,
        length_iterator: ScalarColumnIterator,
        item_iterator: Box<dyn ColumnIterator>,
        null_iterator: Option<Box<dyn ColumnIterator>>,
    ) -> Self {
        Self {
            reader,
            length_iterator,
            item_iterator,
            null_iterator,
            current_ordinal: 0,
        }
    }

    /// Total item count of the `count` arrays before `ordinal`, read by
    /// scanning the length stream from the start. Leaves the length
    /// iterator positioned at `ordinal`.
    fn item_ordinal_of(&mut self, ordinal: Ordinal) -> Result<u64> {
        self.length_iterator.seek_to_ordinal(0)?;
        let mut scratch = ColumnVectorBatch::new_scalar(FieldType::UINT32, 1024, false)?;
        let mut total: u64 = 0;
        let mut left = ordinal;
        while left > 0 {
            let mut n = left.min(1024) as usize;
            let mut view = ColumnBlockView::new(&mut scratch, 0);
            let mut lengths_has_null = false;
            self.length_iterator
                .next_batch(&mut n, &mut view, &mut lengths_has_null)?;
            if n == 0 {
                return Err(corruption_err!(
                    "length stream ended {} arrays before ordinal {}",
                    left,
                    ordinal
                ));
            }
            let lengths = scratch.as_scalar()?;
            for i in 0..n {
                total += lengths.u32_at(i) as u64;
            }
            left -= n as u64;
        }
        Ok(total)
    }
}

impl ColumnIterator for ArrayColumnIterator {
    fn init(&mut self, opts: ColumnIteratorOptions) -> Result<()> {
        self.length_iterator.init(opts.clone())?;
        self.item_iterator.init(opts.clone())?;
        if let Some(null_iterator) = &mut self.null_iterator {
            null_iterator.init(opts)?;
        }
        Ok(())
    }

    fn seek_to_first(&mut self) -> Result<()> {
        self.length_iterator.seek_to_first()?;
        self.item_iterator.seek_to_first()?;
        if let Some(null_iterator) = &mut self.null_iterator {
            null_iterator.seek_to_first()?;
        }
        self.current_ordinal = 0;
        Ok(())
    }

    fn seek_to_ordinal(&mut self, ordinal: Ordinal) -> Result<()> {
        let item_ordinal = self.item_ordinal_of(ordinal)?;
        if item_ordinal > 0 {
            self.item_iterator.seek_to_ordinal(item_ordinal)?;
        } else {
            self.item_iterator.seek_to_first()?;
        }
        if let Some(null_iterator) = &mut self.null_iterator {
            null_iterator.seek_to_ordinal(ordinal)?;
        }
        self.current_ordinal = ordinal;
        Ok(())
    }

    fn next_batch(
        &mut self,
        n: &mut usize,
        dst: &mut ColumnBlockView<'_>,
        has_null: &mut bool,
    ) -> Result<()> {
        let base = dst.current_offset();
        {
            let array_batch = dst.batch_mut().as_array_mut()?;

            // 1. read n array lengths; the cursor into the offsets batch
            // sits one past the base entry, which anchors the offsets
            let mut lengths_has_null = false;
            {
                let mut offsets_view = ColumnBlockView::new(array_batch.offsets_mut(), base + 1);
                self.length_iterator
                    .next_batch(n, &mut offsets_view, &mut lengths_has_null)?;
            }
            if lengths_has_null {
                return Err(corruption_err!("array length stream contains nulls"));
            }
            if *n == 0 {
                return Ok(());
            }
            array_batch.put_offset_by_length(base, *n);

            // 2. read n null markers; whole arrays are null, not items
            if self.reader.is_nullable() {
                let null_iterator = self
                    .null_iterator
                    .as_mut()
                    .ok_or_else(|| internal_err!("nullable array column without a null child"))?;
                let null_signs = array_batch
                    .null_signs_mut()
                    .ok_or_else(|| internal_err!("nullable array column with a non-nullable batch"))?;
                let mut null_view = ColumnBlockView::new(null_signs, base);
                let mut size = *n;
                let mut marker_has_null = false;
                null_iterator.next_batch(&mut size, &mut null_view, &mut marker_has_null)?;
                if marker_has_null {
                    return Err(corruption_err!("array null-marker stream contains nulls"));
                }
                *has_null = true; // signals nullability, not per-batch presence
            } else {
                *has_null = false;
            }

            // 3. read the items; grow the item batch when this batch
            // overflows it, which forces offsets to rebuild from 0
            let item_count = array_batch.item_size(base, *n);
            let required = array_batch.item_offset(base + *n) as usize;
            let mut rebuild_from_zero = false;
            if array_batch.elements().capacity() < required {
                array_batch.elements_mut().resize(required);
                rebuild_from_zero = true;
            }

            let item_base = array_batch.item_offset(base) as usize;
            {
                let mut item_view = ColumnBlockView::new(array_batch.elements_mut(), item_base);
                let mut real_read = item_count as usize;
                let mut item_has_null = false;
                self.item_iterator
                    .next_batch(&mut real_read, &mut item_view, &mut item_has_null)?;
                if real_read as u64 != item_count {
                    return Err(corruption_err!(
                        "item stream produced {} of {} items",
                        real_read,
                        item_count
                    ));
                }
            }

            let (rebuild_start, rebuild_count) = if rebuild_from_zero {
                (0, base + *n)
            } else {
                (base, *n)
            };
            array_batch.prepare_for_read(rebuild_start, rebuild_count)?;
        }

        dst.advance(*n);
        self.current_ordinal += *n as u64;
        Ok(())
    }

    fn next_batch_vec(
        &mut self,
        _n: &mut usize,
        _dst: &mut dyn MutableColumn,
        _has_null: &mut bool,
    ) -> Result<()> {
        Err(unsupported_err!("vectorised reads of array columns"))
    }

    fn get_current_ordinal(&self) -> Ordinal {
        self.current_ordinal
    }
}

// ---------------------------------------------------------------------
// Default values for columns absent from the segment

/// Synthesizes a constant stream for a column that does not exist in the
/// segment (added after the segment was written).
pub struct DefaultValueIterator {
    has_default: bool,
    default_value: String,
    is_nullable: bool,
    schema_length: u32,
    type_info: &'static TypeInfo,

    value: Option<DefaultCell>,
    is_default_null: bool,
    current_ordinal: Ordinal,
}

enum DefaultCell {
    Fixed(Vec<u8>),
    Binary(Bytes),
}

impl DefaultValueIterator {
    pub fn new(
        type_info: &'static TypeInfo,
        has_default: bool,
        default_value: Option<String>,
        is_nullable: bool,
        schema_length: u32,
    ) -> Self {
        Self {
            has_default,
            default_value: default_value.unwrap_or_default(),
            is_nullable,
            schema_length,
            type_info,
            value: None,
            is_default_null: false,
            current_ordinal: 0,
        }
    }

    fn materialize(&mut self) -> Result<()> {
        if self.has_default {
            if self.default_value == "NULL" {
                if !self.is_nullable {
                    return Err(internal_err!(
                        "NULL default on a non-nullable {} column",
                        self.type_info.field_type()
                    ));
                }
                self.is_default_null = true;
                return Ok(());
            }
            let cell = match self.type_info.field_type() {
                FieldType::CHAR => {
                    // zero-padded to the schema length
                    let mut buf = vec![0u8; self.schema_length as usize];
                    let raw = self.default_value.as_bytes();
                    if raw.len() > buf.len() {
                        return Err(internal_err!(
                            "CHAR default of {} bytes exceeds schema length {}",
                            raw.len(),
                            self.schema_length
                        ));
                    }
                    buf[..raw.len()].copy_from_slice(raw);
                    DefaultCell::Binary(buf.into())
                }
                FieldType::VARCHAR | FieldType::STRING | FieldType::HLL | FieldType::OBJECT => {
                    DefaultCell::Binary(Bytes::copy_from_slice(self.default_value.as_bytes()))
                }
                FieldType::ARRAY => {
                    return Err(unsupported_err!("array default values"));
                }
                _ => {
                    let parsed = self.type_info.from_string(&self.default_value)?;
                    DefaultCell::Fixed(self.type_info.encode_fixed(&parsed)?)
                }
            };
            self.value = Some(cell);
            Ok(())
        } else if self.is_nullable {
            // no declared default: a nullable column reads as null
            self.is_default_null = true;
            Ok(())
        } else {
            Err(internal_err!(
                "no default value for a non-nullable column"
            ))
        }
    }

    fn value(&self) -> Result<&DefaultCell> {
        self.value
            .as_ref()
            .ok_or_else(|| internal_err!("default value iterator used before init"))
    }
}

impl ColumnIterator for DefaultValueIterator {
    fn init(&mut self, _opts: ColumnIteratorOptions) -> Result<()> {
        self.materialize()
    }

    fn seek_to_first(&mut self) -> Result<()> {
        self.current_ordinal = 0;
        Ok(())
    }

    fn seek_to_ordinal(&mut self, ordinal: Ordinal) -> Result<()> {
        self.current_ordinal = ordinal;
        Ok(())
    }

    fn next_batch(
        &mut self,
        n: &mut usize,
        dst: &mut ColumnBlockView<'_>,
        has_null: &mut bool,
    ) -> Result<()> {
        if dst.is_nullable() {
            dst.set_null_bits(*n, self.is_default_null);
        }
        if self.is_default_null {
            *has_null = true;
            dst.advance(*n);
        } else {
            *has_null = false;
            match self.value()? {
                DefaultCell::Fixed(cell) => {
                    let slots = dst.fixed_slice_mut(*n)?;
                    for chunk in slots.chunks_exact_mut(cell.len()) {
                        chunk.copy_from_slice(cell);
                    }
                }
                DefaultCell::Binary(cell) => {
                    for rel in 0..*n {
                        dst.set_binary(rel, cell.clone())?;
                    }
                }
            }
            dst.advance(*n);
        }
        self.current_ordinal += *n as u64;
        Ok(())
    }

    fn next_batch_vec(
        &mut self,
        n: &mut usize,
        dst: &mut dyn MutableColumn,
        has_null: &mut bool,
    ) -> Result<()> {
        if self.is_default_null {
            *has_null = true;
            dst.insert_many_defaults(*n);
        } else {
            *has_null = false;
            match self.value()? {
                DefaultCell::Fixed(cell) => {
                    for _ in 0..*n {
                        dst.insert_value(cell)?;
                    }
                }
                DefaultCell::Binary(cell) => {
                    for _ in 0..*n {
                        dst.insert_binary(cell.clone())?;
                    }
                }
            }
        }
        self.current_ordinal += *n as u64;
        Ok(())
    }

    fn get_current_ordinal(&self) -> Ordinal {
        self.current_ordinal
    }
}

// ---------------------------------------------------------------------
// Empty columns

/// No-op cursor for a column with zero rows.
#[derive(Default)]
pub struct EmptyColumnIterator {
    current_ordinal: Ordinal,
}

impl EmptyColumnIterator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ColumnIterator for EmptyColumnIterator {
    fn init(&mut self, _opts: ColumnIteratorOptions) -> Result<()> {
        Ok(())
    }

    fn seek_to_first(&mut self) -> Result<()> {
        Ok(())
    }

    fn seek_to_ordinal(&mut self, _ordinal: Ordinal) -> Result<()> {
        Ok(())
    }

    fn seek_to_page_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn next_batch(
        &mut self,
        n: &mut usize,
        _dst: &mut ColumnBlockView<'_>,
        has_null: &mut bool,
    ) -> Result<()> {
        *n = 0;
        *has_null = false;
        Ok(())
    }

    fn next_batch_vec(
        &mut self,
        n: &mut usize,
        _dst: &mut dyn MutableColumn,
        has_null: &mut bool,
    ) -> Result<()> {
        *n = 0;
        *has_null = false;
        Ok(())
    }

    fn get_current_ordinal(&self) -> Ordinal {
        self.current_ordinal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::FieldType;
    use crate::block::{MutableBinaryColumn, MutableFixedColumn};
    use crate::types::get_type_info;

    fn int_default(has_default: bool, value: Option<&str>, nullable: bool) -> DefaultValueIterator {
        DefaultValueIterator::new(
            get_type_info(FieldType::INT32).unwrap(),
            has_default,
            value.map(str::to_string),
            nullable,
            0,
        )
    }

    fn opts() -> ColumnIteratorOptions {
        use crate::segment::page_io::MemoryBlock;
        ColumnIteratorOptions::new(Arc::new(MemoryBlock::new(Bytes::new())))
    }

    #[test]
    fn test_default_value_fixed() {
        let mut iter = int_default(true, Some("42"), false);
        iter.init(opts()).unwrap();

        let mut batch = ColumnVectorBatch::new_scalar(FieldType::INT32, 4, false).unwrap();
        let mut view = ColumnBlockView::new(&mut batch, 0);
        let mut n = 4;
        let mut has_null = true;
        iter.next_batch(&mut n, &mut view, &mut has_null).unwrap();
        assert!(!has_null);
        assert_eq!(iter.get_current_ordinal(), 4);
        let scalar = batch.as_scalar().unwrap();
        for i in 0..4 {
            assert_eq!(scalar.fixed_at(i), 42i32.to_le_bytes());
        }
    }

    #[test]
    fn test_default_value_null_stream() {
        let mut iter = int_default(true, Some("NULL"), true);
        iter.init(opts()).unwrap();

        let mut col = MutableFixedColumn::new(4);
        let mut n = 3;
        let mut has_null = false;
        iter.next_batch_vec(&mut n, &mut col, &mut has_null).unwrap();
        assert!(has_null);
        assert_eq!(col.len(), 3);
        assert!(col.is_null_at(0) && col.is_null_at(2));
    }

    #[test]
    fn test_default_value_missing_default_nullable() {
        let mut iter = int_default(false, None, true);
        iter.init(opts()).unwrap();
        let mut col = MutableFixedColumn::new(4);
        let mut n = 2;
        let mut has_null = false;
        iter.next_batch_vec(&mut n, &mut col, &mut has_null).unwrap();
        assert!(has_null);
    }

    #[test]
    fn test_default_value_invalid_configs() {
        // NULL default on a non-nullable column
        assert!(int_default(true, Some("NULL"), false).init(opts()).is_err());
        // no default, not nullable
        assert!(int_default(false, None, false).init(opts()).is_err());
        // unparsable default
        assert!(int_default(true, Some("not-a-number"), false).init(opts()).is_err());
    }

    #[test]
    fn test_default_value_char_padding() {
        let mut iter = DefaultValueIterator::new(
            get_type_info(FieldType::CHAR).unwrap(),
            true,
            Some("ab".to_string()),
            false,
            4,
        );
        iter.init(opts()).unwrap();
        let mut col = MutableBinaryColumn::new();
        let mut n = 1;
        let mut has_null = false;
        iter.next_batch_vec(&mut n, &mut col, &mut has_null).unwrap();
        assert_eq!(col.value_at(0).unwrap().as_ref(), b"ab\0\0");
    }

    #[test]
    fn test_default_value_temporal_canonical_form() {
        let mut iter = DefaultValueIterator::new(
            get_type_info(FieldType::DATE).unwrap(),
            true,
            Some("1970-01-11".to_string()),
            false,
            0,
        );
        iter.init(opts()).unwrap();
        let mut col = MutableFixedColumn::new(4);
        let mut n = 1;
        let mut has_null = false;
        iter.next_batch_vec(&mut n, &mut col, &mut has_null).unwrap();
        assert_eq!(col.fixed_at(0), 10i32.to_le_bytes());
    }

    #[test]
    fn test_empty_iterator() {
        let mut iter = EmptyColumnIterator::new();
        iter.init(opts()).unwrap();
        iter.seek_to_first().unwrap();
        iter.seek_to_ordinal(12345).unwrap();
        let mut col = MutableFixedColumn::new(4);
        let mut n = 100;
        let mut has_null = true;
        iter.next_batch_vec(&mut n, &mut col, &mut has_null).unwrap();
        assert_eq!(n, 0);
        assert!(!has_null);
        assert_eq!(col.len(), 0);
    }

    #[test]
    fn test_default_value_decimal_canonical_form() {
        let mut iter = DefaultValueIterator::new(
            get_type_info(FieldType::DECIMAL).unwrap(),
            true,
            Some("2.5".to_string()),
            false,
            0,
        );
        iter.init(opts()).unwrap();
        let mut col = MutableFixedColumn::new(16);
        let mut n = 1;
        let mut has_null = false;
        iter.next_batch_vec(&mut n, &mut col, &mut has_null).unwrap();
        assert_eq!(col.fixed_at(0), 2_500_000_000i128.to_le_bytes());
    }
}
