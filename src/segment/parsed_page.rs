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

//! In-memory decoded view of one data page.

use bytes::Bytes;

use crate::basic::Ordinal;
use crate::encodings::rle::RleDecoder;
use crate::encodings::{EncodingInfo, PageDecoder};
use crate::errors::Result;
use crate::segment::meta::PagePointer;
use crate::segment::page_io::{DataPageFooter, PageHandle};
use crate::types::TypeInfo;

/// Null path of a page: either the page is dense (no null bitmap was
/// written) or it interleaves a null bitmap with the value stream. The
/// decoder is only meaningful in the latter case.
pub enum PageNulls {
    Dense,
    Nullable {
        /// Raw RLE bitmap bytes, kept to rewind the decoder on backward
        /// seeks.
        bitmap: Bytes,
        decoder: RleDecoder,
    },
}

/// A decoded page positioned by the column iterator.
///
/// Invariants:
/// * `offset_in_page == num_rows` iff the page is exhausted;
/// * with nulls, the null decoder's logical position equals
///   `offset_in_page` and the value decoder's position equals
///   `offset_in_page` minus the nulls passed so far.
///
/// The page owns its decompressed buffer through `handle`; the decoders
/// slice into that buffer.
pub struct ParsedPage {
    #[allow(dead_code)]
    handle: PageHandle,
    pub(crate) data_decoder: Box<dyn PageDecoder>,
    pub(crate) nulls: PageNulls,
    pub(crate) first_ordinal: Ordinal,
    pub(crate) num_rows: u64,
    /// Logical row position of the iterator within the page.
    pub(crate) offset_in_page: u64,
    pub(crate) page_pointer: PagePointer,
    pub(crate) page_index: usize,
}

impl ParsedPage {
    /// Splits a data page body into its value stream and null bitmap and
    /// builds the decoders over them.
    pub fn create(
        handle: PageHandle,
        body: Bytes,
        footer: &DataPageFooter,
        encoding_info: &'static EncodingInfo,
        type_info: &'static TypeInfo,
        page_pointer: PagePointer,
        page_index: usize,
    ) -> Result<ParsedPage> {
        let nullmap_size = footer.nullmap_size as usize;
        let values_end = body
            .len()
            .checked_sub(nullmap_size)
            .ok_or_else(|| corruption_err!("null bitmap of {} bytes overflows the page body", nullmap_size))?;
        let data_decoder =
            encoding_info.create_page_decoder(body.slice(..values_end), type_info)?;
        let nulls = if nullmap_size > 0 {
            let bitmap = body.slice(values_end..);
            let decoder = RleDecoder::new(bitmap.clone());
            PageNulls::Nullable { bitmap, decoder }
        } else {
            PageNulls::Dense
        };
        Ok(ParsedPage {
            handle,
            data_decoder,
            nulls,
            first_ordinal: footer.first_ordinal,
            num_rows: footer.num_values as u64,
            offset_in_page: 0,
            page_pointer,
            page_index,
        })
    }

    pub fn has_null(&self) -> bool {
        matches!(self.nulls, PageNulls::Nullable { .. })
    }

    pub fn has_remaining(&self) -> bool {
        self.offset_in_page < self.num_rows
    }

    pub fn remaining(&self) -> u64 {
        self.num_rows - self.offset_in_page
    }

    pub fn contains(&self, ordinal: Ordinal) -> bool {
        ordinal >= self.first_ordinal && ordinal < self.first_ordinal + self.num_rows
    }

    /// Resets the null decoder to the start of the bitmap. No-op for
    /// dense pages.
    pub(crate) fn rewind_nulls(&mut self) {
        if let PageNulls::Nullable { bitmap, decoder } = &mut self.nulls {
            *decoder = RleDecoder::new(bitmap.clone());
        }
    }
}
