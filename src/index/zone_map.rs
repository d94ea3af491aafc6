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

//! The zone-map index: one min/max summary per data page.
//!
//! Index page body: `num_entries` records of
//! `| flags: u8 | min len: u32 | min | max len: u32 | max |`
//! with flag bits 0/1/2 for `has_null` / `has_not_null` / `pass_all`.

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::basic::{Compression, PageType};
use crate::errors::Result;
use crate::segment::meta::{PagePointer, ZoneMap};
use crate::segment::page_io::{read_and_decompress_page, PageFooter, PageReadOptions, ReadableBlock};

const FLAG_HAS_NULL: u8 = 1;
const FLAG_HAS_NOT_NULL: u8 = 2;
const FLAG_PASS_ALL: u8 = 4;

/// Parsed zone-map index of one column.
#[derive(Debug)]
pub struct ZoneMapIndexReader {
    page_zone_maps: Vec<ZoneMap>,
}

impl ZoneMapIndexReader {
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
        let mut page_zone_maps = Vec::with_capacity(num_entries);
        let mut pos = 0;
        for _ in 0..num_entries {
            let (zone_map, consumed) = parse_zone_map(&body, pos)?;
            page_zone_maps.push(zone_map);
            pos += consumed;
        }
        if pos != body.len() {
            return Err(corruption_err!(
                "zone map index has {} trailing bytes",
                body.len() - pos
            ));
        }
        Ok(Self { page_zone_maps })
    }

    pub fn num_pages(&self) -> usize {
        self.page_zone_maps.len()
    }

    pub fn page_zone_maps(&self) -> &[ZoneMap] {
        &self.page_zone_maps
    }
}

fn parse_zone_map(body: &Bytes, pos: usize) -> Result<(ZoneMap, usize)> {
    let short = || corruption_err!("zone map record truncated at byte {}", pos);
    let flags = *body.get(pos).ok_or_else(short)?;
    let mut cursor = pos + 1;
    let mut read_bytes = |body: &Bytes| -> Result<Bytes> {
        if cursor + 4 > body.len() {
            return Err(short());
        }
        let len = LittleEndian::read_u32(&body[cursor..cursor + 4]) as usize;
        cursor += 4;
        if cursor + len > body.len() {
            return Err(short());
        }
        let out = body.slice(cursor..cursor + len);
        cursor += len;
        Ok(out)
    };
    let min = read_bytes(body)?;
    let max = read_bytes(body)?;
    Ok((
        ZoneMap {
            min,
            max,
            has_null: flags & FLAG_HAS_NULL != 0,
            has_not_null: flags & FLAG_HAS_NOT_NULL != 0,
            pass_all: flags & FLAG_PASS_ALL != 0,
        },
        cursor - pos,
    ))
}

/// Serializes zone maps into an index page body; the load counterpart is
/// [`ZoneMapIndexReader::load`].
pub fn serialize_zone_maps(zone_maps: &[ZoneMap]) -> Vec<u8> {
    let mut out = Vec::new();
    for zm in zone_maps {
        let mut flags = 0u8;
        if zm.has_null {
            flags |= FLAG_HAS_NULL;
        }
        if zm.has_not_null {
            flags |= FLAG_HAS_NOT_NULL;
        }
        if zm.pass_all {
            flags |= FLAG_PASS_ALL;
        }
        out.push(flags);
        out.extend_from_slice(&(zm.min.len() as u32).to_le_bytes());
        out.extend_from_slice(&zm.min);
        out.extend_from_slice(&(zm.max.len() as u32).to_le_bytes());
        out.extend_from_slice(&zm.max);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::page_io::{build_page, MemoryBlock};

    fn zm(min: &str, max: &str) -> ZoneMap {
        ZoneMap {
            min: Bytes::copy_from_slice(min.as_bytes()),
            max: Bytes::copy_from_slice(max.as_bytes()),
            has_null: false,
            has_not_null: true,
            pass_all: false,
        }
    }

    #[test]
    fn test_roundtrip() {
        let mut empty = ZoneMap::default();
        empty.has_null = false;
        empty.has_not_null = false;
        let mut pass_all = ZoneMap::default();
        pass_all.pass_all = true;
        pass_all.has_not_null = true;
        let maps = vec![zm("1", "10"), pass_all, zm("21", "30"), empty];

        let body = serialize_zone_maps(&maps);
        let page = build_page(
            Compression::LZ4,
            &body,
            &PageFooter::Index {
                num_entries: maps.len() as u32,
            },
        )
        .unwrap();
        let pp = PagePointer::new(0, page.len() as u32);
        let block = MemoryBlock::new(page.into());
        let reader =
            ZoneMapIndexReader::load(&block, pp, Compression::LZ4, true).unwrap();

        assert_eq!(reader.num_pages(), 4);
        let out = reader.page_zone_maps();
        assert_eq!(out[0].min.as_ref(), b"1");
        assert_eq!(out[0].max.as_ref(), b"10");
        assert!(out[0].has_not_null && !out[0].has_null && !out[0].pass_all);
        assert!(out[1].pass_all);
        assert_eq!(out[2].max.as_ref(), b"30");
        assert!(!out[3].has_null && !out[3].has_not_null);
    }

    #[test]
    fn test_truncated_record_rejected() {
        let body = serialize_zone_maps(&[zm("1", "2")]);
        let page = build_page(
            Compression::UNCOMPRESSED,
            &body[..body.len() - 1],
            &PageFooter::Index { num_entries: 1 },
        )
        .unwrap();
        let pp = PagePointer::new(0, page.len() as u32);
        let block = MemoryBlock::new(page.into());
        assert!(ZoneMapIndexReader::load(&block, pp, Compression::UNCOMPRESSED, true).is_err());
    }
}
