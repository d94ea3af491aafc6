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

//! Page-level I/O: locating a page in a segment block, verifying its
//! checksum, parsing its footer and decompressing its body.
//!
//! On-disk page layout:
//!
//! ```text
//! | body (maybe compressed) | footer | footer length: u32 LE | crc32: u32 LE |
//! ```
//!
//! The checksum covers everything before it. The footer records the
//! uncompressed body size; a body whose stored size equals it was
//! written uncompressed regardless of the column codec.

use std::fs::File;
use std::os::unix::fs::FileExt;
use std::sync::atomic::{AtomicU64, Ordering};

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::basic::{Compression, Ordinal, PageType};
use crate::errors::Result;
use crate::segment::meta::PagePointer;

/// Random-access handle over a segment's bytes, shared by all readers of
/// the segment.
pub trait ReadableBlock: Send + Sync {
    /// Reads exactly `len` bytes at `offset`.
    fn read_at(&self, offset: u64, len: usize) -> Result<Bytes>;

    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory segment block.
#[derive(Debug, Clone)]
pub struct MemoryBlock {
    data: Bytes,
}

impl MemoryBlock {
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }
}

impl ReadableBlock for MemoryBlock {
    fn read_at(&self, offset: u64, len: usize) -> Result<Bytes> {
        let offset = offset as usize;
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| eof_err!("read of {} bytes at {} beyond block end {}", len, offset, self.data.len()))?;
        Ok(self.data.slice(offset..end))
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }
}

/// File-backed segment block using positioned reads.
#[derive(Debug)]
pub struct FileBlock {
    file: File,
    len: u64,
}

impl FileBlock {
    pub fn open(file: File) -> Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }
}

impl ReadableBlock for FileBlock {
    fn read_at(&self, offset: u64, len: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; len];
        self.file.read_exact_at(&mut buf, offset)?;
        Ok(buf.into())
    }

    fn len(&self) -> u64 {
        self.len
    }
}

/// Read-side counters, accumulated through the iterator options.
#[derive(Debug, Default)]
pub struct ReaderStats {
    /// Estimated decoded bytes handed to the caller.
    pub bytes_read: AtomicU64,
    /// Raw page bytes fetched from the block.
    pub compressed_bytes_read: AtomicU64,
    /// Number of page reads issued.
    pub pages_read: AtomicU64,
}

impl ReaderStats {
    pub fn add_bytes_read(&self, n: u64) {
        self.bytes_read.fetch_add(n, Ordering::Relaxed);
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    pub fn pages_read(&self) -> u64 {
        self.pages_read.load(Ordering::Relaxed)
    }
}

/// Footer of a data page: the ordinal range covered and the size of the
/// trailing null bitmap within the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPageFooter {
    pub first_ordinal: Ordinal,
    pub num_values: u32,
    /// Byte length of the RLE null bitmap at the end of the body; 0
    /// when the page has no nulls.
    pub nullmap_size: u32,
}

/// Parsed page footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFooter {
    Data(DataPageFooter),
    Dict { num_values: u32 },
    Index { num_entries: u32 },
}

impl PageFooter {
    pub fn page_type(&self) -> PageType {
        match self {
            PageFooter::Data(_) => PageType::DATA_PAGE,
            PageFooter::Dict { .. } => PageType::DICTIONARY_PAGE,
            PageFooter::Index { .. } => PageType::INDEX_PAGE,
        }
    }

    pub fn as_data(&self) -> Result<&DataPageFooter> {
        match self {
            PageFooter::Data(f) => Ok(f),
            _ => Err(corruption_err!("expected a data page, got {}", self.page_type())),
        }
    }

    pub(crate) fn serialize(&self, uncompressed_size: u32) -> Vec<u8> {
        let mut out = Vec::with_capacity(21);
        out.push(self.page_type().to_u8());
        out.extend_from_slice(&uncompressed_size.to_le_bytes());
        match self {
            PageFooter::Data(f) => {
                out.extend_from_slice(&f.first_ordinal.to_le_bytes());
                out.extend_from_slice(&f.num_values.to_le_bytes());
                out.extend_from_slice(&f.nullmap_size.to_le_bytes());
            }
            PageFooter::Dict { num_values } => out.extend_from_slice(&num_values.to_le_bytes()),
            PageFooter::Index { num_entries } => out.extend_from_slice(&num_entries.to_le_bytes()),
        }
        out
    }

    /// Parses a footer record, returning it with the recorded
    /// uncompressed body size.
    pub(crate) fn parse(buf: &[u8]) -> Result<(Self, u32)> {
        if buf.len() < 5 {
            return Err(corruption_err!("page footer too short: {} bytes", buf.len()));
        }
        let page_type = PageType::try_from_u8(buf[0])?;
        let uncompressed_size = LittleEndian::read_u32(&buf[1..5]);
        let rest = &buf[5..];
        let footer = match page_type {
            PageType::DATA_PAGE => {
                if rest.len() < 16 {
                    return Err(corruption_err!("data page footer too short"));
                }
                PageFooter::Data(DataPageFooter {
                    first_ordinal: LittleEndian::read_u64(&rest[0..8]),
                    num_values: LittleEndian::read_u32(&rest[8..12]),
                    nullmap_size: LittleEndian::read_u32(&rest[12..16]),
                })
            }
            PageType::DICTIONARY_PAGE => {
                if rest.len() < 4 {
                    return Err(corruption_err!("dictionary page footer too short"));
                }
                PageFooter::Dict {
                    num_values: LittleEndian::read_u32(&rest[0..4]),
                }
            }
            PageType::INDEX_PAGE => {
                if rest.len() < 4 {
                    return Err(corruption_err!("index page footer too short"));
                }
                PageFooter::Index {
                    num_entries: LittleEndian::read_u32(&rest[0..4]),
                }
            }
        };
        Ok((footer, uncompressed_size))
    }
}

/// Owner of a page's decompressed body.
///
/// Stands in for a page-cache entry: cloning the handle shares the
/// buffer, and dropping the last clone releases it.
#[derive(Debug, Clone)]
pub struct PageHandle {
    data: Bytes,
}

impl PageHandle {
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// Options for a single page read.
pub struct PageReadOptions<'a> {
    pub block: &'a dyn ReadableBlock,
    pub page_pointer: PagePointer,
    pub codec: Compression,
    pub verify_checksum: bool,
    /// Page-cache hints; carried through for the cache layer.
    pub use_page_cache: bool,
    pub kept_in_memory: bool,
    pub page_type: PageType,
    pub stats: Option<&'a ReaderStats>,
}

const PAGE_SUFFIX_SIZE: usize = 8; // footer length + checksum

/// Reads a page, verifies its checksum, parses the footer and
/// decompresses the body.
pub fn read_and_decompress_page(
    opts: &PageReadOptions<'_>,
) -> Result<(PageHandle, Bytes, PageFooter)> {
    let pp = opts.page_pointer;
    let page = opts.block.read_at(pp.offset, pp.size as usize)?;
    if let Some(stats) = opts.stats {
        stats.compressed_bytes_read.fetch_add(pp.size as u64, Ordering::Relaxed);
        stats.pages_read.fetch_add(1, Ordering::Relaxed);
    }
    if page.len() < PAGE_SUFFIX_SIZE {
        return Err(corruption_err!("page of {} bytes is too short", page.len()));
    }

    if opts.verify_checksum {
        let expected = LittleEndian::read_u32(&page[page.len() - 4..]);
        let actual = crc32fast::hash(&page[..page.len() - 4]);
        if expected != actual {
            return Err(corruption_err!(
                "page checksum mismatch at offset {}: expected {:#010x}, got {:#010x}",
                pp.offset,
                expected,
                actual
            ));
        }
    }

    let footer_len = LittleEndian::read_u32(&page[page.len() - 8..page.len() - 4]) as usize;
    let body_end = page
        .len()
        .checked_sub(PAGE_SUFFIX_SIZE + footer_len)
        .ok_or_else(|| corruption_err!("page footer length {} overflows the page", footer_len))?;
    let (footer, uncompressed_size) =
        PageFooter::parse(&page[body_end..page.len() - PAGE_SUFFIX_SIZE])?;
    if footer.page_type() != opts.page_type {
        return Err(corruption_err!(
            "expected a {} page, found {}",
            opts.page_type,
            footer.page_type()
        ));
    }

    let stored_body = page.slice(..body_end);
    let body = if stored_body.len() == uncompressed_size as usize {
        // written without compression, codec notwithstanding
        stored_body
    } else {
        let decompressed = decompress(opts.codec, &stored_body)?;
        if decompressed.len() != uncompressed_size as usize {
            return Err(corruption_err!(
                "decompressed page size {} does not match footer size {}",
                decompressed.len(),
                uncompressed_size
            ));
        }
        decompressed
    };

    let handle = PageHandle { data: body.clone() };
    Ok((handle, body, footer))
}

fn decompress(codec: Compression, input: &[u8]) -> Result<Bytes> {
    match codec {
        Compression::UNCOMPRESSED => Err(corruption_err!(
            "page body size mismatch on an uncompressed column"
        )),
        Compression::LZ4 => {
            let out = lz4_flex::block::decompress_size_prepended(input)
                .map_err(|e| corruption_err!("lz4 decompress failed: {}", e))?;
            Ok(out.into())
        }
        Compression::SNAPPY => {
            let mut decoder = snap::raw::Decoder::new();
            let out = decoder.decompress_vec(input)?;
            Ok(out.into())
        }
    }
}

/// Compresses a page body with `codec`, returning `None` when the codec
/// is a no-op. Used by index writers and the test segment builder.
pub fn compress(codec: Compression, input: &[u8]) -> Result<Option<Vec<u8>>> {
    match codec {
        Compression::UNCOMPRESSED => Ok(None),
        Compression::LZ4 => Ok(Some(lz4_flex::block::compress_prepend_size(input))),
        Compression::SNAPPY => {
            let mut encoder = snap::raw::Encoder::new();
            Ok(Some(encoder.compress_vec(input)?))
        }
    }
}

/// Serializes a page: compresses the body when beneficial, appends the
/// footer, its length and the checksum. Counterpart of
/// [`read_and_decompress_page`].
pub fn build_page(codec: Compression, body: &[u8], footer: &PageFooter) -> Result<Vec<u8>> {
    let compressed = compress(codec, body)?;
    let stored: &[u8] = match &compressed {
        // keep the raw body when compression does not shrink it; the
        // reader detects this by comparing sizes
        Some(c) if c.len() < body.len() => c.as_slice(),
        _ => body,
    };
    let footer_bytes = footer.serialize(body.len() as u32);
    let mut page = Vec::with_capacity(stored.len() + footer_bytes.len() + PAGE_SUFFIX_SIZE);
    page.extend_from_slice(stored);
    page.extend_from_slice(&footer_bytes);
    page.extend_from_slice(&(footer_bytes.len() as u32).to_le_bytes());
    page.extend_from_slice(&crc32fast::hash(&page).to_le_bytes());
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn data_footer(first_ordinal: u64, num_values: u32) -> PageFooter {
        PageFooter::Data(DataPageFooter {
            first_ordinal,
            num_values,
            nullmap_size: 0,
        })
    }

    fn read_opts<'a>(
        block: &'a dyn ReadableBlock,
        pp: PagePointer,
        codec: Compression,
    ) -> PageReadOptions<'a> {
        PageReadOptions {
            block,
            page_pointer: pp,
            codec,
            verify_checksum: true,
            use_page_cache: false,
            kept_in_memory: false,
            page_type: PageType::DATA_PAGE,
            stats: None,
        }
    }

    #[test]
    fn test_page_roundtrip_uncompressed() {
        let body = b"0123456789abcdef".to_vec();
        let page = build_page(Compression::UNCOMPRESSED, &body, &data_footer(7, 4)).unwrap();
        let block = MemoryBlock::new(page.clone().into());
        let pp = PagePointer::new(0, page.len() as u32);

        let (handle, out_body, footer) =
            read_and_decompress_page(&read_opts(&block, pp, Compression::UNCOMPRESSED)).unwrap();
        assert_eq!(out_body.as_ref(), body.as_slice());
        assert_eq!(handle.data().as_ref(), body.as_slice());
        assert_eq!(footer, data_footer(7, 4));
    }

    #[test]
    fn test_page_roundtrip_compressed() {
        for codec in [Compression::LZ4, Compression::SNAPPY] {
            // compressible body
            let body = vec![42u8; 4096];
            let page = build_page(codec, &body, &data_footer(0, 1024)).unwrap();
            assert!(page.len() < body.len());
            let block = MemoryBlock::new(page.clone().into());
            let pp = PagePointer::new(0, page.len() as u32);

            let (_, out_body, _) =
                read_and_decompress_page(&read_opts(&block, pp, codec)).unwrap();
            assert_eq!(out_body.as_ref(), body.as_slice(), "codec {codec}");
        }
    }

    #[test]
    fn test_incompressible_body_stored_raw() {
        // tiny bodies grow under lz4's length prefix; writer keeps them raw
        let body = b"zx".to_vec();
        let page = build_page(Compression::LZ4, &body, &data_footer(0, 1)).unwrap();
        let block = MemoryBlock::new(page.clone().into());
        let pp = PagePointer::new(0, page.len() as u32);
        let (_, out_body, _) =
            read_and_decompress_page(&read_opts(&block, pp, Compression::LZ4)).unwrap();
        assert_eq!(out_body.as_ref(), body.as_slice());
    }

    #[test]
    fn test_checksum_mismatch() {
        let body = b"payload".to_vec();
        let mut page = build_page(Compression::UNCOMPRESSED, &body, &data_footer(0, 1)).unwrap();
        page[0] ^= 0xff;
        let pp = PagePointer::new(0, page.len() as u32);
        let block = MemoryBlock::new(page.into());

        let err = read_and_decompress_page(&read_opts(&block, pp, Compression::UNCOMPRESSED))
            .unwrap_err();
        assert!(err.to_string().contains("checksum"), "{err}");

        // without verification the corrupt body is surfaced as-is
        let mut opts = read_opts(&block, pp, Compression::UNCOMPRESSED);
        opts.verify_checksum = false;
        assert!(read_and_decompress_page(&opts).is_ok());
    }

    #[test]
    fn test_wrong_page_type() {
        let body = b"dict".to_vec();
        let page =
            build_page(Compression::UNCOMPRESSED, &body, &PageFooter::Dict { num_values: 1 })
                .unwrap();
        let pp = PagePointer::new(0, page.len() as u32);
        let block = MemoryBlock::new(page.into());
        let err = read_and_decompress_page(&read_opts(&block, pp, Compression::UNCOMPRESSED))
            .unwrap_err();
        assert!(err.to_string().contains("expected a DATA_PAGE"), "{err}");
    }

    #[test]
    fn test_short_read_is_eof() {
        let block = MemoryBlock::new(Bytes::from_static(b"tiny"));
        let err = block.read_at(0, 100).unwrap_err();
        assert!(err.to_string().starts_with("EOF"), "{err}");
    }

    #[test]
    fn test_file_block() {
        let body = b"file backed".to_vec();
        let page = build_page(Compression::UNCOMPRESSED, &body, &data_footer(3, 2)).unwrap();
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&page).unwrap();
        tmp.flush().unwrap();

        let block = FileBlock::open(tmp.reopen().unwrap()).unwrap();
        assert_eq!(block.len(), page.len() as u64);
        let pp = PagePointer::new(0, page.len() as u32);
        let (_, out_body, footer) =
            read_and_decompress_page(&read_opts(&block, pp, Compression::UNCOMPRESSED)).unwrap();
        assert_eq!(out_body.as_ref(), body.as_slice());
        assert_eq!(footer, data_footer(3, 2));
    }

    #[test]
    fn test_stats_accumulate() {
        let body = vec![1u8; 64];
        let page = build_page(Compression::UNCOMPRESSED, &body, &data_footer(0, 16)).unwrap();
        let block = MemoryBlock::new(page.clone().into());
        let pp = PagePointer::new(0, page.len() as u32);
        let stats = ReaderStats::default();
        let mut opts = read_opts(&block, pp, Compression::UNCOMPRESSED);
        opts.stats = Some(&stats);
        read_and_decompress_page(&opts).unwrap();
        read_and_decompress_page(&opts).unwrap();
        assert_eq!(stats.pages_read(), 2);
        assert_eq!(
            stats.compressed_bytes_read.load(Ordering::Relaxed),
            2 * page.len() as u64
        );
    }
}
