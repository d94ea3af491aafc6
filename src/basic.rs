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

//! Contains basic enums that mirror the segment file format definitions:
//! field types, value encodings, page compression, page types and column
//! index types.

use crate::errors::{Result, SegmentError};

/// Dense row identifier within a column, in `[0, num_rows)`.
pub type Ordinal = u64;

/// Logical field type of a column as recorded in the column metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum FieldType {
    BOOLEAN,
    INT8,
    INT16,
    INT32,
    INT64,
    UINT32,
    UINT64,
    FLOAT,
    DOUBLE,
    DATE,
    DATETIME,
    DECIMAL,
    CHAR,
    VARCHAR,
    STRING,
    HLL,
    OBJECT,
    ARRAY,
}

impl FieldType {
    /// Scalar types are stored as a single stream of encoded pages;
    /// composite types are assembled from child columns.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldType::ARRAY)
    }

    /// Types whose values are variable-length byte strings.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            FieldType::CHAR
                | FieldType::VARCHAR
                | FieldType::STRING
                | FieldType::HLL
                | FieldType::OBJECT
        )
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Value encoding of a column's data pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Encoding {
    /// Fixed-stride raw little-endian values.
    PLAIN,
    /// Length-delimited byte strings with an offset array.
    BINARY_PLAIN,
    /// Dictionary codewords referencing a per-column dictionary page.
    /// Individual pages may fall back to `BINARY_PLAIN` when the
    /// dictionary overflows during write.
    DICT,
    /// RLE/bit-packed hybrid, used for boolean streams.
    RLE,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Block compression applied to page bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Compression {
    /// No compression.
    UNCOMPRESSED,
    /// [LZ4 compression](https://lz4.org/), block format with a length prefix.
    LZ4,
    /// [Snappy compression](https://en.wikipedia.org/wiki/Snappy_(compression)), raw format.
    SNAPPY,
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Discriminates what a page holds; recorded in the page footer and used
/// as a read hint for the page cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum PageType {
    DATA_PAGE,
    INDEX_PAGE,
    DICTIONARY_PAGE,
}

impl PageType {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            PageType::DATA_PAGE => 1,
            PageType::INDEX_PAGE => 2,
            PageType::DICTIONARY_PAGE => 3,
        }
    }

    pub(crate) fn try_from_u8(v: u8) -> Result<Self> {
        match v {
            1 => Ok(PageType::DATA_PAGE),
            2 => Ok(PageType::INDEX_PAGE),
            3 => Ok(PageType::DICTIONARY_PAGE),
            _ => Err(SegmentError::Corruption(format!("invalid page type {v}"))),
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Column index kinds a segment may carry for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum IndexType {
    ORDINAL_INDEX,
    ZONE_MAP_INDEX,
    BITMAP_INDEX,
    BLOOM_FILTER_INDEX,
}

impl std::fmt::Display for IndexType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_predicates() {
        assert!(FieldType::INT32.is_scalar());
        assert!(!FieldType::ARRAY.is_scalar());
        assert!(FieldType::VARCHAR.is_binary());
        assert!(FieldType::HLL.is_binary());
        assert!(!FieldType::INT64.is_binary());
    }

    #[test]
    fn test_page_type_roundtrip() {
        for t in [
            PageType::DATA_PAGE,
            PageType::INDEX_PAGE,
            PageType::DICTIONARY_PAGE,
        ] {
            assert_eq!(PageType::try_from_u8(t.to_u8()).unwrap(), t);
        }
        assert!(PageType::try_from_u8(9).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldType::VARCHAR.to_string(), "VARCHAR");
        assert_eq!(Compression::LZ4.to_string(), "LZ4");
        assert_eq!(Encoding::BINARY_PLAIN.to_string(), "BINARY_PLAIN");
    }
}
