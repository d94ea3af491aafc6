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

//! Column metadata as handed to the reader by the segment footer parser.
//!
//! The footer format itself is parsed elsewhere; the reader consumes
//! these plain structures.

use bytes::Bytes;

use crate::basic::{Compression, Encoding, FieldType};

/// Location of a page within the segment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePointer {
    pub offset: u64,
    pub size: u32,
}

impl PagePointer {
    pub fn new(offset: u64, size: u32) -> Self {
        Self { offset, size }
    }
}

/// Min/max summary of one page or one segment, with min and max kept in
/// their string form until a predicate needs them.
#[derive(Debug, Clone, Default)]
pub struct ZoneMap {
    pub min: Bytes,
    pub max: Bytes,
    pub has_null: bool,
    pub has_not_null: bool,
    /// Every row in the zone may match any predicate; skip evaluation.
    pub pass_all: bool,
}

/// Per-column index descriptors.
#[derive(Debug, Clone)]
pub enum ColumnIndexMeta {
    Ordinal {
        root_page: PagePointer,
    },
    ZoneMap {
        index_page: PagePointer,
        segment_zone_map: ZoneMap,
    },
    BloomFilter {
        index_page: PagePointer,
    },
    Bitmap {
        dict_page: PagePointer,
        bitmap_page: PagePointer,
    },
}

/// Immutable description of one column within a segment.
#[derive(Debug, Clone)]
pub struct ColumnMeta {
    pub column_id: u32,
    pub field_type: FieldType,
    /// Declared length for fixed-length types (CHAR), 0 otherwise.
    pub length: u32,
    pub encoding: Encoding,
    pub compression: Compression,
    pub is_nullable: bool,
    pub num_rows: u64,
    /// Dictionary page location for `Encoding::DICT` columns.
    pub dict_page: Option<PagePointer>,
    pub indexes: Vec<ColumnIndexMeta>,
    /// Child columns for composite types. Arrays: item, offsets, and a
    /// null-marker column iff nullable, in that order.
    pub children: Vec<ColumnMeta>,
}

impl ColumnMeta {
    /// A minimal scalar column description; indexes and flags are filled
    /// in by the caller.
    pub fn new_scalar(column_id: u32, field_type: FieldType, num_rows: u64) -> Self {
        Self {
            column_id,
            field_type,
            length: 0,
            encoding: if field_type.is_binary() {
                Encoding::BINARY_PLAIN
            } else {
                Encoding::PLAIN
            },
            compression: Compression::UNCOMPRESSED,
            is_nullable: false,
            num_rows,
            dict_page: None,
            indexes: Vec::new(),
            children: Vec::new(),
        }
    }
}
