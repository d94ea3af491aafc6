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

//! The per-column read engine: the [`reader::ColumnReader`] handle and
//! the [`iterator::ColumnIterator`] cursors it produces.

pub mod iterator;
pub mod reader;

use std::sync::Arc;

use crate::segment::page_io::{ReadableBlock, ReaderStats};

/// Configuration shared by every iterator and index load of a
/// [`reader::ColumnReader`].
#[derive(Clone)]
pub struct ColumnReaderOptions {
    /// The segment's bytes; index loads read through this handle.
    pub block: Arc<dyn ReadableBlock>,
    pub verify_checksum: bool,
    /// Page-cache hint for pages read on behalf of this reader.
    pub kept_in_memory: bool,
}

impl ColumnReaderOptions {
    pub fn new(block: Arc<dyn ReadableBlock>) -> Self {
        Self {
            block,
            verify_checksum: true,
            kept_in_memory: false,
        }
    }
}

/// Per-iterator options: the block handle data pages are read through,
/// the stats sink, and page-cache hints.
#[derive(Clone)]
pub struct ColumnIteratorOptions {
    pub block: Arc<dyn ReadableBlock>,
    pub stats: Arc<ReaderStats>,
    pub use_page_cache: bool,
}

impl ColumnIteratorOptions {
    pub fn new(block: Arc<dyn ReadableBlock>) -> Self {
        Self {
            block,
            stats: Arc::new(ReaderStats::default()),
            use_page_cache: false,
        }
    }
}
