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

//! Read-side column reader core for immutable columnar segment files.
//!
//! A *segment* is a self-describing file holding one or more columns,
//! each encoded as a stream of compressed, checksummed pages plus
//! auxiliary indices. This crate is the engine that, given a segment
//! block and a column's metadata, exposes ordinal-addressable batched
//! access to decoded values while pushing predicates down to the
//! per-page indices.
//!
//! # Overview
//!
//! The entry point is [`column::reader::ColumnReader`]:
//!
//! * build one from [`segment::meta::ColumnMeta`] with
//!   [`ColumnReader::create`](column::reader::ColumnReader::create);
//! * optionally narrow the scan with
//!   [`get_row_ranges_by_zone_map`](column::reader::ColumnReader::get_row_ranges_by_zone_map)
//!   and
//!   [`get_row_ranges_by_bloom_filter`](column::reader::ColumnReader::get_row_ranges_by_bloom_filter);
//! * create a cursor with
//!   [`new_iterator`](column::reader::ColumnReader::new_iterator), seek
//!   it, and pull batches into a caller-provided
//!   [`block::ColumnVectorBatch`] until exhaustion.
//!
//! Scalar columns decode through a typed page decoder interleaved with a
//! run-length-encoded null bitmap; array columns are assembled from
//! item, offsets and null-marker child columns; columns absent from the
//! segment read as a constant default stream
//! ([`column::iterator::DefaultValueIterator`]).
//!
//! Segments are immutable: a reader is shared-readable across threads,
//! while each iterator is a single-threaded cursor.

#[macro_use]
pub mod errors;

pub mod basic;
pub mod block;
pub mod column;
pub mod encodings;
pub mod index;
pub mod predicate;
pub mod row_ranges;
pub mod segment;
pub mod types;
pub mod util;
