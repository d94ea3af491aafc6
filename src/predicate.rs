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

//! The contract between the reader and the query-side condition
//! evaluator. The reader never interprets predicates itself; it only
//! hands them zone-map bounds and bloom filters and acts on the verdict.

use crate::index::bloom_filter::BloomFilter;
use crate::types::CellValue;

/// Zone-map bounds for one page or one segment. `min` is null when the
/// zone contains nulls (null sorts low); both are null when the zone
/// holds nothing but nulls.
#[derive(Debug, Clone, Copy)]
pub struct Bounds<'a> {
    pub min: &'a CellValue,
    pub max: &'a CellValue,
}

/// Verdict of evaluating a delete predicate against a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelState {
    /// Every row in the zone is deleted; the zone can be dropped.
    Satisfied,
    /// Some rows in the zone may be deleted.
    PartialSatisfied,
    /// No row in the zone is deleted.
    NotSatisfied,
}

/// A column-level predicate as seen by the reader.
///
/// Implementations must be conservative: `eval_bounds` may only return
/// `false` when no value in `[min, max]` can satisfy the predicate, and
/// `eval_bloom_filter` may only return `false` when no probed value is in
/// the filter.
pub trait ColumnPredicate {
    /// Can any row within `bounds` match?
    fn eval_bounds(&self, bounds: &Bounds<'_>) -> bool;

    /// Delete-predicate verdict for `bounds`.
    fn del_eval(&self, bounds: &Bounds<'_>) -> DelState {
        let _ = bounds;
        DelState::NotSatisfied
    }

    /// Can any row in the page guarded by `bf` match?
    fn eval_bloom_filter(&self, bf: &BloomFilter) -> bool {
        let _ = bf;
        true
    }

    /// Whether this predicate is a membership test a bloom filter can
    /// answer (equality / IN).
    fn can_do_bloom_filter(&self) -> bool {
        false
    }
}
