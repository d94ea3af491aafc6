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

//! [`RowRanges`] is an ordered set of half-open ordinal intervals used to
//! carry predicate pushdown results.
//!
//! A `RowRanges` maintains the following invariants:
//!
//! * It contains no empty range
//! * Ranges are sorted by `from` and never overlap or touch

use crate::basic::Ordinal;

/// A half-open interval `[from, to)` of ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub from: Ordinal,
    pub to: Ordinal,
}

impl RowRange {
    pub fn new(from: Ordinal, to: Ordinal) -> Self {
        Self { from, to }
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }
}

/// Ordered set of non-overlapping [`RowRange`]s, closed under union and
/// intersection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRanges {
    ranges: Vec<RowRange>,
}

impl RowRanges {
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// A single interval `[from, to)`.
    pub fn create_single(from: Ordinal, to: Ordinal) -> Self {
        let mut ranges = Self::default();
        ranges.add(RowRange::new(from, to));
        ranges
    }

    /// The full ordinal range of a column with `num_rows` rows.
    pub fn create_full(num_rows: u64) -> Self {
        Self::create_single(0, num_rows)
    }

    /// Adds a range, merging it with any ranges it overlaps or touches.
    pub fn add(&mut self, range: RowRange) {
        if range.is_empty() {
            return;
        }
        // position of the first range with from > range.from
        let idx = self.ranges.partition_point(|r| r.from <= range.from);
        let mut merged = range;
        let mut start = idx;
        if idx > 0 && self.ranges[idx - 1].to >= range.from {
            start = idx - 1;
            merged.from = self.ranges[start].from;
            merged.to = merged.to.max(self.ranges[start].to);
        }
        let mut end = start;
        while end < self.ranges.len() && self.ranges[end].from <= merged.to {
            merged.to = merged.to.max(self.ranges[end].to);
            end += 1;
        }
        self.ranges.splice(start..end, std::iter::once(merged));
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of disjoint ranges.
    pub fn range_size(&self) -> usize {
        self.ranges.len()
    }

    pub fn get_range_from(&self, i: usize) -> Ordinal {
        self.ranges[i].from
    }

    pub fn get_range_to(&self, i: usize) -> Ordinal {
        self.ranges[i].to
    }

    /// Total number of ordinals covered.
    pub fn count(&self) -> u64 {
        self.ranges.iter().map(|r| r.to - r.from).sum()
    }

    pub fn contains(&self, ordinal: Ordinal) -> bool {
        let idx = self.ranges.partition_point(|r| r.from <= ordinal);
        idx > 0 && ordinal < self.ranges[idx - 1].to
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowRange> {
        self.ranges.iter()
    }

    /// `out = a ∪ b`. `out` may alias `a` or `b`.
    pub fn ranges_union(a: &RowRanges, b: &RowRanges, out: &mut RowRanges) {
        let mut result = a.clone();
        for r in &b.ranges {
            result.add(*r);
        }
        *out = result;
    }

    /// `out = a ∩ b`. `out` may alias `a` or `b`.
    pub fn ranges_intersection(a: &RowRanges, b: &RowRanges, out: &mut RowRanges) {
        let mut result = RowRanges::default();
        let (mut i, mut j) = (0, 0);
        while i < a.ranges.len() && j < b.ranges.len() {
            let x = a.ranges[i];
            let y = b.ranges[j];
            let from = x.from.max(y.from);
            let to = x.to.min(y.to);
            if from < to {
                result.add(RowRange::new(from, to));
            }
            if x.to <= y.to {
                i += 1;
            } else {
                j += 1;
            }
        }
        *out = result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(v: &[(u64, u64)]) -> RowRanges {
        let mut r = RowRanges::new_empty();
        for &(from, to) in v {
            r.add(RowRange::new(from, to));
        }
        r
    }

    #[test]
    fn test_add_merges_overlapping() {
        let r = ranges(&[(0, 10), (5, 15), (20, 30)]);
        assert_eq!(r.range_size(), 2);
        assert_eq!((r.get_range_from(0), r.get_range_to(0)), (0, 15));
        assert_eq!((r.get_range_from(1), r.get_range_to(1)), (20, 30));
        assert_eq!(r.count(), 25);
    }

    #[test]
    fn test_add_merges_touching() {
        let r = ranges(&[(0, 10), (10, 20)]);
        assert_eq!(r.range_size(), 1);
        assert_eq!(r.count(), 20);
    }

    #[test]
    fn test_add_out_of_order() {
        let r = ranges(&[(20, 30), (0, 5), (8, 12)]);
        assert_eq!(r.range_size(), 3);
        assert_eq!(r.get_range_from(0), 0);
        assert_eq!(r.get_range_from(1), 8);
        assert_eq!(r.get_range_from(2), 20);
    }

    #[test]
    fn test_empty_range_ignored() {
        let r = ranges(&[(5, 5), (7, 3)]);
        assert!(r.is_empty());
        assert_eq!(r.count(), 0);
    }

    #[test]
    fn test_union() {
        let a = ranges(&[(0, 10), (20, 30)]);
        let b = ranges(&[(5, 25), (40, 50)]);
        let mut out = RowRanges::new_empty();
        RowRanges::ranges_union(&a, &b, &mut out);
        assert_eq!(out, ranges(&[(0, 30), (40, 50)]));
    }

    #[test]
    fn test_intersection() {
        let a = ranges(&[(0, 10), (20, 30), (35, 40)]);
        let b = ranges(&[(5, 25), (38, 60)]);
        let mut out = RowRanges::new_empty();
        RowRanges::ranges_intersection(&a, &b, &mut out);
        assert_eq!(out, ranges(&[(5, 10), (20, 25), (38, 40)]));
    }

    #[test]
    fn test_intersection_aliasing_output() {
        let mut a = ranges(&[(0, 300)]);
        let b = ranges(&[(100, 200), (250, 400)]);
        let a_clone = a.clone();
        RowRanges::ranges_intersection(&a_clone, &b, &mut a);
        assert_eq!(a, ranges(&[(100, 200), (250, 300)]));
    }

    #[test]
    fn test_contains() {
        let r = ranges(&[(10, 20)]);
        assert!(!r.contains(9));
        assert!(r.contains(10));
        assert!(r.contains(19));
        assert!(!r.contains(20));
    }
}
