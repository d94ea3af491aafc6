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

//! Destination column batches for batched decoding.
//!
//! A [`ColumnVectorBatch`] is a caller-allocated, fixed-capacity column of
//! decoded cells. Iterators write into it through a [`ColumnBlockView`],
//! a movable cursor over the batch. The growable, append-only counterpart
//! used by the vectorised read path is the [`MutableColumn`] trait.
//!
//! Null tracking uses one byte per cell (a "null sign"), not a bitmap;
//! array batches keep their null signs in a child batch so a null-marker
//! column iterator can decode straight into them.

use bytes::Bytes;

use crate::basic::FieldType;
use crate::errors::Result;
use crate::types::{get_type_info, TypeInfo};

/// Cell storage for one scalar batch.
#[derive(Debug)]
enum BatchData {
    /// Little-endian fixed-stride cells.
    Fixed { elem_size: usize, bytes: Vec<u8> },
    /// Variable-length cells sharing their page buffers.
    Binary { values: Vec<Bytes> },
}

/// Fixed-capacity batch of decoded scalar cells.
#[derive(Debug)]
pub struct ScalarBatch {
    type_info: &'static TypeInfo,
    capacity: usize,
    data: BatchData,
    /// One byte per cell, non-zero meaning null. `None` for non-nullable batches.
    null_signs: Option<Vec<u8>>,
}

impl ScalarBatch {
    pub fn new(field_type: FieldType, capacity: usize, nullable: bool) -> Result<Self> {
        let type_info = get_type_info(field_type)?;
        let data = if type_info.is_binary() {
            BatchData::Binary {
                values: vec![Bytes::new(); capacity],
            }
        } else {
            BatchData::Fixed {
                elem_size: type_info.size(),
                bytes: vec![0u8; capacity * type_info.size()],
            }
        };
        Ok(Self {
            type_info,
            capacity,
            data,
            null_signs: nullable.then(|| vec![0u8; capacity]),
        })
    }

    pub fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_nullable(&self) -> bool {
        self.null_signs.is_some()
    }

    pub fn resize(&mut self, capacity: usize) {
        match &mut self.data {
            BatchData::Fixed { elem_size, bytes } => bytes.resize(capacity * *elem_size, 0),
            BatchData::Binary { values } => values.resize(capacity, Bytes::new()),
        }
        if let Some(signs) = &mut self.null_signs {
            signs.resize(capacity, 0);
        }
        self.capacity = capacity;
    }

    pub(crate) fn set_null_signs(&mut self, start: usize, count: usize, is_null: bool) {
        if let Some(signs) = &mut self.null_signs {
            signs[start..start + count].fill(is_null as u8);
        }
    }

    /// Mutable fixed-stride storage for `count` cells starting at `start`.
    pub(crate) fn fixed_slice_mut(&mut self, start: usize, count: usize) -> Result<&mut [u8]> {
        match &mut self.data {
            BatchData::Fixed { elem_size, bytes } => {
                let from = start * *elem_size;
                let to = (start + count) * *elem_size;
                bytes.get_mut(from..to).ok_or_else(|| {
                    internal_err!("batch overflow: {} cells at {}, capacity {}", count, start, self.capacity)
                })
            }
            BatchData::Binary { .. } => Err(internal_err!(
                "fixed-stride write into binary batch of {}",
                self.type_info.field_type()
            )),
        }
    }

    pub(crate) fn set_binary(&mut self, idx: usize, value: Bytes) -> Result<()> {
        match &mut self.data {
            BatchData::Binary { values } => {
                *values.get_mut(idx).ok_or_else(|| {
                    internal_err!("batch overflow: cell {}, capacity {}", idx, self.capacity)
                })? = value;
                Ok(())
            }
            BatchData::Fixed { .. } => Err(internal_err!(
                "binary write into fixed-stride batch of {}",
                self.type_info.field_type()
            )),
        }
    }

    /// Raw little-endian bytes of the cell at `idx`.
    pub fn fixed_at(&self, idx: usize) -> &[u8] {
        match &self.data {
            BatchData::Fixed { elem_size, bytes } => &bytes[idx * elem_size..(idx + 1) * elem_size],
            BatchData::Binary { .. } => panic!("fixed_at on a binary batch"),
        }
    }

    pub fn binary_at(&self, idx: usize) -> &Bytes {
        match &self.data {
            BatchData::Binary { values } => &values[idx],
            BatchData::Fixed { .. } => panic!("binary_at on a fixed batch"),
        }
    }

    pub fn is_null_at(&self, idx: usize) -> bool {
        self.null_signs.as_ref().is_some_and(|s| s[idx] != 0)
    }

    pub(crate) fn u32_at(&self, idx: usize) -> u32 {
        let cell = self.fixed_at(idx);
        u32::from_le_bytes([cell[0], cell[1], cell[2], cell[3]])
    }

    pub(crate) fn put_u32(&mut self, idx: usize, value: u32) {
        match &mut self.data {
            BatchData::Fixed { elem_size, bytes } => {
                debug_assert_eq!(*elem_size, 4);
                bytes[idx * 4..idx * 4 + 4].copy_from_slice(&value.to_le_bytes());
            }
            BatchData::Binary { .. } => unreachable!("offsets batch is fixed-stride"),
        }
    }
}

/// Fixed-capacity batch of decoded arrays: a cumulative offsets batch, an
/// item batch, and per-array null signs.
#[derive(Debug)]
pub struct ArrayVectorBatch {
    capacity: usize,
    /// UINT32 batch of `capacity + 1` entries; entry 0 is the base offset 0.
    /// The length-column iterator decodes per-array lengths into entries
    /// `1..`, which [`Self::put_offset_by_length`] folds into offsets.
    offsets: Box<ColumnVectorBatch>,
    /// Decoded items, addressed by the offsets above.
    elements: Box<ColumnVectorBatch>,
    /// INT8 batch of per-array null markers, present iff the array column
    /// is nullable. A null-marker column iterator decodes into it directly.
    null_signs: Option<Box<ColumnVectorBatch>>,
}

impl ArrayVectorBatch {
    pub fn new(
        elements: ColumnVectorBatch,
        capacity: usize,
        nullable: bool,
    ) -> Result<Self> {
        let mut offsets = ScalarBatch::new(FieldType::UINT32, capacity + 1, false)?;
        offsets.put_u32(0, 0);
        let null_signs = if nullable {
            Some(Box::new(ColumnVectorBatch::Scalar(ScalarBatch::new(
                FieldType::INT8,
                capacity,
                false,
            )?)))
        } else {
            None
        };
        Ok(Self {
            capacity,
            offsets: Box::new(ColumnVectorBatch::Scalar(offsets)),
            elements: Box::new(elements),
            null_signs,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_nullable(&self) -> bool {
        self.null_signs.is_some()
    }

    /// Grows the array capacity; the item batch grows separately, driven
    /// by the decoded lengths.
    pub fn resize(&mut self, capacity: usize) {
        self.offsets.resize(capacity + 1);
        if let Some(signs) = &mut self.null_signs {
            signs.resize(capacity);
        }
        self.capacity = capacity;
    }

    pub(crate) fn offsets_mut(&mut self) -> &mut ColumnVectorBatch {
        &mut self.offsets
    }

    pub(crate) fn null_signs_mut(&mut self) -> Option<&mut ColumnVectorBatch> {
        self.null_signs.as_deref_mut()
    }

    pub fn elements(&self) -> &ColumnVectorBatch {
        &self.elements
    }

    pub(crate) fn elements_mut(&mut self) -> &mut ColumnVectorBatch {
        &mut self.elements
    }

    fn offsets_scalar(&self) -> &ScalarBatch {
        match self.offsets.as_ref() {
            ColumnVectorBatch::Scalar(s) => s,
            ColumnVectorBatch::Array(_) => unreachable!("offsets batch is scalar"),
        }
    }

    /// Folds the lengths decoded at entries `start + 1 ..= start + count`
    /// into cumulative offsets.
    pub(crate) fn put_offset_by_length(&mut self, start: usize, count: usize) {
        let batch = match self.offsets.as_mut() {
            ColumnVectorBatch::Scalar(s) => s,
            ColumnVectorBatch::Array(_) => unreachable!("offsets batch is scalar"),
        };
        for i in start + 1..=start + count {
            let cumulative = batch.u32_at(i - 1) + batch.u32_at(i);
            batch.put_u32(i, cumulative);
        }
    }

    /// Item-stream position of the first item of array `idx`.
    pub fn item_offset(&self, idx: usize) -> u64 {
        self.offsets_scalar().u32_at(idx) as u64
    }

    /// Total item count of the `count` arrays starting at `start`;
    /// valid once their offsets are folded.
    pub(crate) fn item_size(&self, start: usize, count: usize) -> u64 {
        self.item_offset(start + count) - self.item_offset(start)
    }

    pub fn is_null_at(&self, idx: usize) -> bool {
        match self.null_signs.as_deref() {
            Some(ColumnVectorBatch::Scalar(s)) => s.fixed_at(idx)[0] != 0,
            Some(ColumnVectorBatch::Array(_)) => unreachable!("null signs batch is scalar"),
            None => false,
        }
    }

    pub(crate) fn set_null_signs(&mut self, start: usize, count: usize, is_null: bool) {
        if let Some(ColumnVectorBatch::Scalar(s)) = self.null_signs.as_deref_mut() {
            match s.fixed_slice_mut(start, count) {
                Ok(slice) => slice.fill(is_null as u8),
                Err(_) => unreachable!("null signs sized with the batch"),
            }
        }
    }

    /// Checks the assembled offsets over `[start, start + count]` before
    /// the batch is handed back to the caller. Offsets must be monotone
    /// non-decreasing and bounded by the item batch.
    pub(crate) fn prepare_for_read(&self, start: usize, count: usize) -> Result<()> {
        let offsets = self.offsets_scalar();
        let mut prev = offsets.u32_at(start);
        for i in start + 1..=start + count {
            let cur = offsets.u32_at(i);
            if cur < prev {
                return Err(internal_err!(
                    "array offsets not monotone at entry {}: {} < {}",
                    i,
                    cur,
                    prev
                ));
            }
            prev = cur;
        }
        if prev as usize > self.elements.capacity() {
            return Err(internal_err!(
                "array offsets exceed item batch: {} > {}",
                prev,
                self.elements.capacity()
            ));
        }
        Ok(())
    }
}

/// A decoded column batch: scalar or array.
#[derive(Debug)]
pub enum ColumnVectorBatch {
    Scalar(ScalarBatch),
    Array(ArrayVectorBatch),
}

impl ColumnVectorBatch {
    /// Builds a batch for a column shape: scalar batches for scalar
    /// types, recursively nested batches for arrays.
    pub fn new_scalar(field_type: FieldType, capacity: usize, nullable: bool) -> Result<Self> {
        Ok(ColumnVectorBatch::Scalar(ScalarBatch::new(
            field_type, capacity, nullable,
        )?))
    }

    pub fn new_array(
        elements: ColumnVectorBatch,
        capacity: usize,
        nullable: bool,
    ) -> Result<Self> {
        Ok(ColumnVectorBatch::Array(ArrayVectorBatch::new(
            elements, capacity, nullable,
        )?))
    }

    pub fn capacity(&self) -> usize {
        match self {
            ColumnVectorBatch::Scalar(b) => b.capacity(),
            ColumnVectorBatch::Array(b) => b.capacity(),
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            ColumnVectorBatch::Scalar(b) => b.is_nullable(),
            ColumnVectorBatch::Array(b) => b.is_nullable(),
        }
    }

    pub fn resize(&mut self, capacity: usize) {
        match self {
            ColumnVectorBatch::Scalar(b) => b.resize(capacity),
            ColumnVectorBatch::Array(b) => b.resize(capacity),
        }
    }

    pub(crate) fn set_null_signs(&mut self, start: usize, count: usize, is_null: bool) {
        match self {
            ColumnVectorBatch::Scalar(b) => b.set_null_signs(start, count, is_null),
            ColumnVectorBatch::Array(b) => b.set_null_signs(start, count, is_null),
        }
    }

    pub fn as_scalar(&self) -> Result<&ScalarBatch> {
        match self {
            ColumnVectorBatch::Scalar(b) => Ok(b),
            ColumnVectorBatch::Array(_) => Err(internal_err!("expected a scalar batch")),
        }
    }

    pub fn as_scalar_mut(&mut self) -> Result<&mut ScalarBatch> {
        match self {
            ColumnVectorBatch::Scalar(b) => Ok(b),
            ColumnVectorBatch::Array(_) => Err(internal_err!("expected a scalar batch")),
        }
    }

    pub fn as_array(&self) -> Result<&ArrayVectorBatch> {
        match self {
            ColumnVectorBatch::Array(b) => Ok(b),
            ColumnVectorBatch::Scalar(_) => Err(internal_err!("expected an array batch")),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut ArrayVectorBatch> {
        match self {
            ColumnVectorBatch::Array(b) => Ok(b),
            ColumnVectorBatch::Scalar(_) => Err(internal_err!("expected an array batch")),
        }
    }
}

/// Movable write cursor over a [`ColumnVectorBatch`].
///
/// Decoders write cells at the cursor without moving it; the iterator
/// stamps null signs and advances.
pub struct ColumnBlockView<'a> {
    batch: &'a mut ColumnVectorBatch,
    offset: usize,
}

impl<'a> ColumnBlockView<'a> {
    pub fn new(batch: &'a mut ColumnVectorBatch, offset: usize) -> Self {
        Self { batch, offset }
    }

    pub fn current_offset(&self) -> usize {
        self.offset
    }

    pub fn advance(&mut self, n: usize) {
        self.offset += n;
    }

    pub fn is_nullable(&self) -> bool {
        self.batch.is_nullable()
    }

    /// Stamps `count` null signs at the cursor.
    pub fn set_null_bits(&mut self, count: usize, is_null: bool) {
        self.batch.set_null_signs(self.offset, count, is_null);
    }

    /// Mutable fixed-stride storage for `count` cells at the cursor.
    pub(crate) fn fixed_slice_mut(&mut self, count: usize) -> Result<&mut [u8]> {
        self.batch.as_scalar_mut()?.fixed_slice_mut(self.offset, count)
    }

    /// Writes a binary cell `rel` positions past the cursor.
    pub(crate) fn set_binary(&mut self, rel: usize, value: Bytes) -> Result<()> {
        self.batch.as_scalar_mut()?.set_binary(self.offset + rel, value)
    }

    pub(crate) fn batch_mut(&mut self) -> &mut ColumnVectorBatch {
        self.batch
    }
}

/// Growable destination column for the vectorised read path.
///
/// Fixed-size cells arrive as little-endian bytes, binary cells as
/// page-backed [`Bytes`]; nulls arrive as appended defaults.
pub trait MutableColumn {
    /// Appends one non-null cell.
    fn insert_value(&mut self, value: &[u8]) -> Result<()>;

    /// Appends one non-null binary cell, sharing the page buffer.
    fn insert_binary(&mut self, value: Bytes) -> Result<()> {
        self.insert_value(&value)
    }

    /// Appends `n` null cells.
    fn insert_many_defaults(&mut self, n: usize);

    /// Current heap footprint of the cells, for read-size accounting.
    fn byte_size(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`MutableColumn`] over fixed-stride cells.
#[derive(Debug)]
pub struct MutableFixedColumn {
    elem_size: usize,
    data: Vec<u8>,
    nulls: Vec<bool>,
}

impl MutableFixedColumn {
    pub fn new(elem_size: usize) -> Self {
        Self {
            elem_size,
            data: Vec::new(),
            nulls: Vec::new(),
        }
    }

    pub fn fixed_at(&self, idx: usize) -> &[u8] {
        &self.data[idx * self.elem_size..(idx + 1) * self.elem_size]
    }

    pub fn is_null_at(&self, idx: usize) -> bool {
        self.nulls[idx]
    }
}

impl MutableColumn for MutableFixedColumn {
    fn insert_value(&mut self, value: &[u8]) -> Result<()> {
        if value.len() != self.elem_size {
            return Err(internal_err!(
                "cell size {} does not match column stride {}",
                value.len(),
                self.elem_size
            ));
        }
        self.data.extend_from_slice(value);
        self.nulls.push(false);
        Ok(())
    }

    fn insert_many_defaults(&mut self, n: usize) {
        self.data.resize(self.data.len() + n * self.elem_size, 0);
        self.nulls.resize(self.nulls.len() + n, true);
    }

    fn byte_size(&self) -> usize {
        self.data.len()
    }

    fn len(&self) -> usize {
        self.nulls.len()
    }
}

/// [`MutableColumn`] over binary cells.
#[derive(Debug, Default)]
pub struct MutableBinaryColumn {
    values: Vec<Option<Bytes>>,
    bytes: usize,
}

impl MutableBinaryColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value_at(&self, idx: usize) -> Option<&Bytes> {
        self.values[idx].as_ref()
    }
}

impl MutableColumn for MutableBinaryColumn {
    fn insert_value(&mut self, value: &[u8]) -> Result<()> {
        self.insert_binary(Bytes::copy_from_slice(value))
    }

    fn insert_binary(&mut self, value: Bytes) -> Result<()> {
        self.bytes += value.len();
        self.values.push(Some(value));
        Ok(())
    }

    fn insert_many_defaults(&mut self, n: usize) {
        self.values.extend(std::iter::repeat_with(|| None).take(n));
    }

    fn byte_size(&self) -> usize {
        self.bytes
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_batch_fixed_writes() {
        let mut batch = ColumnVectorBatch::new_scalar(FieldType::INT32, 4, true).unwrap();
        {
            let mut view = ColumnBlockView::new(&mut batch, 0);
            let slots = view.fixed_slice_mut(2).unwrap();
            slots[0..4].copy_from_slice(&7i32.to_le_bytes());
            slots[4..8].copy_from_slice(&8i32.to_le_bytes());
            view.set_null_bits(2, false);
            view.advance(2);
            view.set_null_bits(1, true);
        }
        let scalar = batch.as_scalar().unwrap();
        assert_eq!(scalar.fixed_at(0), 7i32.to_le_bytes());
        assert_eq!(scalar.fixed_at(1), 8i32.to_le_bytes());
        assert!(!scalar.is_null_at(1));
        assert!(scalar.is_null_at(2));
    }

    #[test]
    fn test_scalar_batch_overflow() {
        let mut batch = ScalarBatch::new(FieldType::INT32, 2, false).unwrap();
        assert!(batch.fixed_slice_mut(1, 2).is_err());
        assert!(batch.fixed_slice_mut(0, 2).is_ok());
    }

    #[test]
    fn test_binary_batch() {
        let mut batch = ScalarBatch::new(FieldType::VARCHAR, 2, false).unwrap();
        batch.set_binary(0, Bytes::from_static(b"ab")).unwrap();
        batch.set_binary(1, Bytes::from_static(b"")).unwrap();
        assert_eq!(batch.binary_at(0).as_ref(), b"ab");
        assert!(batch.binary_at(1).is_empty());
        assert!(batch.fixed_slice_mut(0, 1).is_err());
    }

    #[test]
    fn test_array_batch_offsets() {
        let items = ColumnVectorBatch::new_scalar(FieldType::INT32, 8, true).unwrap();
        let mut arr = ArrayVectorBatch::new(items, 3, true).unwrap();
        // lengths 2, 0, 3 decoded into entries 1..=3
        let offsets = arr.offsets_mut().as_scalar_mut().unwrap();
        offsets.put_u32(1, 2);
        offsets.put_u32(2, 0);
        offsets.put_u32(3, 3);
        arr.put_offset_by_length(0, 3);
        assert_eq!(arr.item_offset(0), 0);
        assert_eq!(arr.item_offset(1), 2);
        assert_eq!(arr.item_offset(2), 2);
        assert_eq!(arr.item_offset(3), 5);
        assert_eq!(arr.item_size(0, 3), 5);
        arr.prepare_for_read(0, 3).unwrap();
    }

    #[test]
    fn test_array_batch_null_signs() {
        let items = ColumnVectorBatch::new_scalar(FieldType::INT32, 4, false).unwrap();
        let mut arr = ArrayVectorBatch::new(items, 3, true).unwrap();
        arr.set_null_signs(1, 1, true);
        assert!(!arr.is_null_at(0));
        assert!(arr.is_null_at(1));
        assert!(!arr.is_null_at(2));
    }

    #[test]
    fn test_mutable_fixed_column() {
        let mut col = MutableFixedColumn::new(4);
        col.insert_value(&5i32.to_le_bytes()).unwrap();
        col.insert_many_defaults(2);
        col.insert_value(&9i32.to_le_bytes()).unwrap();
        assert_eq!(col.len(), 4);
        assert_eq!(col.byte_size(), 16);
        assert_eq!(col.fixed_at(0), 5i32.to_le_bytes());
        assert!(col.is_null_at(1));
        assert!(col.is_null_at(2));
        assert!(!col.is_null_at(3));
        assert!(col.insert_value(&[0u8; 3]).is_err());
    }

    #[test]
    fn test_mutable_binary_column() {
        let mut col = MutableBinaryColumn::new();
        col.insert_binary(Bytes::from_static(b"xyz")).unwrap();
        col.insert_many_defaults(1);
        assert_eq!(col.len(), 2);
        assert_eq!(col.byte_size(), 3);
        assert_eq!(col.value_at(0).unwrap().as_ref(), b"xyz");
        assert!(col.value_at(1).is_none());
    }
}
