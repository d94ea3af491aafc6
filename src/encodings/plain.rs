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

//! Plain encoding: raw little-endian cells at a fixed stride.

use bytes::Bytes;

use crate::block::{ColumnBlockView, MutableColumn};
use crate::encodings::PageDecoder;
use crate::errors::Result;

#[derive(Debug)]
pub struct PlainDecoder {
    data: Bytes,
    elem_size: usize,
    num_values: usize,
    cur: usize,
}

impl PlainDecoder {
    pub fn new(data: Bytes, elem_size: usize) -> Result<Self> {
        if data.len() % elem_size != 0 {
            return Err(corruption_err!(
                "plain page of {} bytes is not a multiple of the {}-byte stride",
                data.len(),
                elem_size
            ));
        }
        let num_values = data.len() / elem_size;
        Ok(Self {
            data,
            elem_size,
            num_values,
            cur: 0,
        })
    }

    fn clamp(&self, n: usize) -> usize {
        n.min(self.num_values - self.cur)
    }
}

impl PageDecoder for PlainDecoder {
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn count(&self) -> usize {
        self.num_values
    }

    fn current_index(&self) -> usize {
        self.cur
    }

    fn seek_to_position_in_page(&mut self, pos: usize) -> Result<()> {
        if pos > self.num_values {
            return Err(internal_err!(
                "seek to value {} beyond page of {} values",
                pos,
                self.num_values
            ));
        }
        self.cur = pos;
        Ok(())
    }

    fn next_batch(&mut self, n: &mut usize, dst: &mut ColumnBlockView<'_>) -> Result<()> {
        let k = self.clamp(*n);
        if k > 0 {
            let from = self.cur * self.elem_size;
            let to = (self.cur + k) * self.elem_size;
            dst.fixed_slice_mut(k)?.copy_from_slice(&self.data[from..to]);
            self.cur += k;
        }
        *n = k;
        Ok(())
    }

    fn next_batch_vec(&mut self, n: &mut usize, dst: &mut dyn MutableColumn) -> Result<()> {
        let k = self.clamp(*n);
        for _ in 0..k {
            let from = self.cur * self.elem_size;
            dst.insert_value(&self.data[from..from + self.elem_size])?;
            self.cur += 1;
        }
        *n = k;
        Ok(())
    }
}

/// Test/builder counterpart of [`PlainDecoder`].
#[derive(Debug, Default)]
pub struct PlainEncoder {
    data: Vec<u8>,
}

impl PlainEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, cell: &[u8]) {
        self.data.extend_from_slice(cell);
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::FieldType;
    use crate::block::{ColumnVectorBatch, MutableFixedColumn};

    fn int32_page(values: &[i32]) -> PlainDecoder {
        let mut enc = PlainEncoder::new();
        for v in values {
            enc.put(&v.to_le_bytes());
        }
        PlainDecoder::new(enc.finish().into(), 4).unwrap()
    }

    #[test]
    fn test_decode_into_block() {
        let mut dec = int32_page(&[1, 2, 3, 4, 5]);
        assert_eq!(dec.count(), 5);

        let mut batch = ColumnVectorBatch::new_scalar(FieldType::INT32, 5, false).unwrap();
        let mut view = ColumnBlockView::new(&mut batch, 0);
        let mut n = 3;
        dec.next_batch(&mut n, &mut view).unwrap();
        assert_eq!(n, 3);
        assert_eq!(dec.current_index(), 3);
        view.advance(3);
        let mut n = 10;
        dec.next_batch(&mut n, &mut view).unwrap();
        assert_eq!(n, 2);

        let scalar = batch.as_scalar().unwrap();
        for (i, v) in [1i32, 2, 3, 4, 5].iter().enumerate() {
            assert_eq!(scalar.fixed_at(i), v.to_le_bytes());
        }
    }

    #[test]
    fn test_decode_into_mutable() {
        let mut dec = int32_page(&[7, 8, 9]);
        let mut col = MutableFixedColumn::new(4);
        let mut n = 8;
        dec.next_batch_vec(&mut n, &mut col).unwrap();
        assert_eq!(n, 3);
        assert_eq!(col.len(), 3);
        assert_eq!(col.fixed_at(2), 9i32.to_le_bytes());
    }

    #[test]
    fn test_seek() {
        let mut dec = int32_page(&[10, 20, 30]);
        dec.seek_to_position_in_page(2).unwrap();
        let mut batch = ColumnVectorBatch::new_scalar(FieldType::INT32, 1, false).unwrap();
        let mut view = ColumnBlockView::new(&mut batch, 0);
        let mut n = 1;
        dec.next_batch(&mut n, &mut view).unwrap();
        assert_eq!(batch.as_scalar().unwrap().fixed_at(0), 30i32.to_le_bytes());
        assert!(dec.seek_to_position_in_page(4).is_err());
    }

    #[test]
    fn test_misaligned_page() {
        assert!(PlainDecoder::new(Bytes::from_static(&[0; 7]), 4).is_err());
    }
}
