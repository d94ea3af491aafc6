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

//! Binary plain encoding: concatenated byte strings with an offset array
//! at the page tail.
//!
//! Page body:
//!
//! ```text
//! | cell 0 | cell 1 | ... | u32 offset x n | u32 n |
//! ```
//!
//! Decoded cells are zero-copy slices of the page buffer. Dictionary
//! pages use this encoding; [`BinaryPlainDecoder::dict_word_info`]
//! extracts the id-ordered word table.

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::block::{ColumnBlockView, MutableColumn};
use crate::encodings::PageDecoder;
use crate::errors::Result;

#[derive(Debug)]
pub struct BinaryPlainDecoder {
    data: Bytes,
    num_values: usize,
    /// Byte position where the offset array begins, which is also the
    /// end of the last cell.
    offsets_pos: usize,
    cur: usize,
}

impl BinaryPlainDecoder {
    pub fn new(data: Bytes) -> Result<Self> {
        if data.len() < 4 {
            return Err(corruption_err!("binary page too short: {} bytes", data.len()));
        }
        let num_values = LittleEndian::read_u32(&data[data.len() - 4..]) as usize;
        let offsets_pos = data
            .len()
            .checked_sub(4 + num_values * 4)
            .ok_or_else(|| corruption_err!("binary page offset array overflows the page"))?;
        let decoder = Self {
            data,
            num_values,
            offsets_pos,
            cur: 0,
        };
        // offsets must be monotone and in-bounds
        let mut prev = 0;
        for i in 0..num_values {
            let off = decoder.offset_at(i);
            if off < prev || off > decoder.offsets_pos {
                return Err(corruption_err!("binary page offset {} out of order at cell {}", off, i));
            }
            prev = off;
        }
        Ok(decoder)
    }

    fn offset_at(&self, idx: usize) -> usize {
        LittleEndian::read_u32(&self.data[self.offsets_pos + idx * 4..]) as usize
    }

    fn cell_at(&self, idx: usize) -> Bytes {
        let from = self.offset_at(idx);
        let to = if idx + 1 < self.num_values {
            self.offset_at(idx + 1)
        } else {
            self.offsets_pos
        };
        self.data.slice(from..to)
    }

    /// The id-ordered word table of a dictionary page.
    pub fn dict_word_info(&self) -> Vec<Bytes> {
        (0..self.num_values).map(|i| self.cell_at(i)).collect()
    }

    fn clamp(&self, n: usize) -> usize {
        n.min(self.num_values - self.cur)
    }
}

impl PageDecoder for BinaryPlainDecoder {
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
        for rel in 0..k {
            dst.set_binary(rel, self.cell_at(self.cur))?;
            self.cur += 1;
        }
        *n = k;
        Ok(())
    }

    fn next_batch_vec(&mut self, n: &mut usize, dst: &mut dyn MutableColumn) -> Result<()> {
        let k = self.clamp(*n);
        for _ in 0..k {
            dst.insert_binary(self.cell_at(self.cur))?;
            self.cur += 1;
        }
        *n = k;
        Ok(())
    }
}

/// Test/builder counterpart of [`BinaryPlainDecoder`].
#[derive(Debug, Default)]
pub struct BinaryPlainEncoder {
    cells: Vec<u8>,
    offsets: Vec<u32>,
}

impl BinaryPlainEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, cell: &[u8]) {
        self.offsets.push(self.cells.len() as u32);
        self.cells.extend_from_slice(cell);
    }

    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = self.cells;
        for off in &self.offsets {
            out.extend_from_slice(&off.to_le_bytes());
        }
        out.extend_from_slice(&(self.offsets.len() as u32).to_le_bytes());
        out
    }
}
