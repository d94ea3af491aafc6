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

//! Dictionary encoding for binary columns.
//!
//! Page body:
//!
//! ```text
//! | u32 mode | payload |
//! ```
//!
//! In dictionary mode the payload is an array of `u32` codewords into
//! the column's dictionary page; a writer that overflows its dictionary
//! falls back to a binary-plain payload for the remaining pages, so both
//! kinds coexist within one column. The dictionary word table is loaded
//! by the column iterator and injected with [`BinaryDictDecoder::set_dict`]
//! before the first decode.

use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::block::{ColumnBlockView, MutableColumn};
use crate::encodings::binary_plain::BinaryPlainDecoder;
use crate::encodings::PageDecoder;
use crate::errors::Result;

const MODE_DICT: u32 = 1;
const MODE_PLAIN: u32 = 0;

#[derive(Debug)]
enum Mode {
    Dict {
        codes: Bytes,
        num_values: usize,
        cur: usize,
        dict: Option<Arc<Vec<Bytes>>>,
    },
    Plain(BinaryPlainDecoder),
}

#[derive(Debug)]
pub struct BinaryDictDecoder {
    mode: Mode,
}

impl BinaryDictDecoder {
    pub fn new(body: Bytes) -> Result<Self> {
        if body.len() < 4 {
            return Err(corruption_err!("dict page too short: {} bytes", body.len()));
        }
        let mode_tag = LittleEndian::read_u32(&body[..4]);
        let payload = body.slice(4..);
        let mode = match mode_tag {
            MODE_DICT => {
                if payload.len() % 4 != 0 {
                    return Err(corruption_err!(
                        "dict codeword payload of {} bytes is not u32-aligned",
                        payload.len()
                    ));
                }
                Mode::Dict {
                    num_values: payload.len() / 4,
                    codes: payload,
                    cur: 0,
                    dict: None,
                }
            }
            MODE_PLAIN => Mode::Plain(BinaryPlainDecoder::new(payload)?),
            _ => return Err(corruption_err!("invalid dict page mode {}", mode_tag)),
        };
        Ok(Self { mode })
    }

    /// Whether this page actually carries codewords. Fallback pages
    /// decode standalone and need no dictionary.
    pub fn is_dict_encoding(&self) -> bool {
        matches!(self.mode, Mode::Dict { .. })
    }

    /// Injects the column's dictionary word table. Must be called before
    /// decoding a codeword page.
    pub fn set_dict(&mut self, words: Arc<Vec<Bytes>>) {
        if let Mode::Dict { dict, .. } = &mut self.mode {
            *dict = Some(words);
        }
    }

    fn word_at(codes: &Bytes, dict: &Option<Arc<Vec<Bytes>>>, idx: usize) -> Result<Bytes> {
        let dict = dict
            .as_ref()
            .ok_or_else(|| internal_err!("dictionary not set before decoding codewords"))?;
        let code = LittleEndian::read_u32(&codes[idx * 4..]) as usize;
        dict.get(code)
            .cloned()
            .ok_or_else(|| corruption_err!("codeword {} outside dictionary of {} words", code, dict.len()))
    }
}

impl PageDecoder for BinaryDictDecoder {
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn count(&self) -> usize {
        match &self.mode {
            Mode::Dict { num_values, .. } => *num_values,
            Mode::Plain(inner) => inner.count(),
        }
    }

    fn current_index(&self) -> usize {
        match &self.mode {
            Mode::Dict { cur, .. } => *cur,
            Mode::Plain(inner) => inner.current_index(),
        }
    }

    fn seek_to_position_in_page(&mut self, pos: usize) -> Result<()> {
        match &mut self.mode {
            Mode::Dict { num_values, cur, .. } => {
                if pos > *num_values {
                    return Err(internal_err!(
                        "seek to value {} beyond page of {} values",
                        pos,
                        num_values
                    ));
                }
                *cur = pos;
                Ok(())
            }
            Mode::Plain(inner) => inner.seek_to_position_in_page(pos),
        }
    }

    fn next_batch(&mut self, n: &mut usize, dst: &mut ColumnBlockView<'_>) -> Result<()> {
        match &mut self.mode {
            Mode::Dict {
                codes,
                num_values,
                cur,
                dict,
            } => {
                let k = (*n).min(*num_values - *cur);
                for rel in 0..k {
                    dst.set_binary(rel, Self::word_at(codes, dict, *cur)?)?;
                    *cur += 1;
                }
                *n = k;
                Ok(())
            }
            Mode::Plain(inner) => inner.next_batch(n, dst),
        }
    }

    fn next_batch_vec(&mut self, n: &mut usize, dst: &mut dyn MutableColumn) -> Result<()> {
        match &mut self.mode {
            Mode::Dict {
                codes,
                num_values,
                cur,
                dict,
            } => {
                let k = (*n).min(*num_values - *cur);
                for _ in 0..k {
                    dst.insert_binary(Self::word_at(codes, dict, *cur)?)?;
                    *cur += 1;
                }
                *n = k;
                Ok(())
            }
            Mode::Plain(inner) => inner.next_batch_vec(n, dst),
        }
    }
}

/// Test/builder counterpart of [`BinaryDictDecoder`]: encodes one page of
/// codewords, or wraps a binary-plain payload as a fallback page.
#[derive(Debug, Default)]
pub struct BinaryDictEncoder {
    codes: Vec<u32>,
}

impl BinaryDictEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, code: u32) {
        self.codes.push(code);
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.codes.len() * 4);
        out.extend_from_slice(&MODE_DICT.to_le_bytes());
        for code in &self.codes {
            out.extend_from_slice(&code.to_le_bytes());
        }
        out
    }

    pub fn wrap_plain(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + payload.len());
        out.extend_from_slice(&MODE_PLAIN.to_le_bytes());
        out.extend_from_slice(payload);
        out
    }
}
