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

//! RLE/bit-packed hybrid codec for boolean streams (bit width 1), used
//! for the null bitmap of a data page.
//!
//! Stream grammar:
//!
//! ```text
//! stream    := run*
//! run       := repeated | literal
//! repeated  := varint(count << 1)     value-byte
//! literal   := varint(groups << 1 | 1) groups x bit-packed-byte
//! ```
//!
//! Each literal group packs 8 values LSB-first. The stream does not
//! record the total value count; callers bound reads by the page row
//! count, and only the final literal group may carry padding bits.

use bytes::Bytes;

use crate::errors::Result;

#[derive(Debug)]
enum Run {
    /// Between runs, `byte_pos` at the next indicator.
    None,
    Repeated { value: bool, remaining: usize },
    Literal { remaining: usize, bit_pos: usize },
}

/// Decoder over an RLE boolean stream.
///
/// `get_next_run` steps the stream in maximal same-value runs, which is
/// what lets null-aware batch decoding scale with the number of null
/// runs instead of the number of rows.
#[derive(Debug)]
pub struct RleDecoder {
    data: Bytes,
    byte_pos: usize,
    run: Run,
}

impl RleDecoder {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            byte_pos: 0,
            run: Run::None,
        }
    }

    fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let byte = *self
                .data
                .get(self.byte_pos)
                .ok_or_else(|| corruption_err!("null bitmap truncated at byte {}", self.byte_pos))?;
            self.byte_pos += 1;
            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(corruption_err!("null bitmap varint overflows"));
            }
        }
    }

    /// Loads the next run header. Errors when the stream is exhausted.
    fn load_run(&mut self) -> Result<()> {
        let indicator = self.read_varint()?;
        if indicator & 1 == 0 {
            let count = (indicator >> 1) as usize;
            let value = *self
                .data
                .get(self.byte_pos)
                .ok_or_else(|| corruption_err!("null bitmap repeated run truncated"))?;
            self.byte_pos += 1;
            if count == 0 {
                return Err(corruption_err!("null bitmap contains an empty run"));
            }
            self.run = Run::Repeated {
                value: value != 0,
                remaining: count,
            };
        } else {
            let groups = (indicator >> 1) as usize;
            if groups == 0 {
                return Err(corruption_err!("null bitmap contains an empty run"));
            }
            if self.byte_pos + groups > self.data.len() {
                return Err(corruption_err!("null bitmap literal run truncated"));
            }
            self.run = Run::Literal {
                remaining: groups * 8,
                bit_pos: self.byte_pos * 8,
            };
            self.byte_pos += groups;
        }
        Ok(())
    }

    /// Returns the value at the cursor and the length of its maximal
    /// same-value run, capped at `max_run`. The cursor advances past the
    /// returned run.
    pub fn get_next_run(&mut self, max_run: usize) -> Result<(bool, usize)> {
        debug_assert!(max_run > 0);
        if matches!(self.run, Run::None) {
            self.load_run()?;
        }
        match &mut self.run {
            Run::None => unreachable!(),
            Run::Repeated { value, remaining } => {
                let value = *value;
                let n = max_run.min(*remaining);
                *remaining -= n;
                if *remaining == 0 {
                    self.run = Run::None;
                }
                Ok((value, n))
            }
            Run::Literal { remaining, bit_pos } => {
                let value = {
                    let p = *bit_pos;
                    self.data[p / 8] & (1 << (p % 8)) != 0
                };
                let mut n = 1;
                while n < max_run && n < *remaining {
                    let p = *bit_pos + n;
                    if (self.data[p / 8] & (1 << (p % 8)) != 0) != value {
                        break;
                    }
                    n += 1;
                }
                *bit_pos += n;
                *remaining -= n;
                if *remaining == 0 {
                    self.run = Run::None;
                }
                Ok((value, n))
            }
        }
    }

    /// Advances past `to_skip` values, returning how many of them were
    /// set.
    pub fn skip(&mut self, to_skip: usize) -> Result<usize> {
        let mut left = to_skip;
        let mut set_bits = 0;
        while left > 0 {
            let (value, run) = self.get_next_run(left)?;
            if value {
                set_bits += run;
            }
            left -= run;
        }
        Ok(set_bits)
    }
}

/// Encoder counterpart, used by index writers and the test segment
/// builder. Values are buffered and encoded on [`Self::finish`]:
/// fully-uniform 8-value groups extend repeated runs, everything else
/// goes into literal groups.
#[derive(Debug, Default)]
pub struct RleEncoder {
    values: Vec<bool>,
}

impl RleEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, value: bool, count: usize) {
        self.values
            .extend(std::iter::repeat(value).take(count));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut repeated: Option<(bool, usize)> = None; // value, count
        let mut literal: Vec<u8> = Vec::new(); // packed groups

        let flush_literal = |out: &mut Vec<u8>, literal: &mut Vec<u8>| {
            if !literal.is_empty() {
                write_varint(out, (literal.len() as u64) << 1 | 1);
                out.extend_from_slice(literal);
                literal.clear();
            }
        };
        let flush_repeated = |out: &mut Vec<u8>, repeated: &mut Option<(bool, usize)>| {
            if let Some((value, count)) = repeated.take() {
                write_varint(out, (count as u64) << 1);
                out.push(value as u8);
            }
        };

        for group in self.values.chunks(8) {
            let uniform = group.len() == 8 && group.iter().all(|v| *v == group[0]);
            if uniform {
                match &mut repeated {
                    Some((value, count)) if *value == group[0] => *count += 8,
                    _ => {
                        flush_repeated(&mut out, &mut repeated);
                        flush_literal(&mut out, &mut literal);
                        repeated = Some((group[0], 8));
                    }
                }
            } else {
                flush_repeated(&mut out, &mut repeated);
                let mut packed = 0u8;
                for (i, v) in group.iter().enumerate() {
                    packed |= (*v as u8) << i;
                }
                literal.push(packed);
            }
        }
        flush_repeated(&mut out, &mut repeated);
        flush_literal(&mut out, &mut literal);
        out
    }
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(data: &[u8], count: usize) -> Vec<bool> {
        let mut decoder = RleDecoder::new(Bytes::copy_from_slice(data));
        let mut out = Vec::new();
        while out.len() < count {
            let (value, run) = decoder.get_next_run(count - out.len()).unwrap();
            out.extend(std::iter::repeat(value).take(run));
        }
        out
    }

    fn roundtrip(values: &[bool]) {
        let mut enc = RleEncoder::new();
        for &v in values {
            enc.append(v, 1);
        }
        let data = enc.finish();
        assert_eq!(decode_all(&data, values.len()), values, "{values:?}");
    }

    #[test]
    fn test_roundtrip_patterns() {
        roundtrip(&[true]);
        roundtrip(&[false; 3]);
        roundtrip(&[true; 64]);
        roundtrip(&(0..100).map(|i| i % 2 == 0).collect::<Vec<_>>());
        roundtrip(&(0..1000).map(|i| i % 5 == 4).collect::<Vec<_>>());
        // long uniform stretch followed by a ragged tail
        let mut v = vec![false; 256];
        v.extend([true, false, true, true, false]);
        roundtrip(&v);
    }

    #[test]
    fn test_long_run_uses_repeated_encoding() {
        let mut enc = RleEncoder::new();
        enc.append(true, 8000);
        let data = enc.finish();
        // varint(8000 << 1) + value byte
        assert!(data.len() <= 4, "repeated run should be tiny, got {}", data.len());
        assert_eq!(decode_all(&data, 8000), vec![true; 8000]);
    }

    #[test]
    fn test_get_next_run_caps_at_max_run() {
        let mut enc = RleEncoder::new();
        enc.append(false, 100);
        let mut dec = RleDecoder::new(enc.finish().into());
        let (value, run) = dec.get_next_run(30).unwrap();
        assert!(!value);
        assert_eq!(run, 30);
        let (_, run) = dec.get_next_run(usize::MAX >> 1).unwrap();
        assert_eq!(run, 70);
    }

    #[test]
    fn test_run_boundaries() {
        // 4 not-null, 1 null, repeated: runs must alternate 4/1
        let mut enc = RleEncoder::new();
        for _ in 0..20 {
            enc.append(false, 4);
            enc.append(true, 1);
        }
        let mut dec = RleDecoder::new(enc.finish().into());
        let mut produced = 0;
        let mut last_value = true;
        while produced < 100 {
            let (value, run) = dec.get_next_run(100 - produced).unwrap();
            assert_ne!(value, last_value, "runs must alternate");
            assert_eq!(run, if value { 1 } else { 4 });
            last_value = value;
            produced += run;
        }
    }

    #[test]
    fn test_skip_counts_set_bits() {
        let mut enc = RleEncoder::new();
        for i in 0..50 {
            enc.append(i % 5 == 4, 1);
        }
        let mut dec = RleDecoder::new(enc.finish().into());
        // first 25 values contain 5 set bits
        assert_eq!(dec.skip(25).unwrap(), 5);
        let (value, run) = dec.get_next_run(4).unwrap();
        assert!(!value);
        assert_eq!(run, 4);
    }

    #[test]
    fn test_truncated_stream_is_corruption() {
        let mut enc = RleEncoder::new();
        enc.append(true, 100);
        let data = enc.finish();
        let mut dec = RleDecoder::new(Bytes::copy_from_slice(&data));
        dec.skip(100).unwrap();
        // stream exhausted; further reads must error, not spin
        assert!(dec.get_next_run(1).is_err());
    }
}
