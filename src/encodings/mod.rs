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

//! Value decoders for the supported page encodings, selected per page
//! through the [`EncodingInfo`] registry.

pub mod binary_dict;
pub mod binary_plain;
pub mod plain;
pub mod rle;

use bytes::Bytes;

use crate::basic::Encoding;
use crate::block::{ColumnBlockView, MutableColumn};
use crate::errors::Result;
use crate::types::TypeInfo;

/// Positionable decoder over one page's value stream.
///
/// A decoder addresses positions in the *value* stream of its page,
/// which excludes null slots; the iterator translates row offsets into
/// value positions through the null decoder.
///
/// `next_batch` writes decoded cells at the destination cursor without
/// advancing it, and shrinks `*n` to the number actually decoded.
pub trait PageDecoder: Send {
    /// Downcast hook; the scalar iterator uses it to reach the
    /// dictionary decoder behind the trait object.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    /// Number of values in the page's value stream.
    fn count(&self) -> usize;

    /// Current position in the value stream.
    fn current_index(&self) -> usize;

    fn seek_to_position_in_page(&mut self, pos: usize) -> Result<()>;

    fn next_batch(&mut self, n: &mut usize, dst: &mut ColumnBlockView<'_>) -> Result<()>;

    fn next_batch_vec(&mut self, n: &mut usize, dst: &mut dyn MutableColumn) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
enum DecoderKind {
    Plain,
    BinaryPlain,
    BinaryDict,
}

/// Maps `(field type, encoding)` to a page decoder factory.
#[derive(Debug)]
pub struct EncodingInfo {
    encoding: Encoding,
    kind: DecoderKind,
}

static PLAIN: EncodingInfo = EncodingInfo {
    encoding: Encoding::PLAIN,
    kind: DecoderKind::Plain,
};
static BINARY_PLAIN: EncodingInfo = EncodingInfo {
    encoding: Encoding::BINARY_PLAIN,
    kind: DecoderKind::BinaryPlain,
};
static BINARY_DICT: EncodingInfo = EncodingInfo {
    encoding: Encoding::DICT,
    kind: DecoderKind::BinaryDict,
};

impl EncodingInfo {
    /// Resolves the decoder factory for a column's type and encoding.
    pub fn get(type_info: &TypeInfo, encoding: Encoding) -> Result<&'static EncodingInfo> {
        match (type_info.is_binary(), encoding) {
            (false, Encoding::PLAIN) => Ok(&PLAIN),
            (true, Encoding::BINARY_PLAIN) => Ok(&BINARY_PLAIN),
            (true, Encoding::DICT) => Ok(&BINARY_DICT),
            _ => Err(unsupported_err!(
                "encoding {} is not supported for type {}",
                encoding,
                type_info.field_type()
            )),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Builds a decoder over one page's value stream.
    pub fn create_page_decoder(
        &self,
        values: Bytes,
        type_info: &'static TypeInfo,
    ) -> Result<Box<dyn PageDecoder>> {
        Ok(match self.kind {
            DecoderKind::Plain => Box::new(plain::PlainDecoder::new(values, type_info.size())?),
            DecoderKind::BinaryPlain => {
                Box::new(binary_plain::BinaryPlainDecoder::new(values)?)
            }
            DecoderKind::BinaryDict => Box::new(binary_dict::BinaryDictDecoder::new(values)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::FieldType;
    use crate::types::get_type_info;

    #[test]
    fn test_encoding_resolution() {
        let int = get_type_info(FieldType::INT32).unwrap();
        let varchar = get_type_info(FieldType::VARCHAR).unwrap();

        assert_eq!(EncodingInfo::get(int, Encoding::PLAIN).unwrap().encoding(), Encoding::PLAIN);
        assert_eq!(
            EncodingInfo::get(varchar, Encoding::BINARY_PLAIN).unwrap().encoding(),
            Encoding::BINARY_PLAIN
        );
        assert_eq!(
            EncodingInfo::get(varchar, Encoding::DICT).unwrap().encoding(),
            Encoding::DICT
        );

        assert!(EncodingInfo::get(int, Encoding::DICT).is_err());
        assert!(EncodingInfo::get(varchar, Encoding::PLAIN).is_err());
        assert!(EncodingInfo::get(int, Encoding::RLE).is_err());
    }
}
