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

//! Per-type metadata: element sizes, string parsing and rendering.
//!
//! Zone maps store min/max in string form; the reader parses them back
//! into typed [`CellValue`]s before predicate evaluation. The decimal
//! canonical form is a 128-bit integer scaled by 10^9.

use bytes::Bytes;
use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::basic::FieldType;
use crate::errors::Result;

/// Number of fractional decimal digits in the canonical decimal representation.
const DECIMAL_FRAC_DIGITS: u32 = 9;
const DECIMAL_FRAC_SCALE: i128 = 10i128.pow(DECIMAL_FRAC_DIGITS);

const UNIX_EPOCH_DAY: i32 = 719_163; // days from CE to 1970-01-01

/// A typed cell value, used as the container for zone-map bounds and
/// default values. `Null` sorts below every non-null value, consistent
/// with the engine's null ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    /// Days since the unix epoch.
    Date(i32),
    /// Microseconds since the unix epoch.
    DateTime(i64),
    /// Canonical scaled decimal: `integer * 10^9 + fraction`.
    Decimal(i128),
    Bytes(Bytes),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Total order with nulls first; values of different types are
    /// incomparable and reported as `None`.
    pub fn partial_cmp_value(&self, other: &CellValue) -> Option<std::cmp::Ordering> {
        use std::cmp::Ordering;
        use CellValue::*;
        match (self, other) {
            (Null, Null) => Some(Ordering::Equal),
            (Null, _) => Some(Ordering::Less),
            (_, Null) => Some(Ordering::Greater),
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (Int8(a), Int8(b)) => a.partial_cmp(b),
            (Int16(a), Int16(b)) => a.partial_cmp(b),
            (Int32(a), Int32(b)) => a.partial_cmp(b),
            (Int64(a), Int64(b)) => a.partial_cmp(b),
            (UInt32(a), UInt32(b)) => a.partial_cmp(b),
            (UInt64(a), UInt64(b)) => a.partial_cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Double(a), Double(b)) => a.partial_cmp(b),
            (Date(a), Date(b)) => a.partial_cmp(b),
            (DateTime(a), DateTime(b)) => a.partial_cmp(b),
            (Decimal(a), Decimal(b)) => a.partial_cmp(b),
            (Bytes(a), Bytes(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Bool(v) => write!(f, "{}", *v as u8),
            CellValue::Int8(v) => write!(f, "{v}"),
            CellValue::Int16(v) => write!(f, "{v}"),
            CellValue::Int32(v) => write!(f, "{v}"),
            CellValue::Int64(v) => write!(f, "{v}"),
            CellValue::UInt32(v) => write!(f, "{v}"),
            CellValue::UInt64(v) => write!(f, "{v}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Double(v) => write!(f, "{v}"),
            CellValue::Date(v) => {
                match NaiveDate::from_num_days_from_ce_opt(v + UNIX_EPOCH_DAY) {
                    Some(d) => write!(f, "{}", d.format("%Y-%m-%d")),
                    None => write!(f, "{v}"),
                }
            }
            CellValue::DateTime(v) => match chrono::DateTime::from_timestamp_micros(*v) {
                Some(d) => write!(f, "{}", d.naive_utc().format("%Y-%m-%d %H:%M:%S")),
                None => write!(f, "{v}"),
            },
            CellValue::Decimal(v) => {
                let int = v / DECIMAL_FRAC_SCALE;
                let frac = (v % DECIMAL_FRAC_SCALE).unsigned_abs();
                write!(f, "{int}.{frac:09}")
            }
            CellValue::Bytes(v) => write!(f, "{}", String::from_utf8_lossy(v)),
        }
    }
}

/// Static per-type descriptor: element size in the encoded stream and
/// conversions between string form and [`CellValue`].
#[derive(Debug)]
pub struct TypeInfo {
    field_type: FieldType,
    size: usize,
}

/// In-memory size of a variable-length cell (pointer + length), used for
/// read-size accounting only.
const BINARY_CELL_SIZE: usize = 16;

static TYPE_INFOS: &[TypeInfo] = &[
    TypeInfo { field_type: FieldType::BOOLEAN, size: 1 },
    TypeInfo { field_type: FieldType::INT8, size: 1 },
    TypeInfo { field_type: FieldType::INT16, size: 2 },
    TypeInfo { field_type: FieldType::INT32, size: 4 },
    TypeInfo { field_type: FieldType::INT64, size: 8 },
    TypeInfo { field_type: FieldType::UINT32, size: 4 },
    TypeInfo { field_type: FieldType::UINT64, size: 8 },
    TypeInfo { field_type: FieldType::FLOAT, size: 4 },
    TypeInfo { field_type: FieldType::DOUBLE, size: 8 },
    TypeInfo { field_type: FieldType::DATE, size: 4 },
    TypeInfo { field_type: FieldType::DATETIME, size: 8 },
    TypeInfo { field_type: FieldType::DECIMAL, size: 16 },
    TypeInfo { field_type: FieldType::CHAR, size: BINARY_CELL_SIZE },
    TypeInfo { field_type: FieldType::VARCHAR, size: BINARY_CELL_SIZE },
    TypeInfo { field_type: FieldType::STRING, size: BINARY_CELL_SIZE },
    TypeInfo { field_type: FieldType::HLL, size: BINARY_CELL_SIZE },
    TypeInfo { field_type: FieldType::OBJECT, size: BINARY_CELL_SIZE },
];

/// Looks up the [`TypeInfo`] for a scalar field type. Composite types
/// have no type info of their own.
pub fn get_type_info(field_type: FieldType) -> Result<&'static TypeInfo> {
    TYPE_INFOS
        .iter()
        .find(|t| t.field_type == field_type)
        .ok_or_else(|| unsupported_err!("no type info for field type {}", field_type))
}

impl TypeInfo {
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Element size in bytes: the encoded stride for fixed-size types,
    /// the in-memory cell size for the binary family.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_binary(&self) -> bool {
        self.field_type.is_binary()
    }

    /// Parses the string form used by zone maps and default values.
    pub fn from_string(&self, s: &str) -> Result<CellValue> {
        let parse_fail = || general_err!("cannot parse {:?} as {}", s, self.field_type);
        Ok(match self.field_type {
            FieldType::BOOLEAN => match s {
                "0" | "false" => CellValue::Bool(false),
                "1" | "true" => CellValue::Bool(true),
                _ => return Err(parse_fail()),
            },
            FieldType::INT8 => CellValue::Int8(s.parse().map_err(|_| parse_fail())?),
            FieldType::INT16 => CellValue::Int16(s.parse().map_err(|_| parse_fail())?),
            FieldType::INT32 => CellValue::Int32(s.parse().map_err(|_| parse_fail())?),
            FieldType::INT64 => CellValue::Int64(s.parse().map_err(|_| parse_fail())?),
            FieldType::UINT32 => CellValue::UInt32(s.parse().map_err(|_| parse_fail())?),
            FieldType::UINT64 => CellValue::UInt64(s.parse().map_err(|_| parse_fail())?),
            FieldType::FLOAT => CellValue::Float(s.parse().map_err(|_| parse_fail())?),
            FieldType::DOUBLE => CellValue::Double(s.parse().map_err(|_| parse_fail())?),
            FieldType::DATE => {
                let d = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| parse_fail())?;
                CellValue::Date(d.num_days_from_ce() - UNIX_EPOCH_DAY)
            }
            FieldType::DATETIME => {
                let d = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .map_err(|_| parse_fail())?;
                CellValue::DateTime(d.and_utc().timestamp_micros())
            }
            FieldType::DECIMAL => CellValue::Decimal(parse_decimal(s).ok_or_else(parse_fail)?),
            FieldType::CHAR
            | FieldType::VARCHAR
            | FieldType::STRING
            | FieldType::HLL
            | FieldType::OBJECT => CellValue::Bytes(Bytes::copy_from_slice(s.as_bytes())),
            FieldType::ARRAY => {
                return Err(unsupported_err!("cannot parse ARRAY from string"));
            }
        })
    }

    /// Renders a value back to its string form.
    pub fn to_string(&self, value: &CellValue) -> String {
        value.to_string()
    }

    /// Encodes a fixed-size value into its little-endian in-column
    /// representation. Binary values are not fixed-size and are handled
    /// by the caller.
    pub fn encode_fixed(&self, value: &CellValue) -> Result<Vec<u8>> {
        let bytes = match value {
            CellValue::Bool(v) => vec![*v as u8],
            CellValue::Int8(v) => v.to_le_bytes().to_vec(),
            CellValue::Int16(v) => v.to_le_bytes().to_vec(),
            CellValue::Int32(v) => v.to_le_bytes().to_vec(),
            CellValue::Int64(v) => v.to_le_bytes().to_vec(),
            CellValue::UInt32(v) => v.to_le_bytes().to_vec(),
            CellValue::UInt64(v) => v.to_le_bytes().to_vec(),
            CellValue::Float(v) => v.to_le_bytes().to_vec(),
            CellValue::Double(v) => v.to_le_bytes().to_vec(),
            CellValue::Date(v) => v.to_le_bytes().to_vec(),
            CellValue::DateTime(v) => v.to_le_bytes().to_vec(),
            CellValue::Decimal(v) => v.to_le_bytes().to_vec(),
            CellValue::Null | CellValue::Bytes(_) => {
                return Err(internal_err!(
                    "cannot encode {:?} as a fixed-size {} value",
                    value,
                    self.field_type
                ));
            }
        };
        if bytes.len() != self.size {
            return Err(internal_err!(
                "encoded size {} does not match element size {} for {}",
                bytes.len(),
                self.size,
                self.field_type
            ));
        }
        Ok(bytes)
    }
}

fn parse_decimal(s: &str) -> Option<i128> {
    let s = s.trim();
    let (sign, s) = match s.strip_prefix('-') {
        Some(rest) => (-1i128, rest),
        None => (1i128, s),
    };
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let int: i128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    let frac: i128 = if frac_part.is_empty() {
        0
    } else {
        if frac_part.len() > DECIMAL_FRAC_DIGITS as usize
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let padded = format!("{frac_part:0<9}");
        padded.parse().ok()?
    };
    Some(sign * (int * DECIMAL_FRAC_SCALE + frac))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(get_type_info(FieldType::INT32).unwrap().size(), 4);
        assert_eq!(get_type_info(FieldType::DECIMAL).unwrap().size(), 16);
        assert_eq!(get_type_info(FieldType::VARCHAR).unwrap().size(), 16);
        assert!(get_type_info(FieldType::ARRAY).is_err());
    }

    #[test]
    fn test_numeric_parse() {
        let ti = get_type_info(FieldType::INT32).unwrap();
        assert_eq!(ti.from_string("-42").unwrap(), CellValue::Int32(-42));
        assert!(ti.from_string("nope").is_err());

        let ti = get_type_info(FieldType::DOUBLE).unwrap();
        assert_eq!(ti.from_string("1.5").unwrap(), CellValue::Double(1.5));
    }

    #[test]
    fn test_temporal_parse_roundtrip() {
        let ti = get_type_info(FieldType::DATE).unwrap();
        let v = ti.from_string("1970-01-02").unwrap();
        assert_eq!(v, CellValue::Date(1));
        assert_eq!(ti.to_string(&v), "1970-01-02");

        let ti = get_type_info(FieldType::DATETIME).unwrap();
        let v = ti.from_string("1970-01-01 00:01:00").unwrap();
        assert_eq!(v, CellValue::DateTime(60_000_000));
        assert_eq!(ti.to_string(&v), "1970-01-01 00:01:00");
    }

    #[test]
    fn test_decimal_parse() {
        let ti = get_type_info(FieldType::DECIMAL).unwrap();
        assert_eq!(
            ti.from_string("12.5").unwrap(),
            CellValue::Decimal(12_500_000_000)
        );
        assert_eq!(
            ti.from_string("-3.000000001").unwrap(),
            CellValue::Decimal(-3_000_000_001)
        );
        assert_eq!(ti.from_string("7").unwrap(), CellValue::Decimal(7_000_000_000));
        assert!(ti.from_string("1.2345678901").is_err());
    }

    #[test]
    fn test_null_sorts_low() {
        use std::cmp::Ordering;
        assert_eq!(
            CellValue::Null.partial_cmp_value(&CellValue::Int32(i32::MIN)),
            Some(Ordering::Less)
        );
        assert_eq!(
            CellValue::Int32(1).partial_cmp_value(&CellValue::Null),
            Some(Ordering::Greater)
        );
        assert_eq!(
            CellValue::Null.partial_cmp_value(&CellValue::Null),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_encode_fixed() {
        let ti = get_type_info(FieldType::INT32).unwrap();
        assert_eq!(ti.encode_fixed(&CellValue::Int32(1)).unwrap(), vec![1, 0, 0, 0]);
        assert!(ti.encode_fixed(&CellValue::Null).is_err());
    }
}
