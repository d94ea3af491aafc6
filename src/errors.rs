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

//! Common segment reader errors and macros.

use std::error::Error;
use std::{io, result};

/// Segment error enumeration
#[derive(Debug)]
pub enum SegmentError {
    /// General error. Returned when code violates the normal workflow of
    /// working with segment files.
    General(String),
    /// Field type, encoding or feature not handled by this reader.
    Unsupported(String),
    /// The segment file contents are malformed: bad index metadata,
    /// checksum mismatch, out-of-range dictionary codeword and the like.
    Corruption(String),
    /// A seek could not be satisfied, e.g. `seek_to_first` on an empty
    /// ordinal index.
    NotFound(String),
    /// The reader was driven into a state that is a bug on the caller's
    /// (or our) side rather than a property of the file.
    InternalError(String),
    /// Returned when there are not enough bytes left to decode.
    Eof(String),
    /// An external error variant, notably I/O failures from the block layer.
    External(Box<dyn Error + Send + Sync>),
}

impl std::fmt::Display for SegmentError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self {
            SegmentError::General(message) => write!(fmt, "Segment error: {message}"),
            SegmentError::Unsupported(message) => write!(fmt, "Unsupported: {message}"),
            SegmentError::Corruption(message) => write!(fmt, "Corruption: {message}"),
            SegmentError::NotFound(message) => write!(fmt, "Not found: {message}"),
            SegmentError::InternalError(message) => write!(fmt, "Internal error: {message}"),
            SegmentError::Eof(message) => write!(fmt, "EOF: {message}"),
            SegmentError::External(e) => write!(fmt, "External: {e}"),
        }
    }
}

impl Error for SegmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SegmentError::External(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for SegmentError {
    fn from(e: io::Error) -> SegmentError {
        SegmentError::External(Box::new(e))
    }
}

impl From<snap::Error> for SegmentError {
    fn from(e: snap::Error) -> SegmentError {
        SegmentError::External(Box::new(e))
    }
}

/// A specialized `Result` for segment errors.
pub type Result<T, E = SegmentError> = result::Result<T, E>;

impl From<SegmentError> for io::Error {
    fn from(e: SegmentError) -> Self {
        io::Error::new(io::ErrorKind::Other, e)
    }
}

// ----------------------------------------------------------------------
// Convenient macros for different errors

macro_rules! general_err {
    ($fmt:expr) => (crate::errors::SegmentError::General($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::SegmentError::General(format!($fmt, $($args),*)));
}

macro_rules! unsupported_err {
    ($fmt:expr) => (crate::errors::SegmentError::Unsupported($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::SegmentError::Unsupported(format!($fmt, $($args),*)));
}

macro_rules! corruption_err {
    ($fmt:expr) => (crate::errors::SegmentError::Corruption($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::SegmentError::Corruption(format!($fmt, $($args),*)));
}

macro_rules! not_found_err {
    ($fmt:expr) => (crate::errors::SegmentError::NotFound($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::SegmentError::NotFound(format!($fmt, $($args),*)));
}

macro_rules! internal_err {
    ($fmt:expr) => (crate::errors::SegmentError::InternalError($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::SegmentError::InternalError(format!($fmt, $($args),*)));
}

macro_rules! eof_err {
    ($fmt:expr) => (crate::errors::SegmentError::Eof($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::SegmentError::Eof(format!($fmt, $($args),*)));
}
