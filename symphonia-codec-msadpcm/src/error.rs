// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `error` module defines the errors reported by the block decoders.

use std::error;
use std::fmt;
use std::result;

use symphonia_core::errors::Error;

/// `AdpcmError` enumerates the ways a block decode can be rejected. Every error is detected before
/// any output sample is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdpcmError {
    /// The block predictor index could not be resolved to a coefficient pair.
    MalformedPreamble(&'static str),
    /// The requested per-block sample count is zero, less than the two seed samples, or leaves an
    /// odd number of samples after the seed.
    InvalidSampleCount(usize),
    /// The output buffer cannot hold the requested number of samples.
    BufferTooSmall { required: usize, available: usize },
    /// The encoded block is shorter than the requested number of samples requires.
    TruncatedBlock { required: usize, available: usize },
}

impl AdpcmError {
    fn as_str(&self) -> &'static str {
        match *self {
            AdpcmError::MalformedPreamble(desc) => desc,
            AdpcmError::InvalidSampleCount(_) => "msadpcm: invalid samples per block",
            AdpcmError::BufferTooSmall { .. } => "msadpcm: output buffer too small",
            AdpcmError::TruncatedBlock { .. } => "msadpcm: truncated block",
        }
    }
}

impl fmt::Display for AdpcmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            AdpcmError::MalformedPreamble(desc) => {
                write!(f, "malformed preamble: {}", desc)
            }
            AdpcmError::InvalidSampleCount(count) => {
                write!(f, "invalid sample count: {}", count)
            }
            AdpcmError::BufferTooSmall { required, available } => write!(
                f,
                "buffer too small: {} samples required, {} available",
                required, available
            ),
            AdpcmError::TruncatedBlock { required, available } => {
                write!(f, "truncated block: {} bytes required, {} available", required, available)
            }
        }
    }
}

impl error::Error for AdpcmError {}

impl From<AdpcmError> for Error {
    fn from(err: AdpcmError) -> Error {
        Error::DecodeError(err.as_str())
    }
}

pub type Result<T> = result::Result<T, AdpcmError>;

/// Convenience function to create a malformed preamble error.
pub fn preamble_error<T>(desc: &'static str) -> Result<T> {
    Err(AdpcmError::MalformedPreamble(desc))
}
