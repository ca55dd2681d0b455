// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::warn;

use symphonia_core::errors::{decode_error, Result};
use symphonia_core::io::{BufReader, FiniteStream, ReadBytes};

use crate::error::{self, preamble_error};

/// Step size multipliers (scaled by 256), indexed by the unsigned nibble value.
#[rustfmt::skip]
pub const ADAPTATION_TABLE: [i16; 16] = [
    230, 230, 230, 230, 307, 409, 512, 614,
    768, 614, 512, 409, 307, 230, 230, 230,
];

/// The number of predictors every Microsoft ADPCM decoder knows without being told.
pub const STANDARD_PREDICTOR_COUNT: usize = 7;

/// A pair of linear prediction coefficients, scaled by 256.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CoefficientPair {
    /// Weight of the most recent sample.
    pub a: i16,
    /// Weight of the sample before it.
    pub b: i16,
}

impl CoefficientPair {
    pub const fn new(a: i16, b: i16) -> Self {
        CoefficientPair { a, b }
    }
}

pub const STANDARD_COEFFICIENTS: [CoefficientPair; STANDARD_PREDICTOR_COUNT] = [
    CoefficientPair::new(256, 0),
    CoefficientPair::new(512, -256),
    CoefficientPair::new(0, 0),
    CoefficientPair::new(192, 64),
    CoefficientPair::new(240, 0),
    CoefficientPair::new(460, -208),
    CoefficientPair::new(392, -232),
];

/// Resolves a block predictor index to its coefficient pair.
///
/// Indices below [`STANDARD_PREDICTOR_COUNT`] select the built-in table. Larger indices select
/// a pair from `extra`, a flat `[a0, b0, a1, b1, ...]` table whose first pair belongs to index
/// [`STANDARD_PREDICTOR_COUNT`].
pub fn resolve_coefficients(predictor: u8, extra: &[i16]) -> error::Result<CoefficientPair> {
    let predictor = usize::from(predictor);

    if predictor < STANDARD_PREDICTOR_COUNT {
        return Ok(STANDARD_COEFFICIENTS[predictor]);
    }

    let offset = 2 * (predictor - STANDARD_PREDICTOR_COUNT);

    match extra.get(offset..offset + 2) {
        Some(&[a, b]) => Ok(CoefficientPair::new(a, b)),
        _ if extra.is_empty() => {
            preamble_error("msadpcm: block predictor exceeds range, no extra coefficients")
        }
        _ => preamble_error("msadpcm: block predictor exceeds extra coefficient table"),
    }
}

/// `MsAdpcmFormat` holds the fields of the `WAVE_FORMAT_ADPCM` format extension the decoder
/// depends on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MsAdpcmFormat {
    /// The number of frames encoded in each block, as declared by the encoder.
    pub samples_per_block: u16,
    /// Coefficients beyond the standard table, flattened as `[a0, b0, a1, b1, ...]`.
    extra: Vec<i16>,
}

impl MsAdpcmFormat {
    /// Parses the format extension (the bytes following `cbSize` in the `fmt` chunk).
    pub fn from_extra_data(extra_data: &[u8]) -> Result<Self> {
        let mut reader = BufReader::new(extra_data);

        let samples_per_block = reader.read_u16()?;
        let coeff_num = usize::from(reader.read_u16()?);

        if coeff_num < STANDARD_PREDICTOR_COUNT {
            return decode_error("msadpcm: fewer coefficients than the standard table");
        }

        if reader.bytes_available() < 4 * coeff_num as u64 {
            return decode_error("msadpcm: coefficient table is truncated");
        }

        let mut is_standard = true;

        for standard in STANDARD_COEFFICIENTS.iter() {
            let pair = CoefficientPair::new(reader.read_u16()? as i16, reader.read_u16()? as i16);
            is_standard &= pair == *standard;
        }

        if !is_standard {
            warn!("msadpcm: ignoring non-standard coefficients in the standard predictor range");
        }

        let mut extra = Vec::with_capacity(2 * (coeff_num - STANDARD_PREDICTOR_COUNT));

        for _ in STANDARD_PREDICTOR_COUNT..coeff_num {
            extra.push(reader.read_u16()? as i16);
            extra.push(reader.read_u16()? as i16);
        }

        Ok(MsAdpcmFormat { samples_per_block, extra })
    }

    /// Gets the flat table of coefficients beyond the standard table.
    pub fn extra_coefficients(&self) -> &[i16] {
        &self.extra
    }

    /// Gets the number of predictor indices a block may reference.
    pub fn predictor_count(&self) -> usize {
        STANDARD_PREDICTOR_COUNT + self.extra.len() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdpcmError;

    fn fmt_extension(samples_per_block: u16, pairs: &[(i16, i16)]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&samples_per_block.to_le_bytes());
        buf.extend_from_slice(&(pairs.len() as u16).to_le_bytes());
        for &(a, b) in pairs {
            buf.extend_from_slice(&a.to_le_bytes());
            buf.extend_from_slice(&b.to_le_bytes());
        }
        buf
    }

    fn standard_pairs() -> Vec<(i16, i16)> {
        STANDARD_COEFFICIENTS.iter().map(|pair| (pair.a, pair.b)).collect()
    }

    #[test]
    fn verify_standard_coefficients() {
        for (i, pair) in STANDARD_COEFFICIENTS.iter().enumerate() {
            assert_eq!(resolve_coefficients(i as u8, &[]), Ok(*pair));
        }
        assert_eq!(resolve_coefficients(0, &[]), Ok(CoefficientPair::new(256, 0)));
        assert_eq!(resolve_coefficients(6, &[]), Ok(CoefficientPair::new(392, -232)));
    }

    #[test]
    fn verify_extra_coefficients() {
        assert_eq!(resolve_coefficients(7, &[100, 50]), Ok(CoefficientPair::new(100, 50)));
        assert_eq!(resolve_coefficients(8, &[100, 50, -3, 9]), Ok(CoefficientPair::new(-3, 9)));

        match resolve_coefficients(8, &[100, 50]) {
            Err(AdpcmError::MalformedPreamble(_)) => {}
            r => panic!("Unexpected result {:?}", r),
        }

        // A dangling coefficient does not form a pair.
        match resolve_coefficients(8, &[100, 50, -3]) {
            Err(AdpcmError::MalformedPreamble(_)) => {}
            r => panic!("Unexpected result {:?}", r),
        }

        match resolve_coefficients(7, &[]) {
            Err(AdpcmError::MalformedPreamble(_)) => {}
            r => panic!("Unexpected result {:?}", r),
        }

        match resolve_coefficients(u8::MAX, &[1, 2]) {
            Err(AdpcmError::MalformedPreamble(_)) => {}
            r => panic!("Unexpected result {:?}", r),
        }
    }

    #[test]
    fn verify_format_standard() {
        let data = fmt_extension(500, &standard_pairs());
        let format = MsAdpcmFormat::from_extra_data(&data).unwrap();

        assert_eq!(format.samples_per_block, 500);
        assert!(format.extra_coefficients().is_empty());
        assert_eq!(format.predictor_count(), 7);
    }

    #[test]
    fn verify_format_extended() {
        let mut pairs = standard_pairs();
        pairs.push((100, 50));
        pairs.push((-512, 256));

        let data = fmt_extension(1012, &pairs);
        let format = MsAdpcmFormat::from_extra_data(&data).unwrap();

        assert_eq!(format.samples_per_block, 1012);
        assert_eq!(format.extra_coefficients(), &[100, 50, -512, 256]);
        assert_eq!(format.predictor_count(), 9);
        assert_eq!(
            resolve_coefficients(8, format.extra_coefficients()),
            Ok(CoefficientPair::new(-512, 256))
        );
    }

    #[test]
    fn verify_format_malformed() {
        let data = fmt_extension(500, &standard_pairs()[..6]);
        assert!(MsAdpcmFormat::from_extra_data(&data).is_err());

        let mut data = fmt_extension(500, &standard_pairs());
        data.truncate(data.len() - 1);
        assert!(MsAdpcmFormat::from_extra_data(&data).is_err());

        assert!(MsAdpcmFormat::from_extra_data(&[0xf4]).is_err());
    }
}
