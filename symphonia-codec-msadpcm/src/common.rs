// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-point helpers shared by the block decoders.

/// The width of an encoded sample in bits.
pub const NIBBLE_BITS: u32 = 4;

/// `Nibble` represents the lower or upper 4 bits of a byte. The upper nibble is always decoded
/// first.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Nibble {
    Upper,
    Lower,
}

impl Nibble {
    pub fn get_nibble(self, byte: u8) -> u8 {
        match self {
            Nibble::Upper => byte >> NIBBLE_BITS,
            Nibble::Lower => byte & 0x0f,
        }
    }
}

/// Sign-extends a 4-bit two's-complement value to 16 bits. Only the lower 4 bits of `nibble` are
/// considered.
#[inline]
pub fn sign_extend_4(nibble: u8) -> i16 {
    const SHIFT: u32 = i16::BITS - NIBBLE_BITS;
    (i16::from(nibble & 0x0f) << SHIFT) >> SHIFT
}

/// Narrowing conversion from a wide intermediate that clamps to the bounds of the narrow type
/// instead of truncating.
pub trait Saturate<N> {
    fn saturate(self) -> N;
}

macro_rules! impl_saturate {
    ($wide:ty => $($narrow:ty),+) => {
        $(
            impl Saturate<$narrow> for $wide {
                #[inline]
                fn saturate(self) -> $narrow {
                    if self > <$wide>::from(<$narrow>::MAX) {
                        <$narrow>::MAX
                    }
                    else if self < <$wide>::from(<$narrow>::MIN) {
                        <$narrow>::MIN
                    }
                    else {
                        self as $narrow
                    }
                }
            }
        )+
    };
}

impl_saturate!(i32 => i16);
impl_saturate!(i64 => i16);

/// Free-function form of [`Saturate`], for call sites where naming the narrow type reads better.
#[inline]
pub fn saturate<W: Saturate<N>, N>(value: W) -> N {
    value.saturate()
}

/// Converts a 16-bit sample to a normalized float. Positive samples are scaled by `1 / 32767` and
/// negative samples by `1 / 32768`, so both extremes map to exactly 1.0 and -1.0.
#[inline]
pub fn normalize_i16(sample: i16) -> f32 {
    const POSITIVE_LIMIT: f32 = i16::MAX as f32;
    const NEGATIVE_LIMIT: f32 = -(i16::MIN as f32);

    let sample = f32::from(sample);

    if sample < 0.0 {
        sample / NEGATIVE_LIMIT
    }
    else {
        sample / POSITIVE_LIMIT
    }
}
