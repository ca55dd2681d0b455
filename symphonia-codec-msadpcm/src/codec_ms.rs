// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::coeffs::{resolve_coefficients, CoefficientPair, ADAPTATION_TABLE};
use crate::common::{normalize_i16, saturate, sign_extend_4, Nibble};
use crate::error::{AdpcmError, Result};

/// The size in bytes of a single channel's block preamble.
pub const PREAMBLE_SIZE: usize = 7;

/// The adaptive step size never falls below this value.
pub const DELTA_MIN: i16 = 16;

/// The number of samples stored verbatim in the preamble.
const SEED_SAMPLES: usize = 2;

/// `Preamble` is the per-channel header that begins every block.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Preamble {
    /// Predictor index selecting the coefficient pair for the block.
    pub predictor: u8,
    /// Step size used for the first nibble.
    pub initial_delta: i16,
    /// The most recent sample before the first nibble.
    pub current_sample: i16,
    /// The sample before `current_sample`.
    pub previous_sample: i16,
}

impl Preamble {
    /// Reads a mono preamble from the start of `buf`.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        match *buf {
            [predictor, d0, d1, c0, c1, p0, p1, ..] => Ok(Preamble {
                predictor,
                initial_delta: i16::from_le_bytes([d0, d1]),
                current_sample: i16::from_le_bytes([c0, c1]),
                previous_sample: i16::from_le_bytes([p0, p1]),
            }),
            _ => Err(AdpcmError::TruncatedBlock { required: PREAMBLE_SIZE, available: buf.len() }),
        }
    }

    /// Reads an interleaved stereo preamble from the start of `buf`. Each field is stored for the
    /// left channel, then the right channel, before moving on to the next field.
    pub fn from_stereo_bytes(buf: &[u8]) -> Result<[Self; 2]> {
        let required = 2 * PREAMBLE_SIZE;

        if buf.len() < required {
            return Err(AdpcmError::TruncatedBlock { required, available: buf.len() });
        }

        let read_i16 = |pos: usize| i16::from_le_bytes([buf[pos], buf[pos + 1]]);

        let left = Preamble {
            predictor: buf[0],
            initial_delta: read_i16(2),
            current_sample: read_i16(6),
            previous_sample: read_i16(10),
        };

        let right = Preamble {
            predictor: buf[1],
            initial_delta: read_i16(4),
            current_sample: read_i16(8),
            previous_sample: read_i16(12),
        };

        Ok([left, right])
    }
}

/// Predicts the next sample from the two most recent samples and applies the scaled nibble.
#[inline]
pub fn compute_sample(
    nibble: u8,
    current_sample: i16,
    previous_sample: i16,
    coeffs: CoefficientPair,
    delta: i16,
) -> i16 {
    // Extra coefficients may be arbitrary, so the weighted sum can exceed 32 bits.
    let weighted = i64::from(current_sample) * i64::from(coeffs.a)
        + i64::from(previous_sample) * i64::from(coeffs.b);

    let predictor = weighted / 256 + i64::from(delta) * i64::from(sign_extend_4(nibble));

    saturate(predictor)
}

/// Adapts the step size after decoding `nibble`.
#[inline]
pub fn compute_delta(nibble: u8, old_delta: i16) -> i16 {
    let scale = i32::from(ADAPTATION_TABLE[usize::from(nibble & 0x0f)]);
    let delta: i16 = saturate(scale * i32::from(old_delta) / 256);
    delta.max(DELTA_MIN)
}

/// `BlockState` holds the working registers of one channel while a block is decoded.
struct BlockState {
    coeffs: CoefficientPair,
    delta: i16,
    sample1: i16,
    sample2: i16,
}

impl BlockState {
    fn new(preamble: &Preamble, extra: &[i16]) -> Result<Self> {
        Ok(BlockState {
            coeffs: resolve_coefficients(preamble.predictor, extra)?,
            delta: preamble.initial_delta,
            sample1: preamble.current_sample,
            sample2: preamble.previous_sample,
        })
    }

    fn expand_nibble(&mut self, byte: u8, nibble: Nibble) -> f32 {
        let nibble = nibble.get_nibble(byte);
        let sample = compute_sample(nibble, self.sample1, self.sample2, self.coeffs, self.delta);
        self.delta = compute_delta(nibble, self.delta);
        self.sample2 = self.sample1;
        self.sample1 = sample;
        normalize_i16(sample)
    }
}

fn check_output(required: usize, available: usize) -> Result<()> {
    if available < required {
        return Err(AdpcmError::BufferTooSmall { required, available });
    }
    Ok(())
}

fn check_input(required: usize, available: usize) -> Result<()> {
    if available < required {
        return Err(AdpcmError::TruncatedBlock { required, available });
    }
    Ok(())
}

/// Decodes one mono block into `out` and returns the number of samples written.
///
/// The first two samples are the preamble's seed samples, oldest first. Each byte of `nibbles`
/// then yields two samples, upper nibble first. `sample_count` must be at least two and leave an
/// even number of samples after the seed. Nothing is written to `out` if an error is returned.
pub fn decode_block(
    preamble: &Preamble,
    nibbles: &[u8],
    extra: &[i16],
    sample_count: usize,
    out: &mut [f32],
) -> Result<usize> {
    if sample_count < SEED_SAMPLES || (sample_count - SEED_SAMPLES) % 2 != 0 {
        return Err(AdpcmError::InvalidSampleCount(sample_count));
    }

    let n_bytes = (sample_count - SEED_SAMPLES) / 2;

    let mut state = BlockState::new(preamble, extra)?;
    check_output(sample_count, out.len())?;
    check_input(n_bytes, nibbles.len())?;

    let (seed, rest) = out[..sample_count].split_at_mut(SEED_SAMPLES);

    seed[0] = normalize_i16(state.sample2);
    seed[1] = normalize_i16(state.sample1);

    for (&byte, pair) in nibbles[..n_bytes].iter().zip(rest.chunks_exact_mut(2)) {
        pair[0] = state.expand_nibble(byte, Nibble::Upper);
        pair[1] = state.expand_nibble(byte, Nibble::Lower);
    }

    Ok(sample_count)
}

/// Decodes one stereo block into a pair of planar channel buffers and returns the number of
/// frames written to each.
///
/// Each byte of `nibbles` yields one frame: the upper nibble for the left channel and the lower
/// nibble for the right channel. Nothing is written if an error is returned.
pub fn decode_stereo_block(
    preambles: &[Preamble; 2],
    nibbles: &[u8],
    extra: &[i16],
    frame_count: usize,
    out: [&mut [f32]; 2],
) -> Result<usize> {
    if frame_count < SEED_SAMPLES {
        return Err(AdpcmError::InvalidSampleCount(frame_count));
    }

    let n_bytes = frame_count - SEED_SAMPLES;

    let mut left = BlockState::new(&preambles[0], extra)?;
    let mut right = BlockState::new(&preambles[1], extra)?;
    check_output(frame_count, out[0].len().min(out[1].len()))?;
    check_input(n_bytes, nibbles.len())?;

    let [out_left, out_right] = out;

    out_left[0] = normalize_i16(left.sample2);
    out_left[1] = normalize_i16(left.sample1);
    out_right[0] = normalize_i16(right.sample2);
    out_right[1] = normalize_i16(right.sample1);

    for (frame, &byte) in (SEED_SAMPLES..frame_count).zip(nibbles) {
        out_left[frame] = left.expand_nibble(byte, Nibble::Upper);
        out_right[frame] = right.expand_nibble(byte, Nibble::Lower);
    }

    Ok(frame_count)
}

/// Decodes a complete mono block, preamble included.
pub(crate) fn decode_mono(
    block: &[u8],
    extra: &[i16],
    frames_per_block: usize,
    out: &mut [f32],
) -> Result<usize> {
    let preamble = Preamble::from_bytes(block)?;
    decode_block(&preamble, &block[PREAMBLE_SIZE..], extra, frames_per_block, out)
}

/// Decodes a complete stereo block, preamble included.
pub(crate) fn decode_stereo(
    block: &[u8],
    extra: &[i16],
    frames_per_block: usize,
    out: [&mut [f32]; 2],
) -> Result<usize> {
    let preambles = Preamble::from_stereo_bytes(block)?;
    decode_stereo_block(&preambles, &block[2 * PREAMBLE_SIZE..], extra, frames_per_block, out)
}
