// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::warn;

use symphonia_core::errors::{decode_error, unsupported_error, Result};

use crate::codec_ms::{decode_mono, decode_stereo, PREAMBLE_SIZE};
use crate::coeffs::resolve_coefficients;
use crate::error::{self, AdpcmError};

/// `BlockLayout` describes how a Microsoft ADPCM stream is divided into blocks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    channels: usize,
    block_align: usize,
    frames_per_block: usize,
}

impl BlockLayout {
    /// Derives the layout from the block alignment of the `fmt` chunk.
    pub fn from_block_align(block_align: usize, channels: usize) -> Result<Self> {
        check_channels(channels)?;

        if block_align <= PREAMBLE_SIZE * channels {
            return decode_error("msadpcm: block alignment leaves no room for samples");
        }

        let nibble_bytes = block_align - PREAMBLE_SIZE * channels;
        let frames_per_block = 2 * nibble_bytes / channels + 2;

        Ok(BlockLayout { channels, block_align, frames_per_block })
    }

    /// Derives the layout from the number of frames per block.
    pub fn from_frames_per_block(frames_per_block: usize, channels: usize) -> Result<Self> {
        check_channels(channels)?;

        if frames_per_block <= 2 {
            return decode_error("msadpcm: frames per block leaves no room for samples");
        }

        let nibbles = (frames_per_block - 2) * channels;

        if nibbles % 2 != 0 {
            return decode_error("msadpcm: frames per block is not a whole number of bytes");
        }

        let block_align = PREAMBLE_SIZE * channels + nibbles / 2;

        Ok(BlockLayout { channels, block_align, frames_per_block })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Gets the size in bytes of one block.
    pub fn block_align(&self) -> usize {
        self.block_align
    }

    /// Gets the number of frames decoded from one block.
    pub fn frames_per_block(&self) -> usize {
        self.frames_per_block
    }

    /// Gets the number of bytes of packed nibbles that follow the preamble of each block.
    pub fn nibble_bytes(&self) -> usize {
        self.block_align - PREAMBLE_SIZE * self.channels
    }

    /// Gets the number of whole blocks in `data_len` bytes.
    pub fn block_count(&self, data_len: usize) -> usize {
        data_len / self.block_align
    }

    /// Gets the number of samples, over all channels, that [`decode_stream`] produces for
    /// `data_len` bytes.
    pub fn sample_count(&self, data_len: usize) -> usize {
        self.block_count(data_len) * self.frames_per_block * self.channels
    }
}

fn check_channels(channels: usize) -> Result<()> {
    match channels {
        1 | 2 => Ok(()),
        _ => unsupported_error("msadpcm: only mono and stereo streams are supported"),
    }
}

/// Decodes every whole block of `data` into `out` and returns the number of samples written.
///
/// Blocks are written back-to-back. Stereo samples are interleaved. Trailing bytes that do not
/// form a whole block are ignored. All blocks are validated before any sample is written.
pub fn decode_stream(
    data: &[u8],
    layout: &BlockLayout,
    extra: &[i16],
    out: &mut [f32],
) -> error::Result<usize> {
    let remainder = data.len() % layout.block_align;

    if remainder != 0 {
        warn!("msadpcm: ignoring {} trailing bytes of a partial block", remainder);
    }

    let required = layout.sample_count(data.len());

    if out.len() < required {
        return Err(AdpcmError::BufferTooSmall { required, available: out.len() });
    }

    let blocks = data.chunks_exact(layout.block_align);

    // Predictor indices are the only block contents that can be invalid.
    for block in blocks.clone() {
        for &predictor in &block[..layout.channels] {
            resolve_coefficients(predictor, extra)?;
        }
    }

    let block_len = layout.frames_per_block * layout.channels;

    match layout.channels {
        1 => {
            for (block, out) in blocks.zip(out.chunks_exact_mut(block_len)) {
                decode_mono(block, extra, layout.frames_per_block, out)?;
            }
        }
        _ => {
            let mut left = vec![0.0; layout.frames_per_block];
            let mut right = vec![0.0; layout.frames_per_block];

            for (block, out) in blocks.zip(out.chunks_exact_mut(block_len)) {
                let planes = [&mut left[..], &mut right[..]];
                decode_stereo(block, extra, layout.frames_per_block, planes)?;

                for (frame, (l, r)) in out.chunks_exact_mut(2).zip(left.iter().zip(&right)) {
                    frame[0] = *l;
                    frame[1] = *r;
                }
            }
        }
    }

    Ok(required)
}
