// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Symphonia crates. Please see the workspace Cargo.toml for
// their justification.
#![allow(clippy::comparison_chain)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

use log::{debug, warn};

use symphonia_core::support_codec;

use symphonia_core::audio::{AsAudioBufferRef, AudioBuffer, AudioBufferRef, Signal, SignalSpec};
use symphonia_core::codecs::{CodecDescriptor, CodecParameters, CODEC_TYPE_ADPCM_MS};
use symphonia_core::codecs::{Decoder, DecoderOptions, FinalizeResult};
use symphonia_core::errors::{decode_error, unsupported_error, Error, Result};
use symphonia_core::formats::Packet;

mod codec_ms;
mod coeffs;
mod common;
mod error;
mod stream;

pub use codec_ms::{compute_delta, compute_sample, decode_block, decode_stereo_block};
pub use codec_ms::{Preamble, DELTA_MIN, PREAMBLE_SIZE};
pub use coeffs::{resolve_coefficients, CoefficientPair, MsAdpcmFormat};
pub use coeffs::{ADAPTATION_TABLE, STANDARD_COEFFICIENTS, STANDARD_PREDICTOR_COUNT};
pub use common::{normalize_i16, saturate, sign_extend_4, Nibble, Saturate};
pub use error::AdpcmError;
pub use stream::{decode_stream, BlockLayout};

/// Microsoft Adaptive Differential Pulse Code Modulation (ADPCM) decoder.
///
/// Decoded samples are normalized to `[-1.0, 1.0]`.
pub struct MsAdpcmDecoder {
    params: CodecParameters,
    layout: BlockLayout,
    extra: Vec<i16>,
    buf: AudioBuffer<f32>,
}

impl MsAdpcmDecoder {
    fn decode_inner(&mut self, packet: &Packet) -> Result<()> {
        let data = packet.buf();

        let block_align = self.layout.block_align();
        let frames_per_block = self.layout.frames_per_block();

        if data.len() % block_align != 0 {
            warn!("msadpcm: packet does not contain a whole number of blocks");
        }

        let block_count = self.layout.block_count(data.len());

        if block_count == 0 && !data.is_empty() {
            return decode_error("msadpcm: packet is shorter than one block");
        }

        if block_count * frames_per_block > self.buf.capacity() {
            return decode_error("msadpcm: packet exceeds maximum frames per packet");
        }

        self.buf.clear();
        self.buf.render_reserved(Some(block_count * frames_per_block));

        let blocks = data.chunks_exact(block_align);

        match self.layout.channels() {
            1 => {
                let buffer = self.buf.chan_mut(0);
                for (block, buffer) in blocks.zip(buffer.chunks_exact_mut(frames_per_block)) {
                    codec_ms::decode_mono(block, &self.extra, frames_per_block, buffer)?;
                }
            }
            2 => {
                let (left, right) = self.buf.chan_pair_mut(0, 1);
                let left = left.chunks_exact_mut(frames_per_block);
                let right = right.chunks_exact_mut(frames_per_block);
                for (block, (left, right)) in blocks.zip(left.zip(right)) {
                    codec_ms::decode_stereo(block, &self.extra, frames_per_block, [left, right])?;
                }
            }
            _ => unreachable!(),
        }

        Ok(())
    }
}

impl Decoder for MsAdpcmDecoder {
    fn try_new(params: &CodecParameters, _options: &DecoderOptions) -> Result<Self> {
        if params.codec != CODEC_TYPE_ADPCM_MS {
            return unsupported_error("msadpcm: invalid codec type");
        }

        let frames = match params.max_frames_per_packet {
            Some(frames) => frames,
            _ => return unsupported_error("msadpcm: maximum frames per packet is required"),
        };

        let frames_per_block = match params.frames_per_block {
            Some(frames_per_block) if frames_per_block > 0 => frames_per_block as usize,
            _ => return unsupported_error("msadpcm: valid frames per block is required"),
        };

        let rate = match params.sample_rate {
            Some(rate) => rate,
            _ => return unsupported_error("msadpcm: sample rate is required"),
        };

        let spec = if let Some(channels) = params.channels {
            SignalSpec::new(rate, channels)
        }
        else if let Some(layout) = params.channel_layout {
            SignalSpec::new_with_layout(rate, layout)
        }
        else {
            return unsupported_error("msadpcm: channels or channel_layout is required");
        };

        let channels = spec.channels.count();

        let layout = match BlockLayout::from_frames_per_block(frames_per_block, channels) {
            Ok(layout) => layout,
            Err(Error::DecodeError(_)) => {
                return unsupported_error("msadpcm: valid frames per block is required")
            }
            Err(err) => return Err(err),
        };

        if frames < frames_per_block as u64 {
            return unsupported_error(
                "msadpcm: maximum frames per packet is smaller than one block",
            );
        }

        let extra = match params.extra_data {
            Some(ref extra_data) => {
                let format = MsAdpcmFormat::from_extra_data(extra_data)?;

                if usize::from(format.samples_per_block) != frames_per_block {
                    warn!(
                        "msadpcm: format declares {} samples per block, expected {}",
                        format.samples_per_block, frames_per_block
                    );
                }

                format.extra_coefficients().to_vec()
            }
            None => Vec::new(),
        };

        debug!(
            "msadpcm: channels={}, block_align={}, frames_per_block={}, extra_predictors={}",
            layout.channels(),
            layout.block_align(),
            layout.frames_per_block(),
            extra.len() / 2
        );

        Ok(MsAdpcmDecoder {
            params: params.clone(),
            layout,
            extra,
            buf: AudioBuffer::new(frames, spec),
        })
    }

    fn supported_codecs() -> &'static [CodecDescriptor] {
        &[support_codec!(CODEC_TYPE_ADPCM_MS, "adpcm_ms", "Microsoft ADPCM")]
    }

    fn reset(&mut self) {
        // Every block carries its own preamble, therefore do nothing.
    }

    fn codec_params(&self) -> &CodecParameters {
        &self.params
    }

    fn decode(&mut self, packet: &Packet) -> Result<AudioBufferRef<'_>> {
        if let Err(e) = self.decode_inner(packet) {
            self.buf.clear();
            Err(e)
        }
        else {
            Ok(self.buf.as_audio_buffer_ref())
        }
    }

    fn finalize(&mut self) -> FinalizeResult {
        Default::default()
    }

    fn last_decoded(&self) -> AudioBufferRef<'_> {
        self.buf.as_audio_buffer_ref()
    }
}
