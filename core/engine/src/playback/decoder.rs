//! 合成音频解码

use std::io::Cursor;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{EngineError, EngineResult, ErrorKind};

/// 解码后的交错 f32 PCM
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as u64 / self.channels as u64;
        Duration::from_micros(frames * 1_000_000 / self.sample_rate as u64)
    }
}

pub trait AudioDecoder: Send + Sync {
    /// # Arguments
    /// * `bytes` - 编码后的音频
    /// * `mime_type` - 后端给出的 Content-Type，用作探测提示
    fn decode(&self, bytes: &[u8], mime_type: Option<&str>) -> EngineResult<DecodedAudio>;
}

fn decode_error(context: &str, err: impl std::fmt::Display) -> EngineError {
    EngineError::new(ErrorKind::DecodeError, format!("{}: {}", context, err))
}

/// 基于 symphonia 的解码器（MP3 / WAV）
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8], mime_type: Option<&str>) -> EngineResult<DecodedAudio> {
        if bytes.is_empty() {
            return Err(EngineError::new(ErrorKind::DecodeError, "empty audio payload"));
        }

        let source =
            MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
        let mut hint = Hint::new();
        if let Some(mime) = mime_type {
            hint.mime_type(mime);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, source, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| decode_error("unsupported audio format", e))?;
        let mut format = probed.format;

        let (track_id, codec_params) = {
            let track = format
                .tracks()
                .iter()
                .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
                .ok_or_else(|| {
                    EngineError::new(ErrorKind::DecodeError, "no decodable audio track")
                })?;
            (track.id, track.codec_params.clone())
        };

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| decode_error("unsupported codec", e))?;

        let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
        let mut channels = codec_params.channels.map(|c| c.count() as u16).unwrap_or(0);
        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(decode_error("failed to read packet", e)),
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(buffer) => {
                    let spec = *buffer.spec();
                    sample_rate = spec.rate;
                    channels = spec.channels.count() as u16;
                    let mut interleaved = SampleBuffer::<f32>::new(buffer.capacity() as u64, spec);
                    interleaved.copy_interleaved_ref(buffer);
                    samples.extend_from_slice(interleaved.samples());
                }
                // 单个损坏的帧跳过
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(e) => return Err(decode_error("failed to decode packet", e)),
            }
        }

        if samples.is_empty() || sample_rate == 0 || channels == 0 {
            return Err(EngineError::new(ErrorKind::DecodeError, "audio contained no samples"));
        }

        Ok(DecodedAudio {
            samples,
            sample_rate,
            channels,
        })
    }
}
