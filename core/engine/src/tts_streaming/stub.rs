use async_trait::async_trait;

use super::{pcm_to_wav_bytes, SpeechSynthesizer, SynthesizedAudio, TtsRequest};
use crate::error::EngineResult;

/// 返回一段静音 WAV 的 TTS 实现（用于离线运行和测试）
pub struct TtsStub {
    duration_ms: u32,
}

impl TtsStub {
    pub fn new() -> Self {
        Self { duration_ms: 200 }
    }

    pub fn with_duration_ms(duration_ms: u32) -> Self {
        Self { duration_ms }
    }
}

impl Default for TtsStub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for TtsStub {
    async fn synthesize(&self, _request: TtsRequest) -> EngineResult<SynthesizedAudio> {
        let sample_rate = 16000u32;
        let samples = (sample_rate as u64 * self.duration_ms as u64 / 1000) as usize;
        let pcm = vec![0u8; samples * 2];
        Ok(SynthesizedAudio {
            audio: pcm_to_wav_bytes(&pcm, sample_rate, 1),
            content_type: Some("audio/wav".to_string()),
        })
    }
}
