mod audio_utils;
mod http;
mod stub;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::types::VoiceGender;

pub use audio_utils::pcm_to_wav_bytes;
pub use http::{HttpTtsClient, HttpTtsConfig};
pub use stub::TtsStub;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    /// 区域代码（由实现自行映射为后端代码）
    pub language: String,
    pub gender: VoiceGender,
}

/// 合成结果：完整的编码音频（MP3 / WAV 等）
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub audio: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: TtsRequest) -> EngineResult<SynthesizedAudio>;
}
