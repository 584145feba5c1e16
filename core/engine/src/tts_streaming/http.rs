//! TTS 后端 HTTP 客户端
//!
//! 请求体为 JSON，响应体为编码后的音频字节（通常是 MP3）。

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{SpeechSynthesizer, SynthesizedAudio, TtsRequest};
use crate::error::{EngineError, EngineResult};
use crate::language::{map_to_backend_code, map_to_tts_code};
use crate::types::VoiceGender;

const SERVICE: &str = "tts backend";

#[derive(Debug, Clone)]
pub struct HttpTtsConfig {
    /// HTTP 服务端点（例如：http://127.0.0.1:3000/api/tts）
    pub endpoint: String,
    pub api_key: Option<String>,
    /// 请求超时时间（毫秒）
    pub timeout_ms: u64,
}

impl Default for HttpTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api/tts".to_string(),
            api_key: None,
            timeout_ms: 8000,
        }
    }
}

pub struct HttpTtsClient {
    client: reqwest::Client,
    config: HttpTtsConfig,
}

impl HttpTtsClient {
    pub fn new(config: HttpTtsConfig) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EngineError::internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    gender: VoiceGender,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HttpTtsRequest<'a> {
    text: &'a str,
    /// 翻译后端代码（如 zh-HK）
    target_language: String,
    /// 语音区域代码（如 yue-HK）
    language_code: String,
    voice_config: VoiceConfig,
}

#[async_trait]
impl SpeechSynthesizer for HttpTtsClient {
    async fn synthesize(&self, request: TtsRequest) -> EngineResult<SynthesizedAudio> {
        let body = HttpTtsRequest {
            text: &request.text,
            target_language: map_to_backend_code(&request.language),
            language_code: map_to_tts_code(&request.language),
            voice_config: VoiceConfig {
                gender: request.gender,
            },
        };
        debug!(language = %body.language_code, gender = ?request.gender, "tts request");

        let mut request_builder = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .send()
            .await
            .map_err(|e| EngineError::from_http(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::from_status(SERVICE, status, &error_text));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let audio = response
            .bytes()
            .await
            .map_err(|e| EngineError::from_http(SERVICE, e))?
            .to_vec();

        if audio.is_empty() {
            return Err(EngineError::backend(format!("{} returned empty audio data", SERVICE)));
        }

        Ok(SynthesizedAudio {
            audio,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_tts_config_default() {
        let config = HttpTtsConfig::default();
        assert_eq!(config.endpoint, "http://127.0.0.1:3000/api/tts");
        assert_eq!(config.timeout_ms, 8000);
        assert!(HttpTtsClient::new(config).is_ok());
    }

    #[test]
    fn test_request_body_shape() {
        let body = HttpTtsRequest {
            text: "你好",
            target_language: map_to_backend_code("yue-HK"),
            language_code: map_to_tts_code("yue-HK"),
            voice_config: VoiceConfig {
                gender: VoiceGender::Female,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["targetLanguage"], "zh-HK");
        assert_eq!(json["languageCode"], "yue-HK");
        assert_eq!(json["voiceConfig"]["gender"], "FEMALE");
    }
}
