use serde::{Deserialize, Serialize};

/// 识别引擎每次回调产生的转写事件（不保留）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub text: String,
    pub is_final: bool,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Transcript,
    Translation,
}

/// 翻译结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Api,
    Fallback,
}

/// 会话历史中的一条消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub kind: MessageKind,
    pub content: String,
    pub timestamp_ms: u64,
    pub is_final: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    #[serde(default)]
    pub is_cantonese: bool,
    /// 口语化之前的书面文本
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
}

impl ConversationMessage {
    pub fn transcript(content: impl Into<String>, is_final: bool, timestamp_ms: u64) -> Self {
        Self {
            kind: MessageKind::Transcript,
            content: content.into(),
            timestamp_ms,
            is_final,
            provenance: None,
            is_cantonese: false,
            original_text: None,
        }
    }

    pub fn translation(
        content: impl Into<String>,
        provenance: Provenance,
        is_cantonese: bool,
        original_text: Option<String>,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            kind: MessageKind::Translation,
            content: content.into(),
            timestamp_ms,
            is_final: true,
            provenance: Some(provenance),
            is_cantonese,
            original_text,
        }
    }
}

/// TTS 音色性别（线上名称与 SSML 一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VoiceGender {
    #[default]
    #[serde(rename = "SSML_VOICE_GENDER_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "MALE")]
    Male,
    #[serde(rename = "FEMALE")]
    Female,
    #[serde(rename = "NEUTRAL")]
    Neutral,
}

/// 对外暴露的播放状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TtsState {
    pub is_playing: bool,
    pub current_text: Option<String>,
}
