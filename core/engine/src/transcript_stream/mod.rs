//! 连续语音识别
//!
//! 识别引擎的回调被转换为 `RecognizerEvent` 通道，由 `TranscriptStream`
//! 驱动会话生命周期（启动、自动重启、停止）并向外广播 `StreamEvent`。

mod line;
mod stream;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, EngineResult, ErrorKind};
use crate::types::TranscriptEvent;

pub use line::LineRecognizer;
pub use stream::TranscriptStream;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl RecognitionConfig {
    /// 连续识别并返回中间结果
    pub fn continuous(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            continuous: true,
            interim_results: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

/// 识别引擎回调
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    Started,
    /// 本次回调携带的全部结果，只有最后一条会被使用
    Result(Vec<RecognitionResult>),
    /// 引擎错误码，例如 `no-speech`、`not-allowed`
    Error(String),
    Ended,
}

/// 一次识别会话
pub struct RecognitionSession {
    pub events: mpsc::UnboundedReceiver<RecognizerEvent>,
    /// 取消后引擎应停止识别
    pub cancel: CancellationToken,
}

#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// 运行环境是否提供识别能力
    fn is_supported(&self) -> bool;

    async fn start(&self, config: &RecognitionConfig) -> EngineResult<RecognitionSession>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamState {
    Stopped,
    Starting,
    Listening,
}

#[derive(Debug, Clone)]
pub enum StreamEvent {
    Transcript(TranscriptEvent),
    Error(EngineError),
    StateChanged(StreamState),
}

/// 将引擎错误码映射为错误类别
pub fn map_recognizer_error(code: &str) -> EngineError {
    match code {
        "not-allowed" | "service-not-allowed" => EngineError::new(
            ErrorKind::PermissionDenied,
            format!("microphone permission denied ({})", code),
        ),
        other => EngineError::new(
            ErrorKind::RecognitionError(other.to_string()),
            format!("recognition error: {}", other),
        ),
    }
}
