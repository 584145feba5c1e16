use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::colloquial_adapter::ColloquialAdapter;
use crate::error::EngineError;
use crate::event_bus::EventBus;
use crate::history::ConversationHistory;
use crate::nmt_client::TranslationBackend;
use crate::playback::PlaybackController;
use crate::telemetry::TelemetrySink;
use crate::transcript_stream::TranscriptStream;
use crate::translation_gate::{GateConfig, TranslationGate};
use crate::types::{ConversationMessage, VoiceGender};

/// 运行时可修改的设置
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub input_language: String,
    pub target_language: String,
    pub speech_enabled: bool,
    pub gender: VoiceGender,
}

/// `boot()` 之后才存在的运行状态
pub(crate) struct RunningPipeline {
    pub(crate) gate: Arc<TranslationGate>,
    pub(crate) cancel: CancellationToken,
}

pub(crate) struct PipelineInner {
    pub(crate) translator: Arc<dyn TranslationBackend>,
    pub(crate) colloquializer: Arc<dyn ColloquialAdapter>,
    pub(crate) playback: Arc<PlaybackController>,
    pub(crate) stream: Arc<TranscriptStream>,
    pub(crate) event_bus: Arc<dyn EventBus>,
    pub(crate) telemetry: Arc<dyn TelemetrySink>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) gate_config: GateConfig,
    pub(crate) backend_timeout: Duration,
    pub(crate) settings: RwLock<PipelineSettings>,
    pub(crate) history: Mutex<ConversationHistory>,
    /// 最近一次直接处理过的文本
    pub(crate) last_processed: Mutex<Option<String>>,
    pub(crate) last_error: watch::Sender<Option<EngineError>>,
    pub(crate) running: Mutex<Option<RunningPipeline>>,
}

/// 流水线编排器
#[derive(Clone)]
pub struct PipelineOrchestrator {
    pub(crate) inner: Arc<PipelineInner>,
}

impl PipelineOrchestrator {
    /// 追加一条消息（超出容量时淘汰最旧的）
    pub fn add_message(&self, message: ConversationMessage) {
        self.inner.add_message(message);
    }

    /// 清空会话与去重记录
    pub fn clear_conversation(&self) {
        self.inner.history.lock().clear();
        *self.inner.last_processed.lock() = None;
        if let Some(running) = self.inner.running.lock().as_ref() {
            running.gate.reset();
        }
    }

    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.inner.history.lock().snapshot()
    }

    pub fn final_transcripts(&self) -> Vec<ConversationMessage> {
        self.inner.history.lock().final_transcripts()
    }

    pub fn translations(&self) -> Vec<ConversationMessage> {
        self.inner.history.lock().translations()
    }

    pub fn settings(&self) -> PipelineSettings {
        self.inner.settings.read().clone()
    }

    pub fn set_target_language(&self, language: impl Into<String>) {
        self.inner.settings.write().target_language = language.into();
    }

    pub fn set_speech_enabled(&self, enabled: bool) {
        self.inner.settings.write().speech_enabled = enabled;
        self.inner.playback.set_enabled(enabled);
    }

    pub fn set_voice_gender(&self, gender: VoiceGender) {
        self.inner.settings.write().gender = gender;
    }

    pub fn last_error(&self) -> Option<EngineError> {
        self.inner.last_error.borrow().clone()
    }

    pub fn watch_errors(&self) -> watch::Receiver<Option<EngineError>> {
        self.inner.last_error.subscribe()
    }

    pub fn clear_error(&self) {
        self.inner.last_error.send_replace(None);
    }

    pub fn is_listening(&self) -> bool {
        self.inner.stream.is_listening()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.lock().is_some()
    }

    pub fn playback(&self) -> &Arc<PlaybackController> {
        &self.inner.playback
    }

    pub fn transcript_stream(&self) -> &Arc<TranscriptStream> {
        &self.inner.stream
    }
}

impl PipelineInner {
    pub(crate) fn add_message(&self, message: ConversationMessage) {
        self.history.lock().push(message);
    }

    pub(crate) fn current_gate(&self) -> Option<Arc<TranslationGate>> {
        self.running.lock().as_ref().map(|r| Arc::clone(&r.gate))
    }

    pub(crate) fn current_cancel(&self) -> Option<CancellationToken> {
        self.running.lock().as_ref().map(|r| r.cancel.clone())
    }
}
