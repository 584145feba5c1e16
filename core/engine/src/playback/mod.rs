//! 播放控制
//!
//! 同一时间只有一个播放会话。新的 `speak` 会先停止并释放上一个会话；
//! 完成、解码失败、网络失败、`stop()` 以及控制器销毁都会释放输出资源。
//!
//! 状态：`Idle → Requesting → Playing → Idle`，任何错误都回到 `Idle`。

mod decoder;
mod output;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult, ErrorKind};
use crate::tts_streaming::{SpeechSynthesizer, TtsRequest};
use crate::types::{TtsState, VoiceGender};

pub use decoder::{AudioDecoder, DecodedAudio, SymphoniaDecoder};
pub use output::{AudioOutput, PlaybackHandle, SilentOutput};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    /// 等待 TTS 后端返回
    Requesting,
    Playing,
}

struct Session {
    id: u64,
    handle: Option<PlaybackHandle>,
}

struct ControllerState {
    phase: PlaybackState,
    session: Option<Session>,
    next_id: u64,
}

struct Shared {
    state: Mutex<ControllerState>,
    tts_state: watch::Sender<TtsState>,
}

impl Shared {
    fn begin(&self, text: &str) -> u64 {
        let (id, previous) = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            let previous = state.session.replace(Session { id, handle: None });
            state.phase = PlaybackState::Requesting;
            (id, previous)
        };
        if let Some(previous) = previous {
            debug!(session = previous.id, "superseding playback session");
        }
        self.tts_state.send_replace(TtsState {
            is_playing: true,
            current_text: Some(text.to_string()),
        });
        id
    }

    fn is_current(&self, id: u64) -> bool {
        self.state.lock().session.as_ref().map(|s| s.id) == Some(id)
    }

    /// 挂上输出句柄；会话已被替换时返回 false，句柄随即释放
    fn attach(&self, id: u64, handle: PlaybackHandle) -> bool {
        let mut state = self.state.lock();
        match state.session.as_mut() {
            Some(session) if session.id == id => {
                session.handle = Some(handle);
                state.phase = PlaybackState::Playing;
                true
            }
            _ => false,
        }
    }

    /// 结束指定会话（仍为当前会话时）
    fn finish(&self, id: u64) -> bool {
        let ended = {
            let mut state = self.state.lock();
            if state.session.as_ref().map(|s| s.id) != Some(id) {
                return false;
            }
            state.phase = PlaybackState::Idle;
            state.session.take()
        };
        drop(ended);
        self.tts_state.send_replace(TtsState::default());
        true
    }

    fn finish_current(&self) {
        let ended = {
            let mut state = self.state.lock();
            state.phase = PlaybackState::Idle;
            state.session.take()
        };
        if let Some(session) = ended {
            debug!(session = session.id, "playback session released");
        }
        self.tts_state.send_replace(TtsState::default());
    }
}

pub struct PlaybackController {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    decoder: Arc<dyn AudioDecoder>,
    output: Arc<dyn AudioOutput>,
    enabled: AtomicBool,
    request_timeout: Duration,
    shared: Arc<Shared>,
}

impl PlaybackController {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        decoder: Arc<dyn AudioDecoder>,
        output: Arc<dyn AudioOutput>,
    ) -> Self {
        let (tts_state, _) = watch::channel(TtsState::default());
        Self {
            synthesizer,
            decoder,
            output,
            enabled: AtomicBool::new(true),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            shared: Arc::new(Shared {
                state: Mutex::new(ControllerState {
                    phase: PlaybackState::Idle,
                    session: None,
                    next_id: 0,
                }),
                tts_state,
            }),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.stop();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.state.lock().phase
    }

    pub fn tts_state(&self) -> TtsState {
        self.shared.tts_state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TtsState> {
        self.shared.tts_state.subscribe()
    }

    /// 合成并播放一段文本，播放开始后返回
    ///
    /// # Arguments
    /// * `language` - 目标语言的区域代码
    pub async fn speak(&self, text: &str, language: &str, gender: VoiceGender) -> EngineResult<()> {
        let text = text.trim();
        if !self.is_enabled() || text.is_empty() {
            return Ok(());
        }

        let id = self.shared.begin(text);
        info!(session = id, language, "speak requested");

        match self.play_session(id, text, language, gender).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(session = id, error = %err, kind = err.kind().as_str(), "playback failed");
                self.shared.finish(id);
                Err(err)
            }
        }
    }

    async fn play_session(
        &self,
        id: u64,
        text: &str,
        language: &str,
        gender: VoiceGender,
    ) -> EngineResult<()> {
        let request = TtsRequest {
            text: text.to_string(),
            language: language.to_string(),
            gender,
        };
        let synthesized =
            tokio::time::timeout(self.request_timeout, self.synthesizer.synthesize(request))
                .await
                .map_err(|_| {
                    EngineError::new(ErrorKind::BackendTimeout, "tts request timed out")
                })??;

        if !self.shared.is_current(id) {
            debug!(session = id, "tts result dropped, session superseded");
            return Ok(());
        }

        let decoder = Arc::clone(&self.decoder);
        let audio = tokio::task::spawn_blocking(move || {
            decoder.decode(&synthesized.audio, synthesized.content_type.as_deref())
        })
        .await
        .map_err(|e| EngineError::internal(format!("decode task failed: {}", e)))??;

        let mut handle = self.output.play(audio)?;
        let done = handle.take_done();
        if !self.shared.attach(id, handle) {
            debug!(session = id, "playback superseded before start");
            return Ok(());
        }

        if let Some(done) = done {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                if done.await.is_ok() && shared.finish(id) {
                    debug!(session = id, "playback finished");
                }
            });
        }
        Ok(())
    }

    /// 输出端报告播放结束
    pub fn on_playback_end(&self) {
        self.shared.finish_current();
    }

    /// 停止当前播放并释放资源，可重复调用
    pub fn stop(&self) {
        self.shared.finish_current();
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shared.finish_current();
    }
}
