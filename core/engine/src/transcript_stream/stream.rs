use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    map_recognizer_error, RecognitionConfig, RecognitionEngine, RecognitionSession,
    RecognizerEvent, StreamEvent, StreamState,
};
use crate::clock::Clock;
use crate::error::{EngineError, EngineResult, ErrorKind};
use crate::language::{adjust_for_recognition_platform, Platform};
use crate::types::TranscriptEvent;
use crate::volume_meter::VolumeMeter;

const EVENT_CAPACITY: usize = 256;

struct ActiveSession {
    id: u64,
    stop: CancellationToken,
}

struct StreamInner {
    engine: Arc<dyn RecognitionEngine>,
    clock: Arc<dyn Clock>,
    platform: Platform,
    volume_meter: Option<Arc<VolumeMeter>>,
    events: broadcast::Sender<StreamEvent>,
    state: watch::Sender<StreamState>,
    current: Mutex<Option<ActiveSession>>,
    next_id: AtomicU64,
    /// 每次 start() / stop() 递增；只在 `current` 锁内修改
    start_generation: AtomicU64,
}

impl StreamInner {
    fn is_current(&self, id: u64) -> bool {
        self.current.lock().as_ref().map(|s| s.id) == Some(id)
    }

    fn set_state(&self, state: StreamState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            debug!(?state, "transcript stream state changed");
            let _ = self.events.send(StreamEvent::StateChanged(state));
        }
    }

    fn emit_error(&self, err: EngineError) {
        warn!(error = %err, kind = err.kind().as_str(), "transcript stream error");
        let _ = self.events.send(StreamEvent::Error(err));
    }

    /// 会话自行结束（重启失败 / 权限被拒）时清理
    fn end_session(&self, id: u64) {
        let ended = {
            let mut current = self.current.lock();
            if current.as_ref().map(|s| s.id) != Some(id) {
                return;
            }
            current.take()
        };
        if let Some(session) = ended {
            session.stop.cancel();
        }
        if let Some(meter) = &self.volume_meter {
            meter.deactivate();
        }
        self.set_state(StreamState::Stopped);
    }
}

/// 转写流
pub struct TranscriptStream {
    inner: Arc<StreamInner>,
}

impl TranscriptStream {
    pub fn new(engine: Arc<dyn RecognitionEngine>, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (state, _) = watch::channel(StreamState::Stopped);
        Self {
            inner: Arc::new(StreamInner {
                engine,
                clock,
                platform: Platform::Desktop,
                volume_meter: None,
                events,
                state,
                current: Mutex::new(None),
                next_id: AtomicU64::new(0),
                start_generation: AtomicU64::new(0),
            }),
        }
    }

    /// 构造阶段设置；之后不可修改
    pub fn with_platform(mut self, platform: Platform) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.platform = platform;
        }
        self
    }

    pub fn with_volume_meter(mut self, meter: Arc<VolumeMeter>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.volume_meter = Some(meter);
        }
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.inner.events.subscribe()
    }

    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> StreamState {
        *self.inner.state.borrow()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == StreamState::Listening
    }

    pub fn volume_meter(&self) -> Option<&Arc<VolumeMeter>> {
        self.inner.volume_meter.as_ref()
    }

    /// 开始连续识别；已有会话时先停止
    ///
    /// # Arguments
    /// * `language` - 识别语言的区域代码（移动端会做平台替换）
    pub async fn start(&self, language: &str) -> EngineResult<()> {
        let inner = &self.inner;
        if !inner.engine.is_supported() {
            let err = EngineError::new(
                ErrorKind::CapabilityUnavailable,
                "speech recognition is not supported in this environment",
            );
            inner.emit_error(err.clone());
            return Err(err);
        }

        self.stop();
        let config = RecognitionConfig::continuous(adjust_for_recognition_platform(
            language,
            inner.platform,
        ));
        let generation = {
            let _current = inner.current.lock();
            inner.set_state(StreamState::Starting);
            inner.start_generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        info!(language = %config.language, "starting recognition");

        let session = match inner.engine.start(&config).await {
            Ok(session) => session,
            Err(err) => {
                if inner.start_generation.load(Ordering::SeqCst) != generation {
                    debug!(error = %err, "superseded start failed");
                    return Ok(());
                }
                inner.emit_error(err.clone());
                inner.set_state(StreamState::Stopped);
                return Err(err);
            }
        };

        let id = inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stop = CancellationToken::new();
        let mut current = inner.current.lock();
        // 等待引擎期间被 stop() 或新的 start() 取代
        if inner.start_generation.load(Ordering::SeqCst) != generation {
            drop(current);
            session.cancel.cancel();
            debug!("start superseded while engine was starting, session dropped");
            return Ok(());
        }
        if let Some(previous) = current.take() {
            // 并发 start：后到的会话生效
            previous.stop.cancel();
        }
        tokio::spawn(pump(Arc::clone(inner), id, config, session, stop.clone()));
        *current = Some(ActiveSession { id, stop });
        Ok(())
    }

    /// 停止识别并释放音量表，可重复调用
    pub fn stop(&self) {
        let previous = {
            let mut current = self.inner.current.lock();
            self.inner.start_generation.fetch_add(1, Ordering::SeqCst);
            current.take()
        };
        if let Some(session) = previous {
            info!(session = session.id, "stopping recognition");
            session.stop.cancel();
        }
        if let Some(meter) = &self.inner.volume_meter {
            meter.deactivate();
        }
        self.inner.set_state(StreamState::Stopped);
    }
}

impl Drop for TranscriptStream {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn pump(
    inner: Arc<StreamInner>,
    id: u64,
    config: RecognitionConfig,
    mut session: RecognitionSession,
    stop: CancellationToken,
) {
    // 音量表每次 start() 只尝试获取一次麦克风
    let mut meter_requested = false;
    loop {
        let event = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            event = session.events.recv() => event.unwrap_or(RecognizerEvent::Ended),
        };

        match event {
            RecognizerEvent::Started => {
                if !inner.is_current(id) {
                    break;
                }
                inner.set_state(StreamState::Listening);
                if let Some(meter) = inner.volume_meter.as_ref().filter(|_| !meter_requested) {
                    meter_requested = true;
                    if let Err(err) = meter.activate().await {
                        inner.emit_error(err);
                    } else if !inner.is_current(id) {
                        meter.deactivate();
                    }
                }
            }
            RecognizerEvent::Result(results) => {
                let Some(latest) = results.into_iter().last() else {
                    continue;
                };
                if !inner.is_current(id) {
                    break;
                }
                let _ = inner.events.send(StreamEvent::Transcript(TranscriptEvent {
                    text: latest.transcript,
                    is_final: latest.is_final,
                    timestamp_ms: inner.clock.now_ms(),
                }));
            }
            RecognizerEvent::Error(code) => {
                let err = map_recognizer_error(&code);
                let fatal = err.kind() == &ErrorKind::PermissionDenied;
                inner.emit_error(err);
                if fatal {
                    session.cancel.cancel();
                    inner.end_session(id);
                    return;
                }
            }
            RecognizerEvent::Ended => {
                session.cancel.cancel();
                // 已被 stop() 或新的 start() 替换的会话不重启
                if !inner.is_current(id) {
                    return;
                }
                inner.set_state(StreamState::Starting);
                debug!(session = id, "recognition ended, restarting");
                match inner.engine.start(&config).await {
                    Ok(next) if inner.is_current(id) => session = next,
                    Ok(next) => {
                        next.cancel.cancel();
                        return;
                    }
                    Err(err) => {
                        inner.emit_error(EngineError::new(
                            ErrorKind::RestartFailed,
                            format!("failed to restart recognition: {}", err),
                        ));
                        inner.end_session(id);
                        return;
                    }
                }
            }
        }
    }
    session.cancel.cancel();
}
