//! 测试用的假后端与辅助函数

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

use interp_engine::colloquial_adapter::ColloquialAdapter;
use interp_engine::error::{EngineError, EngineResult, ErrorKind};
use interp_engine::nmt_client::{TranslateRequest, TranslateResponse, TranslationBackend};
use interp_engine::transcript_stream::{
    RecognitionConfig, RecognitionEngine, RecognitionResult, RecognitionSession, RecognizerEvent,
};
use interp_engine::tts_streaming::{SpeechSynthesizer, SynthesizedAudio, TtsRequest, TtsStub};

/// 轮询等待条件成立（最多约 2 秒）
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

pub fn result(text: &str, is_final: bool) -> RecognitionResult {
    RecognitionResult {
        transcript: text.to_string(),
        is_final,
    }
}

/// 可脚本化的识别引擎：每次 start 都生成一个新的事件通道
pub struct ScriptedRecognizer {
    supported: bool,
    /// 第 N 次（从 1 开始）及之后的 start 失败
    fail_from: Option<usize>,
    starts: Mutex<Vec<RecognitionConfig>>,
    sessions: Mutex<Vec<(mpsc::UnboundedSender<RecognizerEvent>, CancellationToken)>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self {
            supported: true,
            fail_from: None,
            starts: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn failing_from(attempt: usize) -> Self {
        Self {
            fail_from: Some(attempt),
            ..Self::new()
        }
    }

    pub fn start_count(&self) -> usize {
        self.starts.lock().len()
    }

    pub fn last_config(&self) -> Option<RecognitionConfig> {
        self.starts.lock().last().cloned()
    }

    /// 向第 `index` 个会话（从 0 开始）发送事件
    pub fn send(&self, index: usize, event: RecognizerEvent) {
        if let Some((tx, _)) = self.sessions.lock().get(index) {
            let _ = tx.send(event);
        }
    }

    pub fn send_latest(&self, event: RecognizerEvent) {
        if let Some((tx, _)) = self.sessions.lock().last() {
            let _ = tx.send(event);
        }
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        self.sessions
            .lock()
            .get(index)
            .map(|(_, cancel)| cancel.is_cancelled())
            .unwrap_or(false)
    }
}

#[async_trait]
impl RecognitionEngine for ScriptedRecognizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn start(&self, config: &RecognitionConfig) -> EngineResult<RecognitionSession> {
        let attempt = {
            let mut starts = self.starts.lock();
            starts.push(config.clone());
            starts.len()
        };
        if self.fail_from.map(|n| attempt >= n).unwrap_or(false) {
            return Err(EngineError::new(
                ErrorKind::RecognitionError("aborted".to_string()),
                "engine refused to start",
            ));
        }

        let (tx, events) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        self.sessions.lock().push((tx, cancel.clone()));
        Ok(RecognitionSession { events, cancel })
    }
}

/// start 会一直挂起，直到测试调用 `release()`
pub struct BlockingRecognizer {
    release: Notify,
    entered: Notify,
    sessions: Mutex<Vec<(mpsc::UnboundedSender<RecognizerEvent>, CancellationToken)>>,
}

impl BlockingRecognizer {
    pub fn new() -> Self {
        Self {
            release: Notify::new(),
            entered: Notify::new(),
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// 等待某次 start 进入挂起状态
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn send_latest(&self, event: RecognizerEvent) {
        if let Some((tx, _)) = self.sessions.lock().last() {
            let _ = tx.send(event);
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        self.sessions
            .lock()
            .get(index)
            .map(|(_, cancel)| cancel.is_cancelled())
            .unwrap_or(false)
    }
}

#[async_trait]
impl RecognitionEngine for BlockingRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn start(&self, _config: &RecognitionConfig) -> EngineResult<RecognitionSession> {
        self.entered.notify_one();
        self.release.notified().await;

        let (tx, events) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        self.sessions.lock().push((tx, cancel.clone()));
        Ok(RecognitionSession { events, cancel })
    }
}

/// 翻译后端替身
pub struct FakeTranslator {
    reply: Option<String>,
    delay: Duration,
    requests: Mutex<Vec<TranslateRequest>>,
}

impl FakeTranslator {
    /// 返回 `[目标语言] 原文`
    pub fn echo() -> Self {
        Self {
            reply: None,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            ..Self::echo()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::echo()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<TranslateRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl TranslationBackend for FakeTranslator {
    async fn translate(&self, req: &TranslateRequest) -> EngineResult<TranslateResponse> {
        self.requests.lock().push(req.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let translated_text = self
            .reply
            .clone()
            .unwrap_or_else(|| format!("[{}] {}", req.target_language, req.text));
        Ok(TranslateResponse { translated_text })
    }
}

/// 总是失败的翻译后端
pub struct FailingTranslator {
    pub kind: ErrorKind,
}

#[async_trait]
impl TranslationBackend for FailingTranslator {
    async fn translate(&self, _req: &TranslateRequest) -> EngineResult<TranslateResponse> {
        Err(EngineError::new(self.kind.clone(), "translation backend unavailable"))
    }
}

/// 前 N 次调用失败、之后正常回显的翻译后端
pub struct FlakyTranslator {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyTranslator {
    pub fn failing_times(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationBackend for FlakyTranslator {
    async fn translate(&self, req: &TranslateRequest) -> EngineResult<TranslateResponse> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(EngineError::backend("translation service returned 503"));
        }
        Ok(TranslateResponse {
            translated_text: format!("[{}] {}", req.target_language, req.text),
        })
    }
}

/// 口语化替身
pub struct FakeColloquial {
    reply: EngineResult<String>,
    calls: AtomicUsize,
}

impl FakeColloquial {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(EngineError::backend("colloquial service returned 500")),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ColloquialAdapter for FakeColloquial {
    async fn colloquialize(&self, _text: &str) -> EngineResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

/// 记录请求的合成器，音频来自 `TtsStub`
pub struct RecordingSynthesizer {
    inner: TtsStub,
    requests: Mutex<Vec<TtsRequest>>,
}

impl RecordingSynthesizer {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            inner: TtsStub::with_duration_ms(duration_ms),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<TtsRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynthesizer {
    async fn synthesize(&self, request: TtsRequest) -> EngineResult<SynthesizedAudio> {
        self.requests.lock().push(request.clone());
        self.inner.synthesize(request).await
    }
}

/// 返回固定字节的合成器
pub struct FixedSynthesizer {
    pub audio: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
impl SpeechSynthesizer for FixedSynthesizer {
    async fn synthesize(&self, _request: TtsRequest) -> EngineResult<SynthesizedAudio> {
        Ok(SynthesizedAudio {
            audio: self.audio.clone(),
            content_type: self.content_type.clone(),
        })
    }
}

pub fn arc<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
