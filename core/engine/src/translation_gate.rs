//! 翻译闸门
//!
//! 对每个转写事件决定：立即翻译、去抖后翻译、或直接丢弃。
//!
//! 规则：
//! 1. 非空的最终结果总是触发翻译，并立即发出（同时取消尚未触发的中间结果）
//! 2. 中间结果只有在出现断句标点，或相对上次翻译新增的字数超过阈值时才触发
//! 3. 与上一次已翻译文本（去除首尾空白后）相同的文本不再翻译
//! 4. 中间结果使用尾沿去抖：间隔内连续到达的只保留最后一个
//!
//! `cancel()` 之后，已排期但未触发的调用保证不会再发出。

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::text_segmentation::PunctuationSet;
use crate::types::TranscriptEvent;

/// 闸门参数（字数阈值与标点集合属于产品调参项）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub debounce_ms: u64,
    /// 中间结果相对上次翻译新增超过该字数即可触发
    pub min_chars: usize,
    pub punctuation: PunctuationSet,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_chars: 20,
            punctuation: PunctuationSet::default(),
        }
    }
}

impl GateConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    Empty,
    Duplicate,
    NotQualifying,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// 立即发出
    Dispatch,
    /// 进入去抖等待
    Debounce,
    Suppress(SuppressReason),
}

/// 通过闸门、需要翻译的文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatedText {
    pub text: String,
    pub is_final: bool,
}

struct PendingCall {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct GateState {
    last_translated: Option<String>,
    pending: Option<PendingCall>,
    generation: u64,
    closed: bool,
}

impl GateState {
    fn abort_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }
}

pub struct TranslationGate {
    config: GateConfig,
    state: Arc<Mutex<GateState>>,
    output: mpsc::UnboundedSender<GatedText>,
}

impl TranslationGate {
    pub fn new(config: GateConfig) -> (Self, mpsc::UnboundedReceiver<GatedText>) {
        let (output, rx) = mpsc::unbounded_channel();
        let gate = Self {
            config,
            state: Arc::new(Mutex::new(GateState::default())),
            output,
        };
        (gate, rx)
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// 只做判定，不改变状态
    pub fn evaluate(&self, event: &TranscriptEvent) -> GateDecision {
        let state = self.state.lock();
        if state.closed {
            return GateDecision::Suppress(SuppressReason::Closed);
        }
        classify(&self.config, event, state.last_translated.as_deref())
    }

    /// 提交一个转写事件
    pub fn submit(&self, event: &TranscriptEvent) -> GateDecision {
        let mut state = self.state.lock();
        if state.closed {
            return GateDecision::Suppress(SuppressReason::Closed);
        }

        let decision = classify(&self.config, event, state.last_translated.as_deref());
        let text = event.text.trim().to_string();
        match decision {
            GateDecision::Dispatch => {
                state.abort_pending();
                state.last_translated = Some(text.clone());
                debug!(text = %text, "gate: dispatching final transcript");
                let _ = self.output.send(GatedText {
                    text,
                    is_final: true,
                });
            }
            GateDecision::Debounce => {
                state.abort_pending();
                state.generation += 1;
                let generation = state.generation;
                let handle = self.schedule(text, generation);
                state.pending = Some(PendingCall { generation, handle });
            }
            GateDecision::Suppress(reason) => {
                debug!(?reason, "gate: transcript suppressed");
            }
        }
        decision
    }

    fn schedule(&self, text: String, generation: u64) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let output = self.output.clone();
        let delay = self.config.debounce();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut state = state.lock();
            if state.closed || state.generation != generation {
                return;
            }
            if state.pending.as_ref().map(|p| p.generation) == Some(generation) {
                state.pending = None;
            }
            if state.last_translated.as_deref() == Some(text.as_str()) {
                return;
            }
            state.last_translated = Some(text.clone());
            debug!(text = %text, "gate: debounced interim fired");
            let _ = output.send(GatedText {
                text,
                is_final: false,
            });
        })
    }

    /// 是否有尚未触发的去抖调用
    pub fn has_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    pub fn last_translated(&self) -> Option<String> {
        self.state.lock().last_translated.clone()
    }

    /// 翻译失败时撤销去重记录，让同一文本可以再次通过
    pub fn forget(&self, text: &str) {
        let mut state = self.state.lock();
        if state.last_translated.as_deref() == Some(text.trim()) {
            state.last_translated = None;
        }
    }

    /// 清空去重记录（会话清空时使用）
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.abort_pending();
        state.last_translated = None;
    }

    /// 拆除闸门：取消等待中的调用，之后的提交全部丢弃
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.generation += 1;
        state.abort_pending();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl Drop for TranslationGate {
    fn drop(&mut self) {
        self.state.lock().abort_pending();
    }
}

fn classify(config: &GateConfig, event: &TranscriptEvent, last: Option<&str>) -> GateDecision {
    let text = event.text.trim();
    if text.is_empty() {
        return GateDecision::Suppress(SuppressReason::Empty);
    }
    if last == Some(text) {
        return GateDecision::Suppress(SuppressReason::Duplicate);
    }
    if event.is_final {
        return GateDecision::Dispatch;
    }

    if config.punctuation.has_boundary(text) || chars_since_last(text, last) > config.min_chars {
        GateDecision::Debounce
    } else {
        GateDecision::Suppress(SuppressReason::NotQualifying)
    }
}

/// 相对上次翻译文本新增的字符数；不是延续关系时按全文计算
fn chars_since_last(text: &str, last: Option<&str>) -> usize {
    match last {
        Some(prev) if !prev.is_empty() && text.starts_with(prev) => {
            text[prev.len()..].chars().count()
        }
        _ => text.chars().count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str, is_final: bool) -> TranscriptEvent {
        TranscriptEvent {
            text: text.to_string(),
            is_final,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn final_always_dispatches() {
        let config = GateConfig::default();
        assert_eq!(classify(&config, &event("好", true), None), GateDecision::Dispatch);
        assert_eq!(
            classify(&config, &event("   ", true), None),
            GateDecision::Suppress(SuppressReason::Empty)
        );
    }

    #[test]
    fn duplicate_of_last_translated_is_suppressed() {
        let config = GateConfig::default();
        assert_eq!(
            classify(&config, &event(" 明天去學校 ", true), Some("明天去學校")),
            GateDecision::Suppress(SuppressReason::Duplicate)
        );
    }

    #[test]
    fn interim_needs_punctuation_or_length() {
        let config = GateConfig {
            min_chars: 5,
            ..GateConfig::default()
        };
        assert_eq!(
            classify(&config, &event("hello", false), None),
            GateDecision::Suppress(SuppressReason::NotQualifying)
        );
        assert_eq!(classify(&config, &event("hello,", false), None), GateDecision::Debounce);
        assert_eq!(classify(&config, &event("hello there", false), None), GateDecision::Debounce);
        // 只统计上次翻译之后新增的部分
        assert_eq!(
            classify(&config, &event("hello there you", false), Some("hello there")),
            GateDecision::Suppress(SuppressReason::NotQualifying)
        );
    }

    #[tokio::test]
    async fn forget_allows_same_final_again() {
        let (gate, mut rx) = TranslationGate::new(GateConfig::default());
        assert_eq!(gate.submit(&event("good morning", true)), GateDecision::Dispatch);
        assert_eq!(
            gate.submit(&event("good morning", true)),
            GateDecision::Suppress(SuppressReason::Duplicate)
        );

        gate.forget("other text");
        assert_eq!(gate.last_translated().as_deref(), Some("good morning"));

        gate.forget(" good morning ");
        assert_eq!(gate.evaluate(&event("good morning", true)), GateDecision::Dispatch);
        assert_eq!(gate.submit(&event("good morning", true)), GateDecision::Dispatch);

        assert_eq!(rx.recv().await.unwrap().text, "good morning");
        assert_eq!(rx.recv().await.unwrap().text, "good morning");
    }

    #[test]
    fn chars_since_last_counts_unicode_scalars() {
        assert_eq!(chars_since_last("明天去學校", Some("明天")), 3);
        assert_eq!(chars_since_last("今日天氣", Some("明天")), 4);
        assert_eq!(chars_since_last("abc", None), 3);
    }
}
