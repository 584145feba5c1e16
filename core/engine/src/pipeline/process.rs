//! 单条转写的处理流程

use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult, ErrorKind};
use crate::language::{is_cantonese, map_to_backend_code, CANTONESE_BACKEND_CODE};
use crate::nmt_client::TranslateRequest;
use crate::telemetry::TelemetryDatum;
use crate::types::{ConversationMessage, Provenance, TranscriptEvent};

use super::orchestrator::{PipelineInner, PipelineOrchestrator};

impl PipelineOrchestrator {
    /// 处理一个转写事件：记录原文，并交给翻译闸门
    pub async fn handle_transcript(&self, event: &TranscriptEvent) {
        self.inner.handle_transcript(event).await;
    }

    /// 翻译一段文本并（在开启时）朗读
    ///
    /// 返回写入历史的译文消息；与上一次处理的文本相同、或在处理中被拆除时返回 `None`。
    pub async fn translate_and_speak(
        &self,
        text: &str,
    ) -> EngineResult<Option<ConversationMessage>> {
        let cancel = self.inner.current_cancel().unwrap_or_else(CancellationToken::new);
        self.inner.translate_and_speak(text, &cancel).await
    }
}

impl PipelineInner {
    pub(crate) async fn handle_transcript(&self, event: &TranscriptEvent) {
        if event.text.trim().is_empty() {
            return;
        }

        let message =
            ConversationMessage::transcript(event.text.clone(), event.is_final, event.timestamp_ms);
        self.add_message(message.clone());
        self.publish_transcript_event(&message).await;

        match self.current_gate() {
            Some(gate) => {
                let decision = gate.submit(event);
                debug!(?decision, is_final = event.is_final, "transcript submitted to gate");
            }
            None => debug!("pipeline not running, transcript recorded only"),
        }
    }

    pub(crate) async fn translate_and_speak(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> EngineResult<Option<ConversationMessage>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        {
            let mut last = self.last_processed.lock();
            if last.as_deref() == Some(text) {
                debug!(text, "already translated, skipping");
                return Ok(None);
            }
            *last = Some(text.to_string());
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(text, "pipeline torn down, dropping in-flight item");
                Ok(None)
            }
            result = self.process_item(text) => result.map(Some),
        };
        if result.is_err() {
            // 失败的文本允许再次处理
            {
                let mut last = self.last_processed.lock();
                if last.as_deref() == Some(text) {
                    *last = None;
                }
            }
            if let Some(gate) = self.current_gate() {
                gate.forget(text);
            }
        }
        result
    }

    async fn process_item(&self, text: &str) -> EngineResult<ConversationMessage> {
        let settings = self.settings.read().clone();
        let source_cantonese = is_cantonese(&settings.input_language);
        let target_code = map_to_backend_code(&settings.target_language);
        let target_cantonese = target_code == CANTONESE_BACKEND_CODE;

        let translated = if source_cantonese {
            text.to_string()
        } else {
            let request = TranslateRequest {
                text: text.to_string(),
                target_language: target_code.clone(),
            };
            let started = Instant::now();
            match self
                .with_timeout("translation", self.translator.translate(&request))
                .await
            {
                Ok(response) => {
                    self.record("pipeline.translate_ms", started.elapsed()).await;
                    response.translated_text
                }
                Err(err) => {
                    self.report_error(err.clone()).await;
                    return Err(err);
                }
            }
        };

        let (content, cantonese, original_text) = if source_cantonese || target_cantonese {
            let started = Instant::now();
            match self
                .with_timeout("colloquialization", self.colloquializer.colloquialize(&translated))
                .await
            {
                Ok(processed) if !processed.trim().is_empty() => {
                    self.record("pipeline.colloquial_ms", started.elapsed()).await;
                    (processed, true, Some(translated))
                }
                Ok(_) => {
                    warn!("colloquialization returned empty text, using written form");
                    (translated, false, None)
                }
                Err(err) => {
                    warn!(error = %err, "colloquialization failed, using written form");
                    (translated, false, None)
                }
            }
        } else {
            (translated, false, None)
        };

        let message = ConversationMessage::translation(
            content.clone(),
            Provenance::Api,
            cantonese,
            original_text,
            self.clock.now_ms(),
        );
        self.add_message(message.clone());
        self.publish_translation_event(&message).await;
        info!(target = %settings.target_language, cantonese, "translation appended");

        if settings.speech_enabled {
            let started = Instant::now();
            self.publish_playback_event(&content, &settings.target_language).await;
            match self
                .playback
                .speak(&content, &settings.target_language, settings.gender)
                .await
            {
                Ok(()) => self.record("pipeline.tts_ms", started.elapsed()).await,
                Err(err) => self.report_error(err).await,
            }
        }

        Ok(message)
    }

    async fn with_timeout<T>(
        &self,
        service: &str,
        call: impl Future<Output = EngineResult<T>>,
    ) -> EngineResult<T> {
        match tokio::time::timeout(self.backend_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::new(
                ErrorKind::BackendTimeout,
                format!("{} timed out after {} ms", service, self.backend_timeout.as_millis()),
            )),
        }
    }

    async fn record(&self, name: &str, elapsed: Duration) {
        if let Err(err) = self
            .telemetry
            .record(TelemetryDatum::millis(name, elapsed.as_millis()))
            .await
        {
            debug!(error = %err, "telemetry record failed");
        }
    }

    /// 设置最近错误并发布；不会中断识别
    pub(crate) async fn report_error(&self, err: EngineError) {
        warn!(error = %err, kind = err.kind().as_str(), "pipeline error");
        self.publish_error_event(&err).await;
        self.last_error.send_replace(Some(err));
    }
}
