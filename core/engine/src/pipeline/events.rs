//! 事件发布
//!
//! 总线发布失败只记录日志，不影响当前条目。

use serde_json::{json, Value};
use tracing::warn;

use crate::error::EngineError;
use crate::event_bus::{CoreEvent, EventTopic};
use crate::types::ConversationMessage;

use super::orchestrator::PipelineInner;

impl PipelineInner {
    async fn publish(&self, topic: &str, payload: Value) {
        let event = CoreEvent {
            topic: EventTopic::new(topic),
            payload,
            timestamp_ms: self.clock.now_ms(),
        };
        if let Err(err) = self.event_bus.publish(event).await {
            warn!(topic, error = %err, "failed to publish event");
        }
    }

    pub(crate) async fn publish_transcript_event(&self, message: &ConversationMessage) {
        self.publish(
            EventTopic::TRANSCRIPT,
            json!({
                "text": message.content,
                "is_final": message.is_final,
            }),
        )
        .await;
    }

    pub(crate) async fn publish_translation_event(&self, message: &ConversationMessage) {
        self.publish(
            EventTopic::TRANSLATION,
            json!({
                "text": message.content,
                "is_cantonese": message.is_cantonese,
                "original_text": message.original_text,
            }),
        )
        .await;
    }

    pub(crate) async fn publish_playback_event(&self, text: &str, language: &str) {
        self.publish(
            EventTopic::PLAYBACK,
            json!({
                "text": text,
                "language": language,
            }),
        )
        .await;
    }

    pub(crate) async fn publish_error_event(&self, err: &EngineError) {
        self.publish(
            EventTopic::PIPELINE_ERROR,
            json!({
                "kind": err.kind().as_str(),
                "message": err.message(),
                "recoverable": err.kind().is_recoverable(),
            }),
        )
        .await;
    }
}
