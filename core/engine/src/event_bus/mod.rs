mod channel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

pub use channel::ChannelEventBus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreEvent {
    pub topic: EventTopic,
    pub payload: serde_json::Value,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EventTopic(pub String);

impl EventTopic {
    pub const TRANSCRIPT: &'static str = "Transcript";
    pub const TRANSLATION: &'static str = "Translation";
    pub const PIPELINE_ERROR: &'static str = "PipelineError";
    pub const PLAYBACK: &'static str = "Playback";

    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSubscription {
    pub topic: EventTopic,
}

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn start(&self) -> EngineResult<()>;
    async fn stop(&self) -> EngineResult<()>;
    async fn publish(&self, event: CoreEvent) -> EngineResult<()>;
    async fn subscribe(&self, topic: EventTopic) -> EngineResult<EventSubscription>;
}

/// 不做任何分发的事件总线
pub struct NullEventBus;

#[async_trait]
impl EventBus for NullEventBus {
    async fn start(&self) -> EngineResult<()> {
        Ok(())
    }

    async fn stop(&self) -> EngineResult<()> {
        Ok(())
    }

    async fn publish(&self, _event: CoreEvent) -> EngineResult<()> {
        Ok(())
    }

    async fn subscribe(&self, topic: EventTopic) -> EngineResult<EventSubscription> {
        Ok(EventSubscription { topic })
    }
}
