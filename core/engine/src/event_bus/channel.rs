//! 基于 Channel 的事件总线实现
//!
//! 按 topic 把事件分发给各订阅者的 `mpsc` 接收端；订阅者断开后自动清理。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use super::{CoreEvent, EventSubscription, EventTopic};
use crate::error::EngineResult;

pub struct ChannelEventBus {
    /// 订阅者注册表（topic -> 发送端列表）
    subscribers: RwLock<HashMap<String, Vec<mpsc::UnboundedSender<CoreEvent>>>>,
    started: AtomicBool,
}

impl ChannelEventBus {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            started: AtomicBool::new(false),
        }
    }

    /// 订阅指定 topic，返回接收端
    pub fn subscribe_receiver(&self, topic: EventTopic) -> mpsc::UnboundedReceiver<CoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().entry(topic.0).or_default().push(tx);
        rx
    }

    pub fn subscriber_count(&self, topic: &EventTopic) -> usize {
        self.subscribers.read().get(&topic.0).map(Vec::len).unwrap_or(0)
    }

    fn dispatch(&self, event: CoreEvent) {
        let topic = event.topic.0.clone();
        let mut subscribers = self.subscribers.write();
        let Some(subs) = subscribers.get_mut(&topic) else {
            return;
        };

        subs.retain(|sub| sub.send(event.clone()).is_ok());
        if subs.is_empty() {
            subscribers.remove(&topic);
        }
    }
}

impl Default for ChannelEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::EventBus for ChannelEventBus {
    async fn start(&self) -> EngineResult<()> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> EngineResult<()> {
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn publish(&self, event: CoreEvent) -> EngineResult<()> {
        if !self.started.load(Ordering::SeqCst) {
            debug!(topic = %event.topic.0, "event bus stopped, dropping event");
            return Ok(());
        }
        self.dispatch(event);
        Ok(())
    }

    async fn subscribe(&self, topic: EventTopic) -> EngineResult<EventSubscription> {
        Ok(EventSubscription { topic })
    }
}
