//! 会话历史（定长环形缓冲）

use std::collections::VecDeque;

use crate::types::{ConversationMessage, MessageKind};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: VecDeque<ConversationMessage>,
    capacity: usize,
}

impl ConversationHistory {
    /// 容量限制在 1..=100
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, DEFAULT_HISTORY_CAPACITY);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 追加消息；已满时先淘汰最旧的一条
    pub fn push(&mut self, message: ConversationMessage) {
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> Vec<ConversationMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.back()
    }

    /// 已确定的原文
    pub fn final_transcripts(&self) -> Vec<ConversationMessage> {
        self.messages
            .iter()
            .filter(|m| m.kind == MessageKind::Transcript && m.is_final)
            .cloned()
            .collect()
    }

    pub fn translations(&self) -> Vec<ConversationMessage> {
        self.messages
            .iter()
            .filter(|m| m.kind == MessageKind::Translation)
            .cloned()
            .collect()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let mut history = ConversationHistory::default();
        for i in 0..100 {
            history.push(ConversationMessage::transcript(format!("m{}", i), true, i));
        }
        assert_eq!(history.len(), 100);

        history.push(ConversationMessage::transcript("m100", true, 100));
        assert_eq!(history.len(), 100);
        let snapshot = history.snapshot();
        assert_eq!(snapshot[0].content, "m1");
        assert_eq!(snapshot[99].content, "m100");
    }

    #[test]
    fn capacity_never_exceeds_default() {
        let mut history = ConversationHistory::new(500);
        assert_eq!(history.capacity(), 100);
        for i in 0..150 {
            history.push(ConversationMessage::transcript(format!("m{}", i), true, i));
        }
        assert_eq!(history.len(), 100);
        assert_eq!(ConversationHistory::new(0).capacity(), 1);
    }

    #[test]
    fn filters_by_kind() {
        let mut history = ConversationHistory::new(10);
        history.push(ConversationMessage::transcript("你好", false, 1));
        history.push(ConversationMessage::transcript("你好呀", true, 2));
        history.push(ConversationMessage::translation(
            "hello",
            crate::types::Provenance::Api,
            false,
            None,
            3,
        ));
        assert_eq!(history.final_transcripts().len(), 1);
        assert_eq!(history.translations().len(), 1);

        history.clear();
        assert!(history.is_empty());
    }
}
