//! 流水线编排
//!
//! 转写流 → 翻译闸门 → 翻译 → [粤语口语化] → TTS → 播放。

pub mod builder;
pub mod orchestrator;
pub mod events;
pub mod lifecycle;
pub mod process;

pub use builder::PipelineBuilder;
pub use orchestrator::{PipelineOrchestrator, PipelineSettings};
