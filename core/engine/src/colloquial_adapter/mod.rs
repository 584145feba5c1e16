//! 粤语口语化
//!
//! 把书面粤语 / 中文转换为口语粤语。失败不影响主流程，调用方退回原文。

mod http;
mod rule_based;
mod stub;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

pub use http::HttpColloquialClient;
pub use rule_based::RuleBasedColloquializer;
pub use stub::ColloquialStub;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColloquialRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColloquialResponse {
    pub processed_text: String,
}

#[async_trait]
pub trait ColloquialAdapter: Send + Sync {
    async fn colloquialize(&self, text: &str) -> EngineResult<String>;
}
