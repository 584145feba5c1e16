//! 翻译后端类型定义

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

/// 翻译请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: String,
    /// 已映射为后端代码的目标语言
    pub target_language: String,
}

/// 翻译响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    #[serde(alias = "translation")]
    pub translated_text: String,
}

/// 翻译后端
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, req: &TranslateRequest) -> EngineResult<TranslateResponse>;
}
