//! 翻译后端 HTTP 客户端

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::types::{TranslateRequest, TranslateResponse, TranslationBackend};
use crate::error::{EngineError, EngineResult};

const SERVICE: &str = "translation backend";

#[derive(Clone)]
pub struct HttpTranslationClient {
    endpoint: String,
    api_key: Option<String>,
    http: Client,
}

impl HttpTranslationClient {
    /// # Arguments
    /// * `endpoint` - 完整的翻译端点，例如 "http://127.0.0.1:3000/api/translate"
    /// * `api_key` - 可选的 Bearer token
    /// * `timeout` - 单次请求超时
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> EngineResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            http,
        })
    }
}

#[async_trait]
impl TranslationBackend for HttpTranslationClient {
    async fn translate(&self, req: &TranslateRequest) -> EngineResult<TranslateResponse> {
        debug!(
            target_language = %req.target_language,
            chars = req.text.chars().count(),
            "translate request"
        );

        let mut request_builder = self.http.post(&self.endpoint).json(req);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .send()
            .await
            .map_err(|e| EngineError::from_http(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::from_status(SERVICE, status, &body));
        }

        let body: TranslateResponse = response.json().await.map_err(|e| {
            EngineError::backend(format!("{} returned an invalid body: {}", SERVICE, e))
        })?;
        Ok(body)
    }
}
