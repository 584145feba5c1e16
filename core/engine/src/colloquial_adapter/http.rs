//! 口语化后端 HTTP 客户端（由语言模型服务实现）

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{ColloquialAdapter, ColloquialRequest, ColloquialResponse};
use crate::error::{EngineError, EngineResult};

const SERVICE: &str = "colloquial backend";

#[derive(Clone)]
pub struct HttpColloquialClient {
    endpoint: String,
    api_key: Option<String>,
    http: Client,
}

impl HttpColloquialClient {
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
impl ColloquialAdapter for HttpColloquialClient {
    async fn colloquialize(&self, text: &str) -> EngineResult<String> {
        let mut request_builder = self.http.post(&self.endpoint).json(&ColloquialRequest {
            text: text.to_string(),
        });
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

        let body: ColloquialResponse = response.json().await.map_err(|e| {
            EngineError::backend(format!("{} returned an invalid body: {}", SERVICE, e))
        })?;

        // 空内容视为失败
        if body.processed_text.trim().is_empty() {
            return Err(EngineError::backend(format!("{} returned empty content", SERVICE)));
        }
        Ok(body.processed_text)
    }
}
