use async_trait::async_trait;

use super::ColloquialAdapter;
use crate::error::EngineResult;

/// 原样返回输入
pub struct ColloquialStub;

impl ColloquialStub {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ColloquialStub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ColloquialAdapter for ColloquialStub {
    async fn colloquialize(&self, text: &str) -> EngineResult<String> {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_passes_text_through() {
        let stub = ColloquialStub::new();
        assert_eq!(stub.colloquialize("明天去學校").await.unwrap(), "明天去學校");
    }
}
