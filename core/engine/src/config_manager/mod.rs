//! 运行配置
//!
//! 配置以 TOML 保存，缺省字段使用默认值：
//!
//! ```toml
//! [languages]
//! input = "ja-JP"
//! target = "zh-HK"
//!
//! [speech]
//! enabled = true
//! gender = "FEMALE"
//!
//! [gate]
//! debounce_ms = 300
//! min_chars = 20
//!
//! [backends]
//! translate_url = "http://127.0.0.1:3000/api/translate"
//! tts_url = "http://127.0.0.1:3000/api/tts"
//! colloquial_url = "http://127.0.0.1:3000/api/cantonese-process"
//! timeout_ms = 8000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::translation_gate::GateConfig;
use crate::types::VoiceGender;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// 识别语言（区域代码）
    pub input: String,
    /// 翻译目标语言（区域代码）
    pub target: String,
    /// 用于判断移动端的 User-Agent
    pub user_agent: Option<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            input: "ja-JP".to_string(),
            target: "en".to_string(),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub gender: VoiceGender,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub translate_url: String,
    pub tts_url: String,
    /// 未配置时使用本地规则口语化
    pub colloquial_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            translate_url: "http://127.0.0.1:3000/api/translate".to_string(),
            tts_url: "http://127.0.0.1:3000/api/tts".to_string(),
            colloquial_url: None,
            api_key: None,
            timeout_ms: 8000,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub languages: LanguageConfig,
    pub speech: SpeechConfig,
    pub gate: GateConfig,
    pub backends: BackendConfig,
    pub history: HistoryConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        let config: PipelineConfig = toml::from_str(content)
            .map_err(|e| EngineError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.languages.input.trim().is_empty() || self.languages.target.trim().is_empty() {
            return Err(EngineError::config("input and target languages must be set"));
        }
        if self.history.capacity == 0 || self.history.capacity > DEFAULT_HISTORY_CAPACITY {
            return Err(EngineError::config(format!(
                "history capacity must be between 1 and {}",
                DEFAULT_HISTORY_CAPACITY
            )));
        }
        if self.backends.timeout_ms == 0 {
            return Err(EngineError::config("backend timeout must be positive"));
        }
        Ok(())
    }
}

#[async_trait]
pub trait ConfigManager: Send + Sync {
    async fn load(&self) -> EngineResult<PipelineConfig>;
    async fn current(&self) -> EngineResult<PipelineConfig>;
}

/// 固定配置
pub struct StaticConfigManager {
    config: PipelineConfig,
}

impl StaticConfigManager {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConfigManager for StaticConfigManager {
    async fn load(&self) -> EngineResult<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config.clone())
    }

    async fn current(&self) -> EngineResult<PipelineConfig> {
        Ok(self.config.clone())
    }
}

/// 从 TOML 文件加载配置
pub struct FileConfigManager {
    path: PathBuf,
    loaded: RwLock<Option<PipelineConfig>>,
}

impl FileConfigManager {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            loaded: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigManager for FileConfigManager {
    async fn load(&self) -> EngineResult<PipelineConfig> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            EngineError::config(format!(
                "Failed to read config file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let config = PipelineConfig::from_toml_str(&content)?;
        info!(
            path = %self.path.display(),
            input = %config.languages.input,
            target = %config.languages.target,
            "config loaded"
        );
        *self.loaded.write() = Some(config.clone());
        Ok(config)
    }

    async fn current(&self) -> EngineResult<PipelineConfig> {
        if let Some(config) = self.loaded.read().clone() {
            return Ok(config);
        }
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_uses_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [languages]
            input = "yue-HK"
            target = "ja-JP"

            [speech]
            enabled = true
            gender = "FEMALE"
            "#,
        )
        .unwrap();

        assert_eq!(config.languages.input, "yue-HK");
        assert_eq!(config.speech.gender, VoiceGender::Female);
        assert_eq!(config.gate.debounce_ms, 300);
        assert_eq!(config.history.capacity, 100);
        assert!(config.backends.colloquial_url.is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = PipelineConfig::from_toml_str("[history]\ncapacity = 0\n").unwrap_err();
        assert_eq!(err.kind(), &crate::error::ErrorKind::Config);
        let err = PipelineConfig::from_toml_str("[history]\ncapacity = 101\n").unwrap_err();
        assert_eq!(err.kind(), &crate::error::ErrorKind::Config);
        assert!(PipelineConfig::from_toml_str("[history]\ncapacity = 50\n").is_ok());

        assert!(PipelineConfig::from_toml_str("[languages\n").is_err());
    }
}
