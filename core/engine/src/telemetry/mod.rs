use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryDatum {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

impl TelemetryDatum {
    pub fn millis(name: &str, value: u128) -> Self {
        Self {
            name: name.to_string(),
            value: value as f64,
            unit: "ms".to_string(),
        }
    }

    pub fn count(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: 1.0,
            unit: "count".to_string(),
        }
    }
}

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn record(&self, datum: TelemetryDatum) -> EngineResult<()>;
}

/// 通过 tracing 输出指标
pub struct TracingTelemetrySink;

#[async_trait]
impl TelemetrySink for TracingTelemetrySink {
    async fn record(&self, datum: TelemetryDatum) -> EngineResult<()> {
        info!(
            target: "interp_engine::telemetry",
            name = %datum.name,
            value = datum.value,
            unit = %datum.unit
        );
        Ok(())
    }
}

pub struct NoopTelemetrySink;

#[async_trait]
impl TelemetrySink for NoopTelemetrySink {
    async fn record(&self, _datum: TelemetryDatum) -> EngineResult<()> {
        Ok(())
    }
}

/// 保存在内存中的指标（测试与调试用）
#[derive(Default)]
pub struct MemoryTelemetrySink {
    data: Mutex<Vec<TelemetryDatum>>,
}

impl MemoryTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.data.lock().iter().map(|d| d.name.clone()).collect()
    }
}

#[async_trait]
impl TelemetrySink for MemoryTelemetrySink {
    async fn record(&self, datum: TelemetryDatum) -> EngineResult<()> {
        self.data.lock().push(datum);
        Ok(())
    }
}
