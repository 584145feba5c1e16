//! 流水线生命周期
//!
//! `boot()` 创建翻译闸门与两个后台任务（转写监听、翻译分发），
//! `shutdown()` 取消闸门与所有进行中的条目，并释放识别与播放资源。

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::EngineResult;
use crate::telemetry::TelemetryDatum;
use crate::transcript_stream::StreamEvent;
use crate::translation_gate::{GatedText, TranslationGate};

use super::orchestrator::{PipelineInner, PipelineOrchestrator, RunningPipeline};

impl PipelineOrchestrator {
    /// 启动流水线（重复调用无副作用）
    pub async fn boot(&self) -> EngineResult<()> {
        if self.is_running() {
            return Ok(());
        }
        self.inner.event_bus.start().await?;

        let (gate, gated) = TranslationGate::new(self.inner.gate_config.clone());
        let gate = Arc::new(gate);
        let cancel = CancellationToken::new();

        tokio::spawn(dispatch_loop(Arc::clone(&self.inner), gated, cancel.clone()));
        tokio::spawn(listen_loop(
            Arc::clone(&self.inner),
            self.inner.stream.subscribe(),
            cancel.clone(),
        ));

        {
            let mut running = self.inner.running.lock();
            if let Some(previous) = running.replace(RunningPipeline { gate, cancel }) {
                previous.gate.cancel();
                previous.cancel.cancel();
            }
        }

        self.inner
            .telemetry
            .record(TelemetryDatum::count("pipeline.boot"))
            .await?;
        info!("pipeline booted");
        Ok(())
    }

    /// 拆除流水线；已排期的翻译不会再触发，进行中的结果被丢弃
    pub async fn shutdown(&self) -> EngineResult<()> {
        self.inner.stream.stop();
        self.inner.playback.stop();

        let running = self.inner.running.lock().take();
        let Some(running) = running else {
            return Ok(());
        };
        running.gate.cancel();
        running.cancel.cancel();

        self.inner.event_bus.stop().await?;
        self.inner
            .telemetry
            .record(TelemetryDatum::count("pipeline.shutdown"))
            .await?;
        info!("pipeline shut down");
        Ok(())
    }

    /// 以当前输入语言开始识别
    pub async fn start_listening(&self) -> EngineResult<()> {
        let language = self.inner.settings.read().input_language.clone();
        if let Err(err) = self.inner.stream.start(&language).await {
            // 运行中时转写流的错误事件已由 listen_loop 上报
            if !self.is_running() {
                self.inner.report_error(err.clone()).await;
            }
            return Err(err);
        }
        Ok(())
    }

    /// 停止识别，可重复调用
    pub fn stop_listening(&self) {
        self.inner.stream.stop();
    }

    /// 修改输入语言；正在识别时以新语言重新开始
    pub async fn set_input_language(&self, language: impl Into<String>) -> EngineResult<()> {
        self.inner.settings.write().input_language = language.into();
        if self.inner.stream.is_listening() {
            self.start_listening().await?;
        }
        Ok(())
    }
}

/// 把转写流事件送入流水线
async fn listen_loop(
    inner: Arc<PipelineInner>,
    mut events: broadcast::Receiver<StreamEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(StreamEvent::Transcript(transcript)) => inner.handle_transcript(&transcript).await,
            Ok(StreamEvent::Error(err)) => inner.report_error(err).await,
            Ok(StreamEvent::StateChanged(state)) => debug!(?state, "transcript stream state"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "pipeline lagged behind transcript stream");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// 每个通过闸门的文本各自处理，完成顺序不保证
async fn dispatch_loop(
    inner: Arc<PipelineInner>,
    mut gated: mpsc::UnboundedReceiver<GatedText>,
    cancel: CancellationToken,
) {
    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            item = gated.recv() => item,
        };
        let Some(item) = item else {
            break;
        };

        let inner = Arc::clone(&inner);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = inner.translate_and_speak(&item.text, &cancel).await {
                debug!(error = %err, is_final = item.is_final, "pipeline item aborted");
            }
        });
    }
}
