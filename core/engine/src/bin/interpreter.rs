//! 控制台同声传译
//!
//! 从标准输入逐行读取听写文本作为识别结果（以 `~` 开头的行视为中间结果），
//! 经 HTTP 翻译 / TTS 后端处理后在日志中输出会话。
//!
//! 用法：`interpreter [--config interpreter.toml]`

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use interp_engine::config_manager::{ConfigManager, FileConfigManager, PipelineConfig};
use interp_engine::event_bus::{ChannelEventBus, CoreEvent, EventTopic};
use interp_engine::logging::init_tracing;
use interp_engine::pipeline::PipelineBuilder;
use interp_engine::telemetry::TracingTelemetrySink;
use interp_engine::transcript_stream::LineRecognizer;

fn log_event(event: CoreEvent) {
    info!(topic = %event.topic.0, payload = %event.payload, "conversation");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from);

    let config = match &config_path {
        Some(path) => FileConfigManager::new(path).load().await?,
        None => {
            info!("no --config given, using defaults");
            PipelineConfig::default()
        }
    };

    let bus = Arc::new(ChannelEventBus::new());
    let mut transcripts = bus.subscribe_receiver(EventTopic::new(EventTopic::TRANSCRIPT));
    let mut translations = bus.subscribe_receiver(EventTopic::new(EventTopic::TRANSLATION));
    let mut errors = bus.subscribe_receiver(EventTopic::new(EventTopic::PIPELINE_ERROR));

    let recognizer = Arc::new(LineRecognizer::stdin());
    let finished = recognizer.finished();
    let pipeline = PipelineBuilder::new()
        .with_http_backends(&config.backends)?
        .config(config)
        .recognizer(recognizer)
        .event_bus(bus)
        .telemetry(Arc::new(TracingTelemetrySink))
        .build()?;

    pipeline.boot().await?;
    pipeline.start_listening().await?;

    let printer = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(event) = transcripts.recv() => event,
                Some(event) = translations.recv() => event,
                Some(event) = errors.recv() => event,
                else => break,
            };
            log_event(event);
        }
    });

    tokio::select! {
        _ = finished.cancelled() => info!("stdin closed"),
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    // 给最后的去抖与后端调用留出时间
    tokio::time::sleep(pipeline_settle_time()).await;
    pipeline.shutdown().await?;
    printer.abort();

    for message in pipeline.messages() {
        println!("[{:?}] {}", message.kind, message.content);
    }
    Ok(())
}

fn pipeline_settle_time() -> std::time::Duration {
    std::time::Duration::from_millis(1500)
}
