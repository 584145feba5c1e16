//! 以文本行代替麦克风的识别引擎
//!
//! 每行是一条最终结果，以 `~` 开头的行是中间结果。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::{
    RecognitionConfig, RecognitionEngine, RecognitionResult, RecognitionSession, RecognizerEvent,
};
use crate::error::EngineResult;

type LineSource = Lines<BufReader<Box<dyn AsyncRead + Send + Unpin>>>;

pub struct LineRecognizer {
    /// 重启后的会话继续读同一个输入
    lines: Arc<Mutex<LineSource>>,
    finished: CancellationToken,
    starts: AtomicUsize,
}

impl LineRecognizer {
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(reader).lines())),
            finished: CancellationToken::new(),
            starts: AtomicUsize::new(0),
        }
    }

    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }

    /// 输入读完（或读取失败）后被取消
    pub fn finished(&self) -> CancellationToken {
        self.finished.clone()
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

fn parse_line(line: String) -> RecognitionResult {
    match line.strip_prefix('~') {
        Some(interim) => RecognitionResult {
            transcript: interim.to_string(),
            is_final: false,
        },
        None => RecognitionResult {
            transcript: line,
            is_final: true,
        },
    }
}

#[async_trait]
impl RecognitionEngine for LineRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn start(&self, config: &RecognitionConfig) -> EngineResult<RecognitionSession> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let (tx, events) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let session_cancel = cancel.clone();
        let lines = Arc::clone(&self.lines);
        let finished = self.finished.clone();
        info!(language = %config.language, "reading dictation lines");

        tokio::spawn(async move {
            let _ = tx.send(RecognizerEvent::Started);
            let mut source = tokio::select! {
                _ = session_cancel.cancelled() => return,
                source = lines.lock() => source,
            };
            loop {
                let line = tokio::select! {
                    _ = session_cancel.cancelled() => return,
                    line = source.next_line() => line,
                };
                match line {
                    Ok(Some(line)) => {
                        let _ = tx.send(RecognizerEvent::Result(vec![parse_line(line)]));
                    }
                    Ok(None) => break,
                    Err(err) => {
                        error!(error = %err, "failed to read dictation input");
                        break;
                    }
                }
            }
            drop(source);
            finished.cancel();
            // 输入结束不算识别中断：通道保持打开直到会话被停止，避免触发自动重启
            session_cancel.cancelled().await;
            drop(tx);
        });

        Ok(RecognitionSession { events, cancel })
    }
}
