//! 音频输出
//!
//! `PlaybackHandle` 代表一次播放占用的输出资源（解码上下文 + 播放节点），
//! 在 `release()` 或 drop 时释放，重复释放无副作用。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;

use super::decoder::DecodedAudio;
use crate::error::EngineResult;

type ReleaseFn = Box<dyn FnOnce() + Send>;

pub struct PlaybackHandle {
    done: Option<oneshot::Receiver<()>>,
    release: Option<ReleaseFn>,
}

impl PlaybackHandle {
    /// # Arguments
    /// * `done` - 播放自然结束时触发
    /// * `release` - 停止播放并释放输出资源
    pub fn new(done: oneshot::Receiver<()>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            done: Some(done),
            release: Some(Box::new(release)),
        }
    }

    pub fn take_done(&mut self) -> Option<oneshot::Receiver<()>> {
        self.done.take()
    }

    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.release();
    }
}

pub trait AudioOutput: Send + Sync {
    fn play(&self, audio: DecodedAudio) -> EngineResult<PlaybackHandle>;
}

/// 无声输出：按音频时长计时后报告结束（无声卡环境 / 测试）
#[derive(Default, Clone)]
pub struct SilentOutput {
    active: Arc<AtomicUsize>,
}

impl SilentOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前尚未释放的播放资源数
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl AudioOutput for SilentOutput {
    fn play(&self, audio: DecodedAudio) -> EngineResult<PlaybackHandle> {
        let (done_tx, done_rx) = oneshot::channel();
        let duration = audio.duration();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = done_tx.send(());
        });

        self.active.fetch_add(1, Ordering::SeqCst);
        let active = Arc::clone(&self.active);
        Ok(PlaybackHandle::new(done_rx, move || {
            timer.abort();
            active.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}
