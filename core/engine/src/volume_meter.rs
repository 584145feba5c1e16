//! 麦克风音量表
//!
//! 每个刷新周期（约 16ms）对最近 256 个采样做一次频域分析，
//! 把 128 个频点的字节幅度求均方根，归一化到 [0, 1] 后通过 watch 通道发布。
//! 仅用于界面显示，与识别链路无关。

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

pub const FFT_SIZE: usize = 256;
pub const SMOOTHING: f32 = 0.85;
pub const MIN_DECIBELS: f32 = -90.0;
pub const MAX_DECIBELS: f32 = -10.0;
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// 已获取的麦克风采集流
pub struct MicrophoneStream {
    /// 单声道 f32 采样块
    pub frames: mpsc::UnboundedReceiver<Vec<f32>>,
    /// 取消后采集端应停止并释放设备
    pub release: CancellationToken,
}

#[async_trait]
pub trait MicrophoneSource: Send + Sync {
    async fn acquire(&self) -> EngineResult<MicrophoneStream>;
}

/// 频域分析器，行为与浏览器 AnalyserNode 的字节频谱一致
pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: VecDeque<f32>,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyser {
    pub fn new() -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        Self {
            fft,
            window: blackman_window(FFT_SIZE),
            samples: VecDeque::from(vec![0.0; FFT_SIZE]),
            smoothed: vec![0.0; FFT_SIZE / 2],
        }
    }

    pub fn push_samples(&mut self, samples: &[f32]) {
        for &sample in samples {
            if self.samples.len() == FFT_SIZE {
                self.samples.pop_front();
            }
            self.samples.push_back(sample);
        }
    }

    /// 计算一帧字节频谱（会更新平滑状态）
    pub fn byte_frequency_data(&mut self) -> Vec<u8> {
        let mut buffer: Vec<Complex<f32>> = self
            .samples
            .iter()
            .zip(self.window.iter())
            .map(|(s, w)| Complex { re: s * w, im: 0.0 })
            .collect();
        self.fft.process(&mut buffer);

        let scale = 1.0 / FFT_SIZE as f32;
        let range = MAX_DECIBELS - MIN_DECIBELS;
        self.smoothed
            .iter_mut()
            .zip(buffer.iter())
            .map(|(smoothed, bin)| {
                let magnitude = bin.norm() * scale;
                *smoothed = SMOOTHING * *smoothed + (1.0 - SMOOTHING) * magnitude;
                if *smoothed <= 0.0 {
                    return 0;
                }
                let db = 20.0 * smoothed.log10();
                let scaled = 255.0 * (db - MIN_DECIBELS) / range;
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    /// 当前音量 [0, 1]
    pub fn level(&mut self) -> f32 {
        rms_level(&self.byte_frequency_data())
    }
}

impl Default for SpectrumAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    let (a0, a1, a2) = (0.42, 0.5, 0.08);
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

/// 字节幅度的均方根，`min(rms / 256, 1)`
pub fn rms_level(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: f32 = bins.iter().map(|&b| (b as f32) * (b as f32)).sum();
    let rms = (sum / bins.len() as f32).sqrt();
    (rms / 256.0).min(1.0)
}

struct ActiveGraph {
    cancel: CancellationToken,
    release: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveGraph {
    fn teardown(self) {
        self.cancel.cancel();
        self.release.cancel();
        self.task.abort();
    }
}

pub struct VolumeMeter {
    source: Arc<dyn MicrophoneSource>,
    level: watch::Sender<f32>,
    active: Mutex<Option<ActiveGraph>>,
    frame_interval: Duration,
}

impl VolumeMeter {
    pub fn new(source: Arc<dyn MicrophoneSource>) -> Self {
        let (level, _) = watch::channel(0.0);
        Self {
            source,
            level,
            active: Mutex::new(None),
            frame_interval: FRAME_INTERVAL,
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    pub fn level(&self) -> f32 {
        *self.level.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<f32> {
        self.level.subscribe()
    }

    /// 获取麦克风并开始发布音量；失败只报告一次，不重试
    pub async fn activate(&self) -> EngineResult<()> {
        if self.is_active() {
            return Ok(());
        }

        let stream = match self.source.acquire().await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "microphone acquisition failed, volume meter stays inactive");
                return Err(err);
            }
        };

        let mut active = self.active.lock();
        if active.is_some() {
            // 并发激活时保留先到的那一个
            stream.release.cancel();
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let release = stream.release.clone();
        let task = tokio::spawn(run_meter(
            stream.frames,
            cancel.clone(),
            self.level.clone(),
            self.frame_interval,
        ));
        *active = Some(ActiveGraph {
            cancel,
            release,
            task,
        });
        info!("volume meter activated");
        Ok(())
    }

    /// 释放分析图，重复调用无副作用
    pub fn deactivate(&self) {
        let graph = self.active.lock().take();
        if let Some(graph) = graph {
            graph.teardown();
            self.level.send_replace(0.0);
            info!("volume meter deactivated");
        }
    }
}

impl Drop for VolumeMeter {
    fn drop(&mut self) {
        if let Some(graph) = self.active.get_mut().take() {
            graph.teardown();
        }
    }
}

async fn run_meter(
    mut frames: mpsc::UnboundedReceiver<Vec<f32>>,
    cancel: CancellationToken,
    level: watch::Sender<f32>,
    frame_interval: Duration,
) {
    let mut analyser = SpectrumAnalyser::new();
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = frames.recv() => match frame {
                Some(samples) => analyser.push_samples(&samples),
                None => {
                    debug!("microphone stream closed");
                    break;
                }
            },
            _ = ticker.tick() => {
                level.send_replace(analyser.level());
            }
        }
    }
    level.send_replace(0.0);
}

/// 无法获取麦克风时使用
pub struct UnavailableMicrophone;

#[async_trait]
impl MicrophoneSource for UnavailableMicrophone {
    async fn acquire(&self) -> EngineResult<MicrophoneStream> {
        Err(EngineError::new(
            crate::error::ErrorKind::PermissionDenied,
            "no microphone available",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_zero() {
        let mut analyser = SpectrumAnalyser::new();
        analyser.push_samples(&[0.0; FFT_SIZE]);
        assert_eq!(analyser.level(), 0.0);
    }

    #[test]
    fn tone_raises_level_within_bounds() {
        let mut analyser = SpectrumAnalyser::new();
        let tone: Vec<f32> = (0..FFT_SIZE)
            .map(|i| (2.0 * PI * 16.0 * i as f32 / FFT_SIZE as f32).sin())
            .collect();
        analyser.push_samples(&tone);

        let first = analyser.level();
        let second = analyser.level();
        assert!(first > 0.0);
        assert!(second >= first);
        assert!(second <= 1.0);
    }

    #[test]
    fn rms_level_is_clamped() {
        assert_eq!(rms_level(&[]), 0.0);
        assert_eq!(rms_level(&[0; 128]), 0.0);
        let full = rms_level(&[255; 128]);
        assert!(full > 0.99 && full <= 1.0);
    }
}
