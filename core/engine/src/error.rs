use std::borrow::Cow;

use thiserror::Error;

/// 错误类别
///
/// 调用方依据类别决定是否中止当前条目、停止识别或仅更新错误提示。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// 运行环境不支持语音识别
    CapabilityUnavailable,
    /// 麦克风权限被拒绝
    PermissionDenied,
    /// 识别引擎返回的错误码
    RecognitionError(String),
    /// 自动重启识别失败
    RestartFailed,
    /// 翻译 / TTS / 口语化后端调用失败
    NetworkOrBackend,
    RateLimited,
    AuthenticationFailed,
    /// 音频解码失败
    DecodeError,
    BackendTimeout,
    Config,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::CapabilityUnavailable => "capability_unavailable",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::RecognitionError(code) => code.as_str(),
            ErrorKind::RestartFailed => "restart_failed",
            ErrorKind::NetworkOrBackend => "network_or_backend",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::AuthenticationFailed => "authentication_failed",
            ErrorKind::DecodeError => "decode_error",
            ErrorKind::BackendTimeout => "backend_timeout",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }

    /// 是否只影响当前条目（识别可以继续）
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ErrorKind::CapabilityUnavailable | ErrorKind::PermissionDenied | ErrorKind::Config
        )
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    kind: ErrorKind,
    message: Cow<'static, str>,
}

impl EngineError {
    pub fn new<T>(kind: ErrorKind, message: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn internal<T>(message: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn backend<T>(message: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Self::new(ErrorKind::NetworkOrBackend, message)
    }

    pub fn config<T>(message: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Self::new(ErrorKind::Config, message)
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 将 reqwest 错误归类（超时单独区分）
    pub fn from_http(service: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(
                ErrorKind::BackendTimeout,
                format!("{} request timed out: {}", service, err),
            )
        } else {
            Self::backend(format!("{} request failed: {}", service, err))
        }
    }

    /// 将非 2xx 状态码归类
    pub fn from_status(service: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let kind = match status.as_u16() {
            429 => ErrorKind::RateLimited,
            401 | 403 => ErrorKind::AuthenticationFailed,
            _ => ErrorKind::NetworkOrBackend,
        };
        Self::new(kind, format!("{} returned {}: {}", service, status, body))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
