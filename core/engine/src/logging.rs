//! 日志初始化

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤规则，可被 `RUST_LOG` 覆盖
pub const DEFAULT_FILTER: &str = "interp_engine=info";

/// 安装全局 tracing subscriber；重复调用时静默忽略
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
