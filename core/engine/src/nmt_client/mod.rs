//! 翻译后端客户端
//!
//! 统一的翻译接口，以及基于 HTTP 的实现。

mod http;
mod types;

pub use http::HttpTranslationClient;
pub use types::{TranslateRequest, TranslateResponse, TranslationBackend};
