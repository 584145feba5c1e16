//! 语言代码映射
//!
//! UI / 识别使用区域代码（`ja-JP`、`yue-HK` 等），翻译后端与 TTS 后端各自需要不同的代码。
//! 所有映射都是全函数：未知代码原样返回。

use std::sync::OnceLock;

use regex::Regex;

/// 翻译后端使用的粤语代码
pub const CANTONESE_BACKEND_CODE: &str = "zh-HK";
/// 识别引擎使用的粤语代码
pub const CANTONESE_RECOGNITION_CODE: &str = "yue-HK";

/// 将区域代码映射为翻译后端代码
///
/// 简体中文、繁体（台湾）、粤语保持区分，不会合并为 `zh`。
pub fn map_to_backend_code(code: &str) -> String {
    match code {
        "ja-JP" | "ja" => "ja",
        "en-US" | "en-GB" | "en" => "en",
        "zh" | "zh-CN" => "zh",
        "yue-HK" | "zh-HK" | "yue" => CANTONESE_BACKEND_CODE,
        "zh-TW" => "zh-TW",
        "ko" | "ko-KR" => "ko",
        // 翻译后端只认 mn
        "mo" => "mn",
        other => other,
    }
    .to_string()
}

/// 将区域代码映射为 TTS 后端的语音区域代码
pub fn map_to_tts_code(code: &str) -> String {
    let mapped = match code {
        "ja-JP" | "ja" => "ja-JP",
        "en-US" | "en" => "en-US",
        "zh" | "zh-CN" => "cmn-CN",
        "yue-HK" | "zh-HK" => "yue-HK",
        "zh-TW" => "cmn-TW",
        "ko" | "ko-KR" => "ko-KR",
        "mo" => "mn-MN",
        "vi" | "vi-VN" => "vi-VN",
        "th" | "th-TH" => "th-TH",
        "ms" | "ms-MY" => "ms-MY",
        "id" | "id-ID" => "id-ID",
        "fil" | "tl" => "fil-PH",
        "my" => "my-MM",
        "km" | "km-KH" => "km-KH",
        "lo" | "lo-LA" => "lo-LA",
        "hi" | "hi-IN" => "hi-IN",
        "bn" | "bn-BD" => "bn-BD",
        "ur" | "ur-PK" => "ur-PK",
        "ta" | "ta-IN" => "ta-IN",
        "te" => "te-IN",
        "mr" => "mr-IN",
        "gu" => "gu-IN",
        "kn" => "kn-IN",
        "ml" => "ml-IN",
        "pa" => "pa-IN",
        "or" => "or-IN",
        "si" => "si-LK",
        "fr" | "fr-FR" => "fr-FR",
        "de" | "de-DE" => "de-DE",
        "es" | "es-ES" => "es-ES",
        "it" | "it-IT" => "it-IT",
        "pt" | "pt-PT" | "pt-BR" => "pt-PT",
        "nl" => "nl-NL",
        "sv" => "sv-SE",
        "da" => "da-DK",
        "no" => "no-NO",
        "fi" => "fi-FI",
        "is" => "is-IS",
        "ru" => "ru-RU",
        "pl" => "pl-PL",
        "uk" => "uk-UA",
        "cs" => "cs-CZ",
        "hu" => "hu-HU",
        "ro" => "ro-RO",
        "bg" => "bg-BG",
        "sk" => "sk-SK",
        "hr" => "hr-HR",
        "sr" => "sr-RS",
        "sl" => "sl-SI",
        "lt" => "lt-LT",
        "lv" => "lv-LV",
        "et" => "et-EE",
        "el" => "el-GR",
        "tr" => "tr-TR",
        "ka" => "ka-GE",
        "ar" => "ar-XA",
        "he" => "he-IL",
        "fa" => "fa-IR",
        "ku" => "ku-TR",
        "am" => "am-ET",
        "sw" => "sw-KE",
        "zu" => "zu-ZA",
        "xh" => "xh-ZA",
        "ny" => "ny-MW",
        "ha" => "ha-NG",
        "ig" => "ig-NG",
        "yo" => "yo-NG",
        other => other,
    };
    mapped.to_string()
}

/// 是否为粤语（任意区域变体）
pub fn is_cantonese(code: &str) -> bool {
    map_to_backend_code(code) == CANTONESE_BACKEND_CODE
}

/// 识别运行平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Desktop,
    Mobile,
}

impl Platform {
    /// 根据 User-Agent 判断是否为手机 / 平板
    pub fn from_user_agent(user_agent: &str) -> Self {
        static MOBILE_UA: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = MOBILE_UA.get_or_init(|| Regex::new(r"(?i)iPhone|iPad|iPod|Android").ok());

        match pattern {
            Some(re) if re.is_match(user_agent) => Platform::Mobile,
            _ => Platform::Desktop,
        }
    }
}

/// 移动端识别器不支持 `yue-HK`，改用 `zh-HK`
pub fn adjust_for_recognition_platform(code: &str, platform: Platform) -> String {
    if platform == Platform::Mobile && code == CANTONESE_RECOGNITION_CODE {
        return CANTONESE_BACKEND_CODE.to_string();
    }
    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cantonese_variants_collapse_to_one_backend_code() {
        assert_eq!(map_to_backend_code("yue-HK"), "zh-HK");
        assert_eq!(map_to_backend_code("zh-HK"), "zh-HK");
        assert!(is_cantonese("yue-HK"));
        assert!(is_cantonese("zh-HK"));
        assert!(!is_cantonese("zh-TW"));
    }

    #[test]
    fn chinese_variants_stay_distinct() {
        assert_eq!(map_to_backend_code("zh-CN"), "zh");
        assert_eq!(map_to_backend_code("zh-TW"), "zh-TW");
        assert_ne!(map_to_backend_code("zh-CN"), map_to_backend_code("zh-HK"));
    }

    #[test]
    fn region_suffix_is_stripped_and_unknown_passes_through() {
        assert_eq!(map_to_backend_code("ja-JP"), "ja");
        assert_eq!(map_to_backend_code("en-US"), "en");
        assert_eq!(map_to_backend_code("mo"), "mn");
        assert_eq!(map_to_backend_code("xx-YY"), "xx-YY");
        assert_eq!(map_to_backend_code(""), "");
    }

    #[test]
    fn tts_codes() {
        assert_eq!(map_to_tts_code("zh"), "cmn-CN");
        assert_eq!(map_to_tts_code("zh-HK"), "yue-HK");
        assert_eq!(map_to_tts_code("zh-TW"), "cmn-TW");
        assert_eq!(map_to_tts_code("pt-BR"), "pt-PT");
        assert_eq!(map_to_tts_code("eo"), "eo");
    }

    #[test]
    fn mobile_substitutes_cantonese_recognition_code() {
        let ua = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";
        let platform = Platform::from_user_agent(ua);
        assert_eq!(platform, Platform::Mobile);
        assert_eq!(adjust_for_recognition_platform("yue-HK", platform), "zh-HK");
        assert_eq!(adjust_for_recognition_platform("ja-JP", platform), "ja-JP");

        let desktop = Platform::from_user_agent("Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0");
        assert_eq!(desktop, Platform::Desktop);
        assert_eq!(adjust_for_recognition_platform("yue-HK", desktop), "yue-HK");
        assert_eq!(Platform::from_user_agent("mozilla (ipad; cpu os 17)"), Platform::Mobile);
    }
}
