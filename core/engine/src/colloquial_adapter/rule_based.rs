use async_trait::async_trait;

use super::ColloquialAdapter;
use crate::error::EngineResult;

/// 书面语 -> 口语粤语的替换表（长词在前）
const REPLACEMENTS: &[(&str, &str)] = &[
    ("現在", "而家"),
    ("现在", "而家"),
    ("明天", "聽日"),
    ("今天", "今日"),
    ("昨天", "尋日"),
    ("需要", "要"),
    ("東西", "嘢"),
    ("东西", "嘢"),
    ("睡覺", "瞓覺"),
    ("討論", "傾下"),
    ("什麼", "乜嘢"),
    ("沒有", "冇"),
    ("我們", "我哋"),
    ("你們", "你哋"),
    ("他們", "佢哋"),
    ("她們", "佢哋"),
    ("野食", "嘢食"),
    ("很好", "幾好"),
];

/// 句末语气词，已经有语气词时不再追加
const FINAL_PARTICLES: &[char] = &['啊', '喎', '咧', '呢', '囉', '㗎', '咩', '啦', '嘅', '呀'];

const SENTENCE_END: &[char] = &['。', '！', '？', '.', '!', '?'];

/// 基于规则的口语化实现
///
/// 不依赖网络，在没有配置口语化服务时使用。
pub struct RuleBasedColloquializer {
    particle: char,
}

impl RuleBasedColloquializer {
    pub fn new() -> Self {
        Self { particle: '啊' }
    }

    pub fn with_particle(particle: char) -> Self {
        Self { particle }
    }

    fn apply_rules(&self, text: &str) -> String {
        let mut result = text.trim().to_string();
        if result.is_empty() {
            return result;
        }

        for (written, spoken) in REPLACEMENTS {
            result = result.replace(written, spoken);
        }

        // 语气词加在句末标点之前
        let trailing_punct = result.chars().last().filter(|c| SENTENCE_END.contains(c));
        let mut body: String = match trailing_punct {
            Some(_) => {
                let mut chars = result.chars();
                chars.next_back();
                chars.as_str().to_string()
            }
            None => result.clone(),
        };

        let ends_with_particle = body
            .chars()
            .last()
            .map(|c| FINAL_PARTICLES.contains(&c))
            .unwrap_or(true);
        if !ends_with_particle {
            body.push(self.particle);
        }
        if let Some(p) = trailing_punct {
            body.push(p);
        }
        body
    }
}

impl Default for RuleBasedColloquializer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ColloquialAdapter for RuleBasedColloquializer {
    async fn colloquialize(&self, text: &str) -> EngineResult<String> {
        Ok(self.apply_rules(text))
    }
}
