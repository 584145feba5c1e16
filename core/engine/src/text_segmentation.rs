//! 句读检测
//!
//! 判断中间结果里是否已经出现句末或分句标点，用于决定是否提前翻译。

use serde::{Deserialize, Serialize};

/// 标点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseType {
    /// 句号、问号、感叹号
    SentenceEnd,
    /// 逗号、分号、顿号
    Clause,
}

/// 可配置的标点集合（属于产品调参项，不是固定常量）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunctuationSet {
    pub sentence_end: Vec<char>,
    pub clause_end: Vec<char>,
}

impl Default for PunctuationSet {
    fn default() -> Self {
        Self {
            sentence_end: vec!['.', '!', '?', '。', '！', '？'],
            clause_end: vec![',', ';', '，', '；', '、'],
        }
    }
}

impl PunctuationSet {
    pub fn classify(&self, ch: char) -> Option<PauseType> {
        if self.sentence_end.contains(&ch) {
            Some(PauseType::SentenceEnd)
        } else if self.clause_end.contains(&ch) {
            Some(PauseType::Clause)
        } else {
            None
        }
    }

    /// 文本中第一个有效的断句标点
    ///
    /// `3.14` 中的小数点、`e.g.` 之类后接小写字母的缩写点、`1,000` 中的千分位逗号都不算。
    pub fn find_boundary(&self, text: &str) -> Option<PauseType> {
        let chars: Vec<char> = text.chars().collect();
        for (idx, &ch) in chars.iter().enumerate() {
            let Some(pause) = self.classify(ch) else {
                continue;
            };

            if ch == '.' || ch == ',' {
                let prev_is_digit = idx > 0 && chars[idx - 1].is_ascii_digit();
                let next = chars.get(idx + 1).copied();
                let next_is_digit = next.map(|c| c.is_ascii_digit()).unwrap_or(false);
                if prev_is_digit && next_is_digit {
                    continue;
                }
                let next_is_lower = next
                    .map(|c| c.is_alphabetic() && c.is_lowercase())
                    .unwrap_or(false);
                if ch == '.' && next_is_lower {
                    continue;
                }
            }
            return Some(pause);
        }
        None
    }

    pub fn has_boundary(&self, text: &str) -> bool {
        self.find_boundary(text).is_some()
    }
}
