use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use super::Category;

/// 显示语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl Language {
    /// 切换到另一种语言
    pub fn toggle(self) -> Self {
        match self {
            Language::Zh => Language::En,
            Language::En => Language::Zh,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh" | "cn" | "中文" => Ok(Language::Zh),
            "en" | "english" => Ok(Language::En),
            other => Err(format!("未知语言: {}", other)),
        }
    }
}

/// 双语文本
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BilingualText {
    pub zh: String,
    pub en: String,
}

impl BilingualText {
    pub fn new(zh: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            zh: zh.into(),
            en: en.into(),
        }
    }

    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Zh => &self.zh,
            Language::En => &self.en,
        }
    }

    fn is_blank(&self) -> bool {
        self.zh.trim().is_empty() || self.en.trim().is_empty()
    }
}

/// 选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// 选项标识（如 "A"），在同一题内唯一
    pub key: String,
    pub text: BilingualText,
}

/// 单选题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub category: Category,
    pub prompt: BilingualText,
    pub options: Vec<AnswerOption>,
    /// 正确选项的 key
    pub correct_answer: String,
    pub explanation: BilingualText,
}

/// 题目结构校验失败的原因
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionDefect {
    #[error("题目ID为空")]
    EmptyId,
    #[error("题干缺少中文或英文内容")]
    EmptyPrompt,
    #[error("选项数量不足: {count}")]
    TooFewOptions { count: usize },
    #[error("存在空的选项标识")]
    EmptyOptionKey,
    #[error("选项标识重复: {key}")]
    DuplicateOptionKey { key: String },
    #[error("选项 {key} 缺少中文或英文内容")]
    EmptyOptionText { key: String },
    #[error("正确答案 {answer} 不在选项中")]
    CorrectAnswerMissing { answer: String },
}

impl Question {
    /// 查找选项
    pub fn option(&self, key: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.key == key)
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.option(key).is_some()
    }

    pub fn is_correct(&self, key: &str) -> bool {
        self.correct_answer == key
    }

    /// 校验题目结构
    ///
    /// 内容提供方返回的数据不可信，合并进会话之前必须通过此校验。
    pub fn validate(&self) -> Result<(), QuestionDefect> {
        if self.id.trim().is_empty() {
            return Err(QuestionDefect::EmptyId);
        }
        if self.prompt.is_blank() {
            return Err(QuestionDefect::EmptyPrompt);
        }
        if self.options.len() < 2 {
            return Err(QuestionDefect::TooFewOptions {
                count: self.options.len(),
            });
        }

        let mut seen = HashSet::new();
        for option in &self.options {
            if option.key.trim().is_empty() {
                return Err(QuestionDefect::EmptyOptionKey);
            }
            if !seen.insert(option.key.as_str()) {
                return Err(QuestionDefect::DuplicateOptionKey {
                    key: option.key.clone(),
                });
            }
            if option.text.is_blank() {
                return Err(QuestionDefect::EmptyOptionText {
                    key: option.key.clone(),
                });
            }
        }

        // 选项 key 已去重，这里命中即唯一
        if !self.has_option(&self.correct_answer) {
            return Err(QuestionDefect::CorrectAnswerMissing {
                answer: self.correct_answer.clone(),
            });
        }

        Ok(())
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview = crate::utils::logging::truncate_text(&self.prompt.zh, 40);
        write!(f, "[{} {}] {}", self.id, self.category, preview)
    }
}
