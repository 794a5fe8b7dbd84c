//! 离线题库 - 业务能力层
//!
//! 从本地 TOML 文件提供题目，不依赖网络。成绩分析能力不可用，
//! 调用方会使用固定的兜底文本。

use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ProviderError;
use crate::models::{load_all_question_sets, Question, ScoreReport, SetId};
use crate::services::ContentProvider;

/// 离线题库
pub struct TomlQuestionBank {
    sets: BTreeMap<SetId, Vec<Question>>,
}

impl TomlQuestionBank {
    /// 直接使用内存中的题目构建
    pub fn from_sets(sets: BTreeMap<SetId, Vec<Question>>) -> Self {
        Self { sets }
    }

    /// 从文件夹加载所有 `set-<id>.toml`
    pub async fn load(folder_path: &str) -> anyhow::Result<Self> {
        let sets = load_all_question_sets(folder_path).await?;
        if sets.is_empty() {
            anyhow::bail!("题库目录中没有可用的试题文件: {}", folder_path);
        }
        Ok(Self { sets })
    }

    /// 某套试题的题目数量
    pub fn set_len(&self, set_id: SetId) -> Option<usize> {
        self.sets.get(&set_id).map(Vec::len)
    }
}

#[async_trait]
impl ContentProvider for TomlQuestionBank {
    fn name(&self) -> &str {
        "离线题库"
    }

    fn set_size(&self, set_id: SetId) -> Option<usize> {
        self.set_len(set_id)
    }

    async fn fetch_questions(
        &self,
        set_id: SetId,
        start_index: usize,
        count: usize,
    ) -> Result<Vec<Question>, ProviderError> {
        let questions = self
            .sets
            .get(&set_id)
            .ok_or(ProviderError::UnknownSet { set_id })?;

        let batch: Vec<Question> = questions
            .iter()
            .skip(start_index)
            .take(count)
            .cloned()
            .collect();

        debug!(
            "离线题库: 第 {} 套从第 {} 题起取 {} 题，实际 {} 题",
            set_id,
            start_index + 1,
            count,
            batch.len()
        );

        Ok(batch)
    }

    async fn fetch_analysis(&self, _summary: &ScoreReport) -> Result<String, ProviderError> {
        Err(ProviderError::Unsupported {
            capability: "成绩分析",
        })
    }
}
