use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Category;

/// 单个分类的答题统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryTally {
    pub correct: usize,
    pub total: usize,
}

/// 数值成绩（不含 AI 分析）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    /// 百分制得分
    pub score: u32,
    pub total_questions: usize,
    pub correct_count: usize,
    /// 覆盖全部四个分类，没有题目的分类为 {0, 0}
    pub domain_breakdown: BTreeMap<Category, CategoryTally>,
}

impl ScoreReport {
    pub fn tally(&self, category: Category) -> CategoryTally {
        self.domain_breakdown
            .get(&category)
            .copied()
            .unwrap_or_default()
    }
}

/// 考试最终结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub score: u32,
    pub total_questions: usize,
    pub correct_count: usize,
    pub domain_breakdown: BTreeMap<Category, CategoryTally>,
    /// 数值成绩算出后再异步填充
    pub ai_analysis: Option<String>,
}

impl ExamResult {
    pub fn from_report(report: ScoreReport) -> Self {
        Self {
            score: report.score,
            total_questions: report.total_questions,
            correct_count: report.correct_count,
            domain_breakdown: report.domain_breakdown,
            ai_analysis: None,
        }
    }

    pub fn with_analysis(mut self, analysis: impl Into<String>) -> Self {
        self.ai_analysis = Some(analysis.into());
        self
    }
}
