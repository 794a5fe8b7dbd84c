//! 成绩计算
//!
//! `score` 是纯函数：同样的会话多次调用得到同样的结果。

use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::models::{Category, CategoryTally, ScoreReport};
use crate::services::ContentProvider;
use crate::workflow::session_state::ExamSession;

/// 成绩分析不可用时显示的固定文本
pub const ANALYSIS_FALLBACK: &str =
    "暂时无法生成 AI 成绩分析，请参考上方各分类得分自行复习。\n\nAI analysis is currently unavailable. Please review the category breakdown above.";

/// 计算成绩
///
/// 只统计已加载的题目；未作答的题目计为错误。
pub fn score(session: &ExamSession) -> ScoreReport {
    let mut domain_breakdown: BTreeMap<Category, CategoryTally> = Category::ALL
        .into_iter()
        .map(|c| (c, CategoryTally::default()))
        .collect();

    let mut correct_count = 0;
    for question in session.questions() {
        let correct = session
            .answer_for(&question.id)
            .is_some_and(|key| question.is_correct(key));

        let tally = domain_breakdown.entry(question.category).or_default();
        tally.total += 1;
        if correct {
            tally.correct += 1;
            correct_count += 1;
        }
    }

    let total_questions = session.loaded_count();

    ScoreReport {
        score: percentage(correct_count, total_questions),
        total_questions,
        correct_count,
        domain_breakdown,
    }
}

/// 百分比四舍五入，没有题目时为 0
fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * correct as f64 / total as f64).round() as u32
}

/// 请求成绩分析
///
/// 分析只是锦上添花：失败或返回空文本时使用 `ANALYSIS_FALLBACK`，不向上传递错误。
pub async fn request_analysis<P: ContentProvider + ?Sized>(
    provider: &P,
    summary: &ScoreReport,
) -> String {
    info!("🤖 正在请求成绩分析...");
    match provider.fetch_analysis(summary).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            warn!("成绩分析返回空文本，使用默认文本");
            ANALYSIS_FALLBACK.to_string()
        }
        Err(e) => {
            warn!("成绩分析失败，使用默认文本: {}", e);
            ANALYSIS_FALLBACK.to_string()
        }
    }
}
