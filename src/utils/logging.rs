//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use tracing::info;

use crate::models::{Category, ExamResult, Language, SetId};

/// 记录程序启动信息
///
/// # 参数
/// - `provider`: 内容提供方名称
/// - `questions_per_set`: 每套题目数
/// - `batch_size`: 每批题目数
pub fn log_startup(provider: &str, questions_per_set: usize, batch_size: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 模拟考试");
    info!("🧠 内容提供方: {}", provider);
    info!("📊 每套 {} 题，每批加载 {} 题", questions_per_set, batch_size);
    info!("{}", "=".repeat(60));
}

/// 记录考试开始信息
pub fn log_session_start(set_id: SetId, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始第 {} 套试题，共 {} 题", set_id, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次加载信息
///
/// # 参数
/// - `offset`: 起始题号（从 0 开始）
/// - `count`: 本批题目数
/// - `loaded`: 已加载总数
/// - `total`: 整套题目数
pub fn log_batch_loaded(offset: usize, count: usize, loaded: usize, total: usize) {
    info!(
        "✓ 已加载第 {}-{} 题 (已加载 {}/{})",
        offset + 1,
        offset + count,
        loaded,
        total
    );
}

/// 打印最终成绩
///
/// # 参数
/// - `result`: 考试结果
/// - `language`: 分类名称使用的语言
pub fn print_final_result(result: &ExamResult, language: Language) {
    info!("\n{}", "=".repeat(60));
    info!("📊 考试完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "✅ 得分: {} ({}/{})",
        result.score, result.correct_count, result.total_questions
    );
    for category in Category::ALL {
        let tally = result
            .domain_breakdown
            .get(&category)
            .copied()
            .unwrap_or_default();
        info!(
            "   {}: {}/{}",
            category.name(language),
            tally.correct,
            tally.total
        );
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_text("共享责任模型", 4), "共享责任...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
