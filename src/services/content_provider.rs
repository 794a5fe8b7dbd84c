//! 内容提供方 - 业务能力层
//!
//! 提供"出题"和"成绩分析"两种能力，是会话之外唯一的异步协作者。
//! 返回的数据一律视为不可信输入，由调用方校验后再合并。

use async_openai::types::chat::ResponseFormatJsonSchema;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ProviderError;
use crate::models::{Category, Question, ScoreReport, SetId};
use crate::services::LlmService;

/// 内容提供方
///
/// - `fetch_questions` 返回 0 到 `count` 个题目
/// - `fetch_analysis` 尽力而为，失败由调用方降级
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// 提供方名称（仅用于日志）
    fn name(&self) -> &str;

    /// 某套试题实际可提供的题目数，未知时为 `None`
    fn set_size(&self, _set_id: SetId) -> Option<usize> {
        None
    }

    /// 获取第 `start_index` 题起的 `count` 个题目
    async fn fetch_questions(
        &self,
        set_id: SetId,
        start_index: usize,
        count: usize,
    ) -> Result<Vec<Question>, ProviderError>;

    /// 根据成绩生成文字分析
    async fn fetch_analysis(&self, summary: &ScoreReport) -> Result<String, ProviderError>;
}

/// 基于 LLM 的内容提供方
pub struct LlmContentProvider {
    llm_service: LlmService,
    questions_per_set: usize,
}

impl LlmContentProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            llm_service: LlmService::new(config),
            questions_per_set: config.questions_per_set,
        }
    }

    /// 构建出题消息
    ///
    /// 返回 (user_message, system_message)
    fn build_question_messages(
        &self,
        set_id: SetId,
        start_index: usize,
        count: usize,
    ) -> (String, String) {
        let system_message = "你是一名资深的云计算认证考官，负责编写高质量的单选模拟题。\
                              每道题都必须同时提供中文和英文版本，两种语言的含义完全一致。"
            .to_string();

        let categories = Category::ALL
            .iter()
            .map(|c| format!("  - {}: {} / {}", c.code(), c.name_zh(), c.name_en()))
            .collect::<Vec<_>>()
            .join("\n");

        let user_message = format!(
            r#"请为第 {set_id} 套模拟试卷（共 {total} 题）编写第 {first} 题到第 {last} 题，共 {count} 道单选题。

【要求】
- 题目ID 使用格式 "s{set_id}-<三位题号>"，例如第 {first} 题为 "s{set_id}-{first:03}"
- 每题 4 个选项，key 依次为 "A"、"B"、"C"、"D"
- correctAnswer 必须是其中一个选项的 key，并且正确答案位置要分布均匀
- prompt、options[].text、explanation 都要提供 zh 和 en 两个字段
- category 只能取以下值之一，整套试卷中各分类比例大致均衡：
{categories}
- 同一套试卷中题目不能重复，题目之间保持独立

只返回符合 JSON Schema 的 JSON，不要返回任何其他内容。"#,
            set_id = set_id,
            total = self.questions_per_set,
            first = start_index + 1,
            last = start_index + count,
            count = count,
            categories = categories,
        );

        (user_message, system_message)
    }

    /// 构建成绩分析消息
    fn build_analysis_messages(summary: &ScoreReport) -> Result<(String, String), ProviderError> {
        let system_message = "你是一名耐心的备考导师，根据学员的模拟考试成绩给出简明的学习建议。".to_string();

        let breakdown: Vec<JsonValue> = Category::ALL
            .iter()
            .map(|c| {
                let tally = summary.tally(*c);
                json!({
                    "category": c.code(),
                    "name": c.name_en(),
                    "correct": tally.correct,
                    "total": tally.total,
                })
            })
            .collect();

        let payload = json!({
            "score": summary.score,
            "totalQuestions": summary.total_questions,
            "correctCount": summary.correct_count,
            "domainBreakdown": breakdown,
        });
        let summary_json = serde_json::to_string_pretty(&payload)?;

        let user_message = format!(
            r#"以下是学员本次模拟考试的成绩（JSON）：
{}

请用 Markdown 输出分析，先中文后英文，包括：
1. 总体表现评价
2. 表现较好的分类
3. 需要加强的分类及具体复习建议"#,
            summary_json
        );

        Ok((user_message, system_message))
    }
}

#[async_trait]
impl ContentProvider for LlmContentProvider {
    fn name(&self) -> &str {
        self.llm_service.model_name()
    }

    async fn fetch_questions(
        &self,
        set_id: SetId,
        start_index: usize,
        count: usize,
    ) -> Result<Vec<Question>, ProviderError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        info!(
            "🤖 正在生成第 {} 套第 {}-{} 题...",
            set_id,
            start_index + 1,
            start_index + count
        );

        let (user_message, system_message) =
            self.build_question_messages(set_id, start_index, count);

        let response = self
            .llm_service
            .send_to_llm(&user_message, Some(&system_message), Some(question_batch_schema()))
            .await?;

        let questions = parse_question_batch(&response)?;
        debug!("LLM 返回 {} 个题目", questions.len());

        Ok(questions)
    }

    async fn fetch_analysis(&self, summary: &ScoreReport) -> Result<String, ProviderError> {
        let (user_message, system_message) = Self::build_analysis_messages(summary)?;
        self.llm_service
            .send_to_llm(&user_message, Some(&system_message), None)
            .await
    }
}

/// 出题结果的两种形态：`{"questions": [...]}` 或直接数组
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionBatchPayload {
    Wrapped { questions: Vec<Question> },
    Bare(Vec<Question>),
}

/// 解析出题响应
///
/// 模型偶尔会把 JSON 包在 Markdown 代码块中，先去掉代码块再解析。
pub fn parse_question_batch(response: &str) -> Result<Vec<Question>, ProviderError> {
    let body = strip_code_fence(response);
    let payload: QuestionBatchPayload = serde_json::from_str(body)?;
    Ok(match payload {
        QuestionBatchPayload::Wrapped { questions } => questions,
        QuestionBatchPayload::Bare(questions) => questions,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let fenced = Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$")
        .ok()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1));

    match fenced {
        Some(body) => body.as_str(),
        None => text.trim(),
    }
}

fn bilingual_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {
            "zh": { "type": "string" },
            "en": { "type": "string" }
        },
        "required": ["zh", "en"],
        "additionalProperties": false
    })
}

/// 出题结果的 JSON Schema（strict 模式要求所有字段必填）
pub fn question_batch_schema() -> ResponseFormatJsonSchema {
    let category_codes: Vec<&str> = Category::ALL.iter().map(|c| c.code()).collect();

    let schema = json!({
        "type": "object",
        "properties": {
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "category": { "type": "string", "enum": category_codes },
                        "prompt": bilingual_schema(),
                        "options": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "key": { "type": "string" },
                                    "text": bilingual_schema()
                                },
                                "required": ["key", "text"],
                                "additionalProperties": false
                            }
                        },
                        "correctAnswer": { "type": "string" },
                        "explanation": bilingual_schema()
                    },
                    "required": ["id", "category", "prompt", "options", "correctAnswer", "explanation"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["questions"],
        "additionalProperties": false
    });

    ResponseFormatJsonSchema {
        description: Some("A batch of bilingual multiple-choice exam questions".to_string()),
        name: "question_batch".to_string(),
        schema: Some(schema),
        strict: Some(true),
    }
}
