use thiserror::Error;

use crate::models::{QuestionDefect, SetId};

/// 应用程序错误类型
///
/// 任何一种错误都不会终止进程，调用方拿到错误后回到可重试的交互状态。
#[derive(Debug, Error)]
pub enum AppError {
    /// 内容提供方错误
    #[error("内容提供方错误: {0}")]
    Provider(#[from] ProviderError),
    /// 会话状态错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 题目加载错误
    #[error("加载错误: {0}")]
    Load(#[from] LoadError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 内容提供方（LLM / 离线题库）错误
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 未配置 API 密钥，调用时才报错
    #[error("未配置 LLM_API_KEY，无法调用内容提供方")]
    MissingApiKey,
    /// 网络或配额等传输层失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("返回内容为空 ({endpoint})")]
    EmptyResponse { endpoint: String },
    /// 结构化输出无法解析
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: serde_json::Error,
    },
    /// 离线题库中不存在该套试题
    #[error("题库中不存在第 {set_id} 套试题")]
    UnknownSet { set_id: SetId },
    /// 提供方不支持该能力
    #[error("内容提供方不支持: {capability}")]
    Unsupported { capability: &'static str },
}

impl From<serde_json::Error> for ProviderError {
    fn from(source: serde_json::Error) -> Self {
        ProviderError::JsonParseFailed { source }
    }
}

impl ProviderError {
    /// 创建请求失败错误
    pub fn request_failed(
        endpoint: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ProviderError::RequestFailed {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }
}

/// 会话状态错误
///
/// 重复作答、越界前进不属于错误，见 `AnswerOutcome` / `AdvanceOutcome`。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 已有进行中的考试
    #[error("已有进行中的考试 (第 {set_id} 套)，请先重置")]
    AlreadyActive { set_id: SetId },
    /// 尚未选择试题
    #[error("尚未选择试题")]
    NoActiveSession,
    /// 套号超出范围
    #[error("套号 {set_id} 超出范围 [1, {max}]")]
    InvalidSet { set_id: SetId, max: u8 },
    /// 题目尚未加载
    #[error("题目尚未加载: {question_id}")]
    QuestionNotLoaded { question_id: String },
    /// 选项不存在
    #[error("题目 {question_id} 不存在选项 {key}")]
    UnknownOption { question_id: String, key: String },
    /// 考试已结束
    #[error("考试已结束")]
    Completed,
}

/// 题目批量加载错误
///
/// 任何一种加载失败都不会修改会话。
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Session(#[from] SessionError),
    /// 目标位置超出整套题目数
    #[error("题目位置 {index} 超出范围 (共 {total} 题)")]
    OutOfRange { index: usize, total: usize },
    /// 内容提供方调用失败
    #[error("第 {offset} 题起的批次加载失败: {source}")]
    Provider {
        offset: usize,
        #[source]
        source: ProviderError,
    },
    /// 返回数量超过请求数量
    #[error("返回 {returned} 题，超过请求的 {requested} 题")]
    TooManyQuestions { requested: usize, returned: usize },
    /// 返回的题目结构非法
    #[error("第 {position} 个题目 ({question_id}) 结构非法: {defect}")]
    Malformed {
        position: usize,
        question_id: String,
        defect: QuestionDefect,
    },
    /// 请求了题目却一题也没有返回
    #[error("第 {offset} 题起没有返回任何题目")]
    EmptyBatch { offset: usize },
    /// 题目ID与已加载题目重复
    #[error("题目ID重复: {question_id}")]
    DuplicateQuestion { question_id: String },
    /// 加载期间会话被重置或更换，结果已丢弃
    #[error("加载期间会话已变化，结果已丢弃")]
    Stale,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 题库目录无法使用
    #[error("题库目录无法使用 ({path}): {reason}")]
    QuestionBankUnavailable { path: String, reason: String },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
