use crate::models::Language;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- 考试配置 ---
    /// 每套试题的题目总数
    pub questions_per_set: usize,
    /// 每次向内容提供方请求的题目数量
    pub batch_size: usize,
    /// 可选的试题套数（套号从 1 开始）
    pub set_count: u8,
    /// 终端显示语言
    pub display_language: Language,
    /// 离线题库目录（设置后不再调用 LLM 出题）
    pub question_bank_dir: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    /// 缺省时不会在启动阶段报错，而是每次调用时失败
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            questions_per_set: 90,
            batch_size: 5,
            set_count: 5,
            display_language: Language::Zh,
            question_bank_dir: None,
            verbose_logging: false,
            llm_api_key: None,
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            questions_per_set: parse_env("QUESTIONS_PER_SET")
                .filter(|v: &usize| *v > 0)
                .unwrap_or(default.questions_per_set),
            batch_size: parse_env("BATCH_SIZE")
                .filter(|v: &usize| *v > 0)
                .unwrap_or(default.batch_size),
            set_count: parse_env("SET_COUNT")
                .filter(|v: &u8| *v > 0)
                .unwrap_or(default.set_count),
            display_language: parse_env("DISPLAY_LANGUAGE").unwrap_or(default.display_language),
            question_bank_dir: non_empty_env("QUESTION_BANK_DIR").or(default.question_bank_dir),
            verbose_logging: parse_env("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            llm_api_key: non_empty_env("LLM_API_KEY").or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
