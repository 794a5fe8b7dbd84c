//! LLM 服务 - 业务能力层
//!
//! 只负责"调用 LLM"能力，不关心出题还是分析
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ProviderError;

const CHAT_ENDPOINT: &str = "chat/completions";

/// LLM 服务
///
/// 职责：
/// - 持有 OpenAI 兼容客户端
/// - 提供通用的 LLM 调用接口（纯文本或 JSON Schema 约束输出）
/// - 不认识 Question / Session
pub struct LlmService {
    /// 未配置密钥时为 None，调用时报错
    client: Option<Client<OpenAIConfig>>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let client = config.llm_api_key.as_deref().map(|api_key| {
            // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
            let openai_config = OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(&config.llm_api_base_url);
            Client::with_config(openai_config)
        });

        if client.is_none() {
            warn!("未配置 LLM_API_KEY，所有 LLM 调用都会失败");
        }

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            temperature: 0.7,
            max_tokens: 4096,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 通用的 LLM 调用函数
    ///
    /// 这是最基础的 LLM 调用接口，出题和成绩分析都基于此函数。
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `json_schema`: 结构化输出约束（可选），为 None 时返回自由文本
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已去除首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        json_schema: Option<ResponseFormatJsonSchema>,
    ) -> Result<String, ProviderError> {
        let client = self.client.as_ref().ok_or(ProviderError::MissingApiKey)?;

        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        // 构建消息列表
        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| ProviderError::request_failed(CHAT_ENDPOINT, e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| ProviderError::request_failed(CHAT_ENDPOINT, e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 构建请求
        let mut request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| ProviderError::request_failed(CHAT_ENDPOINT, e))?;

        if let Some(schema) = json_schema {
            debug!("使用 JSON Schema 约束输出: {}", schema.name);
            request.response_format = Some(ResponseFormat::JsonSchema {
                json_schema: schema,
            });
        }

        // 调用 API
        let response = client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            ProviderError::request_failed(CHAT_ENDPOINT, e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse {
                endpoint: CHAT_ENDPOINT.to_string(),
            })?;

        Ok(content.trim().to_string())
    }
}
