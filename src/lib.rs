//! # Exam Simulator
//!
//! 双语（中文 / 英文）云计算认证模拟考试
//!
//! ## 架构设计
//!
//! ### ① 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `LlmService` - 调用 OpenAI 兼容接口
//! - `ContentProvider` - 出题与成绩分析能力（LLM / 离线 TOML 题库）
//!
//! ### ② 流程层（Workflow）
//! - `workflow/` - 定义"一场考试"的状态与流程
//! - `ExamSession` - 会话状态，唯一数据源
//! - `BatchLoader` - 按需分批加载题目，同一时刻最多一个请求
//! - `scorer` - 纯函数计算成绩，分析失败时使用默认文本
//! - `ExamFlow` - 流程编排（选题 → 作答 → 交卷 → 重置）
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/app` - 终端交互程序
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, LoadError, ProviderError, SessionError};
pub use models::{Category, ExamResult, Language, Question, ScoreReport, SetId};
pub use orchestrator::App;
pub use services::{ContentProvider, LlmContentProvider, TomlQuestionBank};
pub use workflow::{ExamFlow, ExamSession};
