pub mod content_provider;
pub mod llm_service;
pub mod question_bank;

pub use content_provider::{ContentProvider, LlmContentProvider};
pub use llm_service::LlmService;
pub use question_bank::TomlQuestionBank;
