//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层是整个程序的入口，负责选择内容提供方并驱动终端交互。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (终端输入输出)
//!     ↓
//! workflow::ExamFlow (选题 / 作答 / 前进 / 交卷)
//!     ↓
//! workflow::{ExamSession, BatchLoader, scorer}
//!     ↓
//! services (能力层：LLM 出题与分析 / 离线题库)
//! ```
//!
//! ## 设计原则
//!
//! 1. **向下依赖**：编排层 → workflow → services
//! 2. **无业务逻辑**：只做输入输出，不做判分和加载

pub mod app;

pub use app::{App, Command};
