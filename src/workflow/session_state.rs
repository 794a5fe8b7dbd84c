//! 考试会话状态
//!
//! 考试进度的唯一数据源，只能通过下面几个操作修改：
//! `select_set` / `record_answer` / `append_questions` / `advance` /
//! `mark_complete` / `reset`

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SessionError;
use crate::models::{Question, SetId};

/// 作答结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// 已记录
    Recorded,
    /// 该题已作答，答案保持不变
    AlreadyAnswered,
    /// 正在加载题目，操作被忽略
    Busy,
}

/// 前进结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// 已前进到新位置
    Moved(usize),
    /// 已是最后一题
    AtEnd,
    /// 下一题尚未加载
    NeedsLoad,
    /// 正在加载题目，操作被忽略
    Busy,
}

/// 考试会话
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSession {
    set_id: Option<SetId>,
    questions: Vec<Question>,
    position: usize,
    answers: BTreeMap<String, String>,
    completed: bool,
    started_at: Option<DateTime<Utc>>,
    total_target: usize,
    /// 配置的每套题目数，`total_target` 可能被题库实际数量截短
    configured_target: usize,
    /// 每次选题或重置加一，用于识别过期的请求结果
    generation: u64,
    #[serde(skip)]
    loading: bool,
}

impl ExamSession {
    /// 创建空会话（尚未选择试题）
    pub fn new(total_target: usize) -> Self {
        Self {
            set_id: None,
            questions: Vec::new(),
            position: 0,
            answers: BTreeMap::new(),
            completed: false,
            started_at: None,
            total_target: total_target.max(1),
            configured_target: total_target.max(1),
            generation: 0,
            loading: false,
        }
    }

    /// 回到未开始状态，请求中的标记保留到请求结束
    fn renew(&mut self) {
        let generation = self.generation + 1;
        let loading = self.loading;
        *self = Self::new(self.configured_target);
        self.generation = generation;
        self.loading = loading;
    }

    // ========== 修改操作 ==========

    /// 选择试题，开始新会话
    pub fn select_set(&mut self, set_id: SetId, now: DateTime<Utc>) -> Result<(), SessionError> {
        if let Some(active) = self.set_id {
            return Err(SessionError::AlreadyActive { set_id: active });
        }

        self.renew();
        self.set_id = Some(set_id);
        self.started_at = Some(now);
        Ok(())
    }

    /// 记录答案
    ///
    /// 答案一经记录不可修改，重复作答会被忽略。
    pub fn record_answer(
        &mut self,
        question_id: &str,
        option_key: &str,
    ) -> Result<AnswerOutcome, SessionError> {
        if self.set_id.is_none() {
            return Err(SessionError::NoActiveSession);
        }
        if self.completed {
            return Err(SessionError::Completed);
        }
        if self.loading {
            return Ok(AnswerOutcome::Busy);
        }

        let question = self
            .question(question_id)
            .ok_or_else(|| SessionError::QuestionNotLoaded {
                question_id: question_id.to_string(),
            })?;

        if self.answers.contains_key(question_id) {
            return Ok(AnswerOutcome::AlreadyAnswered);
        }

        if !question.has_option(option_key) {
            return Err(SessionError::UnknownOption {
                question_id: question_id.to_string(),
                key: option_key.to_string(),
            });
        }

        self.answers
            .insert(question_id.to_string(), option_key.to_string());
        Ok(AnswerOutcome::Recorded)
    }

    /// 按顺序追加一批题目
    pub fn append_questions(&mut self, batch: Vec<Question>) {
        self.questions.extend(batch);
    }

    /// 前进到下一题
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.loading {
            return AdvanceOutcome::Busy;
        }

        let next = self.position + 1;
        if next >= self.total_target {
            return AdvanceOutcome::AtEnd;
        }
        if next >= self.questions.len() {
            return AdvanceOutcome::NeedsLoad;
        }

        self.position = next;
        AdvanceOutcome::Moved(next)
    }

    /// 标记考试完成（只能由未完成变为完成）
    pub fn mark_complete(&mut self) -> Result<(), SessionError> {
        if self.set_id.is_none() {
            return Err(SessionError::NoActiveSession);
        }
        self.completed = true;
        Ok(())
    }

    /// 清空会话，回到未开始状态
    pub fn reset(&mut self) {
        self.renew();
    }

    /// 题库实际题目数少于配置时截短本套题目数
    pub fn limit_target(&mut self, available: usize) {
        self.total_target = self.configured_target.min(available.max(1));
        self.position = self.position.min(self.total_target - 1);
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    // ========== 只读访问 ==========

    pub fn set_id(&self) -> Option<SetId> {
        self.set_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.set_id.is_some()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn loaded_count(&self) -> usize {
        self.questions.len()
    }

    pub fn total_target(&self) -> usize {
        self.total_target
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.position)
    }

    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// 整套题目是否都已作答
    pub fn all_answered(&self) -> bool {
        self.answers.len() >= self.total_target
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// 已标记完成，或整套题目都已作答
    pub fn is_finished(&self) -> bool {
        self.completed || self.all_answered()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// 已用时间
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.started_at
            .map(|start| now - start)
            .unwrap_or_else(Duration::zero)
    }
}
