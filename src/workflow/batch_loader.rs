//! 题目批量加载
//!
//! 按需向内容提供方请求下一批题目，每次只请求一小批。
//!
//! 同一会话同时最多只有一个未完成的请求：加载锁充当请求队列，
//! 第二个调用方会等待第一个完成后重新检查已加载范围，
//! 同一段缺口只会请求一次。

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::{LoadError, SessionError};
use crate::models::Question;
use crate::services::ContentProvider;
use crate::utils::logging::log_batch_loaded;
use crate::workflow::session_state::ExamSession;

/// 默认每批题目数
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// 加载结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 目标位置已在已加载范围内，未发起请求
    AlreadyLoaded,
    /// 本次加载追加了 `count` 个题目，起始位置为 `offset`
    Appended { offset: usize, count: usize },
}

/// 批量加载器
pub struct BatchLoader<P: ?Sized> {
    provider: Arc<P>,
    batch_size: usize,
    /// 请求队列：持有期间不会有第二个请求发出（出题和成绩分析共用）
    in_flight: Mutex<()>,
}

impl<P: ContentProvider + ?Sized> BatchLoader<P> {
    pub fn new(provider: Arc<P>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            in_flight: Mutex::new(()),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// 占用请求队列，直到返回值被释放
    pub(crate) async fn request_slot(&self) -> MutexGuard<'_, ()> {
        self.in_flight.lock().await
    }

    /// 确保 `target_index` 处的题目已加载
    ///
    /// 请求失败或返回数据非法时返回错误，会话保持不变，由调用方决定是否重试。
    pub async fn ensure_loaded(
        &self,
        session: &Mutex<ExamSession>,
        target_index: usize,
    ) -> Result<LoadOutcome, LoadError> {
        let _queue = self.request_slot().await;

        // 只在检查和提交时短暂持有会话锁，请求期间会话保持可读
        let (set_id, generation, offset, remaining) = {
            let mut state = session.lock().await;
            let set_id = state.set_id().ok_or(SessionError::NoActiveSession)?;
            if state.is_completed() {
                return Err(SessionError::Completed.into());
            }
            let total = state.total_target();

            if target_index >= total {
                return Err(LoadError::OutOfRange {
                    index: target_index,
                    total,
                });
            }

            let loaded = state.loaded_count();
            if target_index < loaded {
                return Ok(LoadOutcome::AlreadyLoaded);
            }

            state.set_loading(true);
            (
                set_id,
                state.generation(),
                loaded,
                self.batch_size.min(total - loaded),
            )
        };

        debug!(
            "请求第 {} 套: offset={}, count={} (目标位置 {})",
            set_id, offset, remaining, target_index
        );

        let fetched = self
            .provider
            .fetch_questions(set_id, offset, remaining)
            .await;

        let mut state = session.lock().await;
        state.set_loading(false);

        // 请求期间会话被重置或重新选题
        if state.generation() != generation || state.loaded_count() != offset {
            warn!("第 {} 套的加载结果已过期，丢弃", set_id);
            return Err(LoadError::Stale);
        }

        let batch = fetched.map_err(|source| {
            warn!("第 {} 套第 {} 题起加载失败: {}", set_id, offset + 1, source);
            LoadError::Provider { offset, source }
        })?;

        if batch.is_empty() {
            warn!("第 {} 套第 {} 题起没有返回题目", set_id, offset + 1);
            return Err(LoadError::EmptyBatch { offset });
        }

        validate_batch(&batch, remaining, state.questions()).inspect_err(|e| {
            warn!("第 {} 套第 {} 题起的批次被拒绝: {}", set_id, offset + 1, e);
        })?;

        let count = batch.len();
        state.append_questions(batch);
        log_batch_loaded(offset, count, state.loaded_count(), state.total_target());

        Ok(LoadOutcome::Appended { offset, count })
    }
}

/// 校验整批题目，任何一题不合法则整批拒绝
fn validate_batch(
    batch: &[Question],
    requested: usize,
    loaded: &[Question],
) -> Result<(), LoadError> {
    if batch.len() > requested {
        return Err(LoadError::TooManyQuestions {
            requested,
            returned: batch.len(),
        });
    }

    let mut seen: HashSet<&str> = loaded.iter().map(|q| q.id.as_str()).collect();
    for (position, question) in batch.iter().enumerate() {
        question
            .validate()
            .map_err(|defect| LoadError::Malformed {
                position,
                question_id: question.id.clone(),
                defect,
            })?;

        if !seen.insert(question.id.as_str()) {
            return Err(LoadError::DuplicateQuestion {
                question_id: question.id.clone(),
            });
        }
    }

    Ok(())
}
