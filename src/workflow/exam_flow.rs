//! 考试流程 - 流程层
//!
//! 展示层只和这里打交道：选择试题 → 作答 / 下一题 → 交卷 → 重置。
//!
//! 流程顺序：
//! 1. start: 绑定试题并加载第一批
//! 2. answer / next: 作答，必要时预加载下一批再前进
//! 3. finish: 计算成绩，再请求 AI 分析
//!
//! 出题和成绩分析共用加载器的请求队列，同一时间最多一个请求在途。

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppResult, LoadError, SessionError};
use crate::models::{ExamResult, SetId};
use crate::services::ContentProvider;
use crate::utils::logging::log_session_start;
use crate::utils::Clock;
use crate::workflow::batch_loader::{BatchLoader, LoadOutcome};
use crate::workflow::scorer;
use crate::workflow::session_state::{AdvanceOutcome, AnswerOutcome, ExamSession};

/// 考试流程
pub struct ExamFlow<P: ?Sized> {
    session: Mutex<ExamSession>,
    loader: BatchLoader<P>,
    result: Mutex<Option<ExamResult>>,
    set_count: u8,
    clock: Clock,
}

impl<P: ContentProvider + ?Sized> ExamFlow<P> {
    /// 创建新的考试流程
    pub fn new(provider: Arc<P>, config: &Config) -> Self {
        Self {
            session: Mutex::new(ExamSession::new(config.questions_per_set)),
            loader: BatchLoader::new(provider, config.batch_size),
            result: Mutex::new(None),
            set_count: config.set_count,
            clock: Clock::System,
        }
    }

    /// 使用指定时钟（测试用）
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// 开始考试
    ///
    /// 第一批加载失败时会话仍保持绑定，可调用 `load_current` 重试。
    pub async fn start(&self, set_id: SetId) -> AppResult<LoadOutcome> {
        if set_id.get() == 0 || set_id.get() > self.set_count {
            return Err(SessionError::InvalidSet {
                set_id,
                max: self.set_count,
            }
            .into());
        }

        let total = {
            let mut session = self.session.lock().await;
            session.select_set(set_id, self.clock.now())?;
            if let Some(available) = self.loader.provider().set_size(set_id) {
                session.limit_target(available);
            }
            session.total_target()
        };
        *self.result.lock().await = None;

        log_session_start(set_id, total);

        Ok(self.load_current().await?)
    }

    /// 确保当前题目已加载
    pub async fn load_current(&self) -> Result<LoadOutcome, LoadError> {
        let position = self.session.lock().await.position();
        self.loader.ensure_loaded(&self.session, position).await
    }

    /// 回答当前题目
    pub async fn answer(&self, option_key: &str) -> Result<AnswerOutcome, SessionError> {
        let mut session = self.session.lock().await;
        if !session.is_active() {
            return Err(SessionError::NoActiveSession);
        }
        let question_id = session
            .current_question()
            .map(|q| q.id.clone())
            .ok_or_else(|| SessionError::QuestionNotLoaded {
                question_id: format!("#{}", session.position() + 1),
            })?;

        let outcome = session.record_answer(&question_id, option_key)?;
        if outcome == AnswerOutcome::AlreadyAnswered {
            info!("题目 {} 已作答，忽略重复作答", question_id);
        }
        Ok(outcome)
    }

    /// 前进到下一题，下一题未加载时先加载
    ///
    /// 加载失败时停留在当前题，进度不丢失。
    pub async fn next(&self) -> Result<AdvanceOutcome, LoadError> {
        let (next_index, total) = {
            let session = self.session.lock().await;
            if !session.is_active() {
                return Err(SessionError::NoActiveSession.into());
            }
            if session.is_completed() {
                return Err(SessionError::Completed.into());
            }
            (session.position() + 1, session.total_target())
        };

        if next_index < total {
            self.loader.ensure_loaded(&self.session, next_index).await?;
        }

        Ok(self.session.lock().await.advance())
    }

    /// 交卷
    ///
    /// 先计算数值成绩，再请求分析；分析失败不影响成绩。
    /// 结果只计算一次，重复交卷返回已保存的结果。
    pub async fn finish(&self) -> AppResult<ExamResult> {
        let _queue = self.loader.request_slot().await;

        let (report, generation) = {
            let mut session = self.session.lock().await;
            session.mark_complete()?;
            if let Some(existing) = self.result.lock().await.clone() {
                return Ok(existing);
            }
            session.set_loading(true);
            (scorer::score(&session), session.generation())
        };

        info!(
            "📝 交卷: {}/{} 正确，得分 {}",
            report.correct_count, report.total_questions, report.score
        );

        let analysis = scorer::request_analysis(self.loader.provider().as_ref(), &report).await;
        let result = ExamResult::from_report(report).with_analysis(analysis);

        let mut session = self.session.lock().await;
        session.set_loading(false);

        // 分析请求期间会话可能已被重置
        if session.generation() != generation {
            warn!("交卷期间会话已重置，结果不保存");
            return Ok(result);
        }
        *self.result.lock().await = Some(result.clone());
        Ok(result)
    }

    /// 重置，回到未开始状态
    pub async fn reset(&self) {
        self.session.lock().await.reset();
        *self.result.lock().await = None;
        info!("🔄 会话已重置");
    }

    /// 会话快照（用于渲染）
    pub async fn snapshot(&self) -> ExamSession {
        self.session.lock().await.clone()
    }

    /// 已保存的考试结果
    pub async fn result(&self) -> Option<ExamResult> {
        self.result.lock().await.clone()
    }

    pub fn set_count(&self) -> u8 {
        self.set_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ProviderError};
    use crate::models::question::tests::sample_question;
    use crate::models::{Category, Question, ScoreReport};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// 可让第一次出题请求挂起的提供方，挂起直到 `gate` 被通知
    struct GatedProvider {
        fetches: AtomicUsize,
        analyses: AtomicUsize,
        hold_first_fetch: bool,
        gate: Notify,
    }

    impl GatedProvider {
        fn new(hold_first_fetch: bool) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                analyses: AtomicUsize::new(0),
                hold_first_fetch,
                gate: Notify::new(),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn analyses(&self) -> usize {
            self.analyses.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentProvider for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        async fn fetch_questions(
            &self,
            _set_id: SetId,
            start_index: usize,
            count: usize,
        ) -> Result<Vec<Question>, ProviderError> {
            let call = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            if self.hold_first_fetch && call == 1 {
                self.gate.notified().await;
            }
            Ok((start_index..start_index + count)
                .map(|i| {
                    sample_question(&format!("call{}-q{}", call, i), Category::CloudConcepts, "A")
                })
                .collect())
        }

        async fn fetch_analysis(&self, _summary: &ScoreReport) -> Result<String, ProviderError> {
            self.analyses.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok("继续保持".to_string())
        }
    }

    fn config() -> Config {
        Config {
            questions_per_set: 10,
            batch_size: 5,
            set_count: 5,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_outstanding_across_reset_is_discarded() {
        let provider = Arc::new(GatedProvider::new(true));
        let flow = ExamFlow::new(provider.clone(), &config());

        let restart = async {
            while provider.fetches() == 0 {
                tokio::task::yield_now().await;
            }
            flow.reset().await;
            // 旧请求尚未结束，重置后的会话仍不可操作
            assert!(flow.snapshot().await.is_loading());

            provider.gate.notify_one();
            flow.start(SetId::new(1)).await
        };
        let (first, second) = tokio::join!(flow.start(SetId::new(1)), restart);

        assert!(matches!(first, Err(AppError::Load(LoadError::Stale))));
        assert_eq!(
            second.unwrap(),
            LoadOutcome::Appended {
                offset: 0,
                count: 5
            }
        );

        let session = flow.snapshot().await;
        assert_eq!(session.loaded_count(), 5);
        assert_eq!(session.questions()[0].id, "call2-q0");
        assert!(!session.is_loading());
        assert_eq!(provider.fetches(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_finish_requests_analysis_once() {
        let provider = Arc::new(GatedProvider::new(false));
        let flow = ExamFlow::new(provider.clone(), &config());
        flow.start(SetId::new(1)).await.unwrap();
        flow.answer("A").await.unwrap();

        let (a, b) = tokio::join!(flow.finish(), flow.finish());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a, b);
        assert_eq!(a.correct_count, 1);
        assert_eq!(provider.analyses(), 1);
        assert!(!flow.snapshot().await.is_loading());
        assert_eq!(flow.result().await, Some(a));
    }

    #[tokio::test]
    async fn test_next_after_finish_is_rejected() {
        let provider = Arc::new(GatedProvider::new(false));
        let flow = ExamFlow::new(provider.clone(), &config());
        flow.start(SetId::new(1)).await.unwrap();
        flow.finish().await.unwrap();

        let err = flow.next().await.unwrap_err();
        assert!(matches!(err, LoadError::Session(SessionError::Completed)));
        assert_eq!(flow.snapshot().await.position(), 0);
        assert_eq!(provider.fetches(), 1);
    }
}
