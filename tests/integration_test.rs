use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use exam_simulator::config::Config;
use exam_simulator::error::{AppError, LoadError, ProviderError, SessionError};
use exam_simulator::models::{AnswerOption, BilingualText, Category, CategoryTally};
use exam_simulator::utils::Clock;
use exam_simulator::workflow::{
    score, AdvanceOutcome, AnswerOutcome, ExamFlow, ExamSession, LoadOutcome, ANALYSIS_FALLBACK,
};
use exam_simulator::{ContentProvider, Question, ScoreReport, SetId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 按脚本返回结果的内容提供方
struct ScriptedProvider {
    calls: AtomicUsize,
    /// 这些调用序号（从 1 开始）返回错误
    failing_calls: HashSet<usize>,
    analysis: Option<String>,
    /// 从该位置起不再返回题目
    exhausted_at: Option<usize>,
    requests: Mutex<Vec<(SetId, usize, usize)>>,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing_calls: HashSet::new(),
            analysis: Some("## 分析\n继续保持".to_string()),
            exhausted_at: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(mut self, call: usize) -> Self {
        self.failing_calls.insert(call);
        self
    }

    fn without_analysis(mut self) -> Self {
        self.analysis = None;
        self
    }

    fn exhausted_at(mut self, offset: usize) -> Self {
        self.exhausted_at = Some(offset);
        self
    }

    fn requests(&self) -> Vec<(SetId, usize, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

fn make_question(set_id: SetId, index: usize) -> Question {
    Question {
        id: format!("s{}-{:03}", set_id, index + 1),
        category: Category::ALL[index % Category::ALL.len()],
        prompt: BilingualText::new(format!("第 {} 题", index + 1), format!("Question {}", index + 1)),
        options: ["A", "B", "C", "D"]
            .iter()
            .map(|key| AnswerOption {
                key: key.to_string(),
                text: BilingualText::new(format!("选项 {}", key), format!("Option {}", key)),
            })
            .collect(),
        correct_answer: "A".to_string(),
        explanation: BilingualText::new("解析", "Explanation"),
    }
}

#[async_trait]
impl ContentProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_questions(
        &self,
        set_id: SetId,
        start_index: usize,
        count: usize,
    ) -> Result<Vec<Question>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests
            .lock()
            .unwrap()
            .push((set_id, start_index, count));

        if self.failing_calls.contains(&call) {
            return Err(ProviderError::request_failed(
                "scripted",
                std::io::Error::new(std::io::ErrorKind::TimedOut, "quota exceeded"),
            ));
        }

        if self.exhausted_at.is_some_and(|end| start_index >= end) {
            return Ok(Vec::new());
        }

        Ok((start_index..start_index + count)
            .map(|i| make_question(set_id, i))
            .collect())
    }

    async fn fetch_analysis(&self, _summary: &ScoreReport) -> Result<String, ProviderError> {
        self.analysis.clone().ok_or(ProviderError::EmptyResponse {
            endpoint: "scripted".to_string(),
        })
    }
}

fn config(questions_per_set: usize) -> Config {
    Config {
        questions_per_set,
        batch_size: 5,
        set_count: 5,
        ..Config::default()
    }
}

fn flow(provider: Arc<ScriptedProvider>, questions_per_set: usize) -> ExamFlow<ScriptedProvider> {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
    ExamFlow::new(provider, &config(questions_per_set)).with_clock(Clock::fixed(start))
}

#[tokio::test]
async fn test_initial_load_and_first_answer_scores_100() {
    let provider = Arc::new(ScriptedProvider::new());
    let flow = flow(provider.clone(), 90);

    let outcome = flow.start(SetId::new(1)).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Appended { offset: 0, count: 5 });

    let session = flow.snapshot().await;
    assert_eq!(session.position(), 0);
    assert_eq!(session.loaded_count(), 5);
    assert_eq!(provider.requests(), vec![(SetId::new(1), 0, 5)]);

    let first = session.current_question().unwrap().clone();
    assert_eq!(
        flow.answer(&first.correct_answer).await.unwrap(),
        AnswerOutcome::Recorded
    );

    // 截断到第一题的会话
    let mut truncated = ExamSession::new(90);
    truncated
        .select_set(SetId::new(1), Utc::now())
        .unwrap();
    truncated.append_questions(vec![first.clone()]);
    truncated
        .record_answer(&first.id, &first.correct_answer)
        .unwrap();
    assert_eq!(score(&truncated).score, 100);
}

#[tokio::test]
async fn test_second_batch_failure_keeps_progress_and_retry_appends() {
    let provider = Arc::new(ScriptedProvider::new().failing_on(2));
    let flow = flow(provider.clone(), 90);

    flow.start(SetId::new(1)).await.unwrap();
    for _ in 0..4 {
        assert!(matches!(flow.next().await.unwrap(), AdvanceOutcome::Moved(_)));
    }
    flow.answer("A").await.unwrap();

    let before = flow.snapshot().await;
    assert_eq!(before.position(), 4);

    let err = flow.next().await.unwrap_err();
    assert!(matches!(err, LoadError::Provider { offset: 5, .. }));

    let after = flow.snapshot().await;
    assert_eq!(after.position(), 4);
    assert_eq!(after.loaded_count(), 5);
    assert_eq!(after.answered_count(), 1);
    assert!(!after.is_loading());

    assert_eq!(flow.next().await.unwrap(), AdvanceOutcome::Moved(5));
    let session = flow.snapshot().await;
    assert_eq!(session.loaded_count(), 10);
    assert_eq!(session.questions()[5].id, "s1-006");
    assert_eq!(
        provider.requests(),
        vec![
            (SetId::new(1), 0, 5),
            (SetId::new(1), 5, 5),
            (SetId::new(1), 5, 5)
        ]
    );
}

#[tokio::test]
async fn test_analysis_failure_uses_fallback() {
    let provider = Arc::new(ScriptedProvider::new().without_analysis());
    let flow = flow(provider, 90);

    flow.start(SetId::new(2)).await.unwrap();
    flow.answer("A").await.unwrap();
    flow.next().await.unwrap();
    flow.answer("B").await.unwrap();

    let result = flow.finish().await.unwrap();
    assert_eq!(result.total_questions, 5);
    assert_eq!(result.correct_count, 1);
    assert_eq!(result.score, 20);
    assert_eq!(result.ai_analysis.as_deref(), Some(ANALYSIS_FALLBACK));
    let total: usize = result.domain_breakdown.values().map(|t| t.total).sum();
    assert_eq!(total, 5);
    assert_eq!(flow.result().await, Some(result));
}

#[tokio::test]
async fn test_full_short_exam() {
    let provider = Arc::new(ScriptedProvider::new());
    let flow = flow(provider.clone(), 7);

    flow.start(SetId::new(3)).await.unwrap();
    loop {
        flow.answer("A").await.unwrap();
        match flow.next().await.unwrap() {
            AdvanceOutcome::Moved(_) => continue,
            AdvanceOutcome::AtEnd => break,
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    let session = flow.snapshot().await;
    assert_eq!(session.position(), 6);
    assert!(session.is_finished());
    assert_eq!(
        provider.requests(),
        vec![(SetId::new(3), 0, 5), (SetId::new(3), 5, 2)]
    );

    let result = flow.finish().await.unwrap();
    assert_eq!(result.score, 100);
    assert_eq!(result.ai_analysis.as_deref(), Some("## 分析\n继续保持"));
    // 7 题按分类轮转：前三个分类各 2 题，最后一个 1 题
    assert_eq!(
        result.domain_breakdown[&Category::BillingPricing],
        CategoryTally { correct: 1, total: 1 }
    );
    assert_eq!(
        result.domain_breakdown[&Category::CloudConcepts],
        CategoryTally { correct: 2, total: 2 }
    );

    // 交卷后不能再作答
    assert!(matches!(
        flow.answer("B").await,
        Err(SessionError::Completed)
    ));
}

#[tokio::test]
async fn test_duplicate_answer_is_ignored() {
    let flow = flow(Arc::new(ScriptedProvider::new()), 90);
    flow.start(SetId::new(1)).await.unwrap();

    assert_eq!(flow.answer("B").await.unwrap(), AnswerOutcome::Recorded);
    assert_eq!(
        flow.answer("A").await.unwrap(),
        AnswerOutcome::AlreadyAnswered
    );
    let session = flow.snapshot().await;
    assert_eq!(session.answer_for("s1-001"), Some("B"));
}

#[tokio::test]
async fn test_start_rules_and_reset() {
    let flow = flow(Arc::new(ScriptedProvider::new()), 90);

    let err = flow.start(SetId::new(9)).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Session(SessionError::InvalidSet { max: 5, .. })
    ));

    flow.start(SetId::new(1)).await.unwrap();
    let err = flow.start(SetId::new(2)).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Session(SessionError::AlreadyActive { .. })
    ));

    flow.answer("A").await.unwrap();
    flow.finish().await.unwrap();
    flow.reset().await;
    assert!(flow.result().await.is_none());
    assert!(!flow.snapshot().await.is_active());

    flow.start(SetId::new(2)).await.unwrap();
    let session = flow.snapshot().await;
    assert_eq!(session.set_id(), Some(SetId::new(2)));
    assert_eq!(session.answered_count(), 0);
    assert_eq!(
        session.started_at(),
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn test_initial_load_failure_can_be_retried() {
    let provider = Arc::new(ScriptedProvider::new().failing_on(1));
    let flow = flow(provider, 90);

    let err = flow.start(SetId::new(1)).await.unwrap_err();
    assert!(matches!(err, AppError::Load(LoadError::Provider { .. })));

    let session = flow.snapshot().await;
    assert!(session.is_active());
    assert_eq!(session.loaded_count(), 0);

    let outcome = flow.load_current().await.unwrap();
    assert_eq!(outcome, LoadOutcome::Appended { offset: 0, count: 5 });
}

#[tokio::test]
async fn test_empty_batch_is_reported_not_swallowed() {
    let provider = Arc::new(ScriptedProvider::new().exhausted_at(5));
    let flow = flow(provider.clone(), 90);

    flow.start(SetId::new(1)).await.unwrap();
    for _ in 0..4 {
        flow.next().await.unwrap();
    }

    for _ in 0..2 {
        let err = flow.next().await.unwrap_err();
        assert!(matches!(err, LoadError::EmptyBatch { offset: 5 }));
    }

    let session = flow.snapshot().await;
    assert_eq!(session.position(), 4);
    assert_eq!(session.loaded_count(), 5);
    assert!(!session.is_loading());
    assert_eq!(provider.requests().len(), 3);
}
