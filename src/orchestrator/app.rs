//! 终端考试程序 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：选择内容提供方（LLM 或离线题库），创建 `ExamFlow`
//! 2. **交互循环**：逐题显示、读取作答、显示解析、前进
//! 3. **交卷统计**：输出成绩和 AI 分析
//!
//! 只做输入输出，不做任何判分或加载逻辑。

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, warn};

use crate::config::Config;
use crate::error::{AppError, ConfigError};
use crate::models::{ExamResult, Language, Question, SetId};
use crate::services::{ContentProvider, LlmContentProvider, TomlQuestionBank};
use crate::utils::logging::{log_startup, print_final_result};
use crate::workflow::{AdvanceOutcome, AnswerOutcome, ExamFlow};

/// 一行输入对应的指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 选择选项
    Answer(String),
    /// 下一题（可跳过未作答的题）
    Next,
    /// 切换显示语言
    ToggleLanguage,
    /// 交卷
    Finish,
    /// 空行
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" => Command::Empty,
            "n" | "next" => Command::Next,
            "l" | "lang" => Command::ToggleLanguage,
            "q" | "quit" | "finish" => Command::Finish,
            _ => Command::Answer(line.to_ascii_uppercase()),
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    flow: ExamFlow<dyn ContentProvider>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let provider: Arc<dyn ContentProvider> = match &config.question_bank_dir {
            Some(dir) => {
                let bank = TomlQuestionBank::load(dir).await.map_err(|e| {
                    AppError::from(ConfigError::QuestionBankUnavailable {
                        path: dir.clone(),
                        reason: format!("{:#}", e),
                    })
                })?;
                Arc::new(bank)
            }
            None => Arc::new(LlmContentProvider::new(&config)),
        };

        log_startup(provider.name(), config.questions_per_set, config.batch_size);

        let flow = ExamFlow::new(provider, &config);
        Ok(Self { config, flow })
    }

    pub fn flow(&self) -> &ExamFlow<dyn ContentProvider> {
        &self.flow
    }

    /// 运行一场考试
    pub async fn run(&self, set_id: SetId) -> Result<ExamResult> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut language = self.config.display_language;

        // 第一批加载失败时允许重试
        if let Err(e) = self.flow.start(set_id).await {
            error!("❌ 开始考试失败: {}", e);
            if !self.flow.snapshot().await.is_active() {
                return Err(e.into());
            }
            self.retry_until_loaded(&mut lines).await?;
        }

        loop {
            let session = self.flow.snapshot().await;
            let Some(question) = session.current_question() else {
                warn!("当前题目不可用，交卷");
                break;
            };

            println!(
                "\n{}",
                render_question(question, session.position(), session.total_target(), language)
            );
            if let Some(previous) = session.answer_for(&question.id) {
                println!("(已作答: {})", previous);
            }
            println!("输入选项作答 | n 下一题 | l 切换语言 | q 交卷");

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match Command::parse(&line) {
                Command::Empty => {}
                Command::ToggleLanguage => language = language.toggle(),
                Command::Finish => break,
                Command::Answer(key) => match self.flow.answer(&key).await {
                    Ok(AnswerOutcome::Recorded) => {
                        println!("{}", render_feedback(question, &key, language));
                        if !self.move_next().await {
                            break;
                        }
                    }
                    Ok(AnswerOutcome::AlreadyAnswered) => println!("该题已作答，答案不可修改"),
                    Ok(AnswerOutcome::Busy) => println!("正在加载题目，请稍候"),
                    Err(e) => println!("⚠️ {}", e),
                },
                Command::Next => {
                    if !self.move_next().await {
                        break;
                    }
                }
            }
        }

        let result = self.flow.finish().await?;
        print_final_result(&result, language);
        if let Some(analysis) = &result.ai_analysis {
            println!("\n{}", analysis);
        }

        Ok(result)
    }

    /// 前进一题，返回 false 表示已到最后一题
    async fn move_next(&self) -> bool {
        match self.flow.next().await {
            Ok(AdvanceOutcome::Moved(_)) => true,
            Ok(AdvanceOutcome::AtEnd) => false,
            Ok(AdvanceOutcome::NeedsLoad) => {
                println!("⚠️ 下一题尚未加载，输入 n 重试");
                true
            }
            Ok(AdvanceOutcome::Busy) => {
                println!("正在加载题目，请稍候");
                true
            }
            Err(e) => {
                // 停留在当前题，下一次 n 会重试
                println!("⚠️ 加载下一批题目失败: {}，输入 n 重试", e);
                true
            }
        }
    }

    async fn retry_until_loaded(&self, lines: &mut Lines<BufReader<Stdin>>) -> Result<()> {
        loop {
            println!("加载失败，回车重试，q 退出");
            let Some(line) = lines.next_line().await? else {
                anyhow::bail!("输入已结束");
            };
            if Command::parse(&line) == Command::Finish {
                anyhow::bail!("用户取消");
            }
            match self.flow.load_current().await {
                Ok(_) => return Ok(()),
                Err(e) => error!("❌ 重试失败: {}", e),
            }
        }
    }
}

/// 渲染题目
pub fn render_question(
    question: &Question,
    index: usize,
    total: usize,
    language: Language,
) -> String {
    let mut out = format!(
        "[{}/{}] {}\n{}",
        index + 1,
        total,
        question.category.name(language),
        question.prompt.get(language)
    );
    for option in &question.options {
        out.push_str(&format!("\n  {}. {}", option.key, option.text.get(language)));
    }
    out
}

/// 渲染作答反馈
pub fn render_feedback(question: &Question, key: &str, language: Language) -> String {
    let verdict = if question.is_correct(key) {
        "✅ 回答正确".to_string()
    } else {
        format!("❌ 回答错误，正确答案: {}", question.correct_answer)
    };
    format!("{}\n{}", verdict, question.explanation.get(language))
}
