pub mod category;
pub mod loaders;
pub mod question;
pub mod result;

pub use category::Category;
pub use loaders::{load_all_question_sets, load_question_set};
pub use question::{AnswerOption, BilingualText, Language, Question, QuestionDefect};
pub use result::{CategoryTally, ExamResult, ScoreReport};

use serde::{Deserialize, Serialize};

/// 套号（从 1 开始的小整数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetId(u8);

impl SetId {
    pub fn new(id: u8) -> Self {
        Self(id)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for SetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
