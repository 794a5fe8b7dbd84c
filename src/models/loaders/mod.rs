pub mod toml_loader;

pub use toml_loader::{load_all_question_sets, load_question_set, QuestionSetFile};
