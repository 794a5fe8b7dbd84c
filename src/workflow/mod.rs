pub mod batch_loader;
pub mod exam_flow;
pub mod scorer;
pub mod session_state;

pub use batch_loader::{BatchLoader, LoadOutcome, DEFAULT_BATCH_SIZE};
pub use exam_flow::ExamFlow;
pub use scorer::{request_analysis, score, ANALYSIS_FALLBACK};
pub use session_state::{AdvanceOutcome, AnswerOutcome, ExamSession};
