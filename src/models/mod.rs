pub mod evaluation;
pub mod loaders;
pub mod question;
pub mod taxonomy;

pub use evaluation::{BatchResult, Evaluation, EvaluatorKind, Grade};
pub use loaders::{load_question_entries, load_taxonomy};
pub use question::{Author, QuestionEntry, QuestionMetadata, QuizQuestion, QuizQuestionBatch};
pub use taxonomy::{MajorCategory, Taxonomy};
