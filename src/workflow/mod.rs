pub mod batch_evaluator;
pub mod quiz_flow;

pub use batch_evaluator::BatchEvaluator;
pub use quiz_flow::{QuizFlow, SessionReport};
