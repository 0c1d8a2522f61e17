pub mod category_evaluator;
pub mod category_validator;
pub mod evaluator;
pub mod generation_service;
pub mod prompt_builder;
pub mod quality_evaluator;
pub mod question_schema;
pub mod text_parser;

pub use category_evaluator::CategoryEvaluator;
pub use category_validator::{
    format_category_tag, CategoryBatchSummary, CategoryCheck, CategoryValidation, CategoryValidator,
};
pub use evaluator::{EvaluationItem, Evaluator};
pub use generation_service::{FragmentStream, GenerationOutcome, GenerationService, RejectedQuestion};
pub use prompt_builder::{PromptBuilder, PromptOptions};
pub use quality_evaluator::QualityEvaluator;
pub use question_schema::{QuestionSchema, SchemaViolation};
pub use text_parser::{parse_questions, ParseReport};
