pub mod language_model;

pub use language_model::{
    GenerationRequest, LanguageModel, LlmResult, OpenAiModel, OutputSchema, TextStream,
};
