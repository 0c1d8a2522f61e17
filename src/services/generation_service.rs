//! 出题服务 - 业务能力层
//!
//! 两种模式：
//! - 自由文本：原样返回模型输出（或流式片段），解析交给调用方
//! - 结构化：按 JSON Schema 生成，覆盖元数据后逐题做结构校验
//!
//! 不做重试，能力层错误一律包装为 `AppError::Generation` 抛出

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use futures::stream::{BoxStream, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult, LlmError};
use crate::infrastructure::{GenerationRequest, LanguageModel};
use crate::models::question::{QuestionMetadata, QuizQuestion, QuizQuestionBatch};
use crate::models::taxonomy::Taxonomy;
use crate::services::prompt_builder::{PromptBuilder, PromptOptions};
use crate::services::question_schema::{QuestionSchema, SchemaViolation};

/// 出题文本片段流
pub type FragmentStream = BoxStream<'static, AppResult<String>>;

/// 未通过结构校验的题目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedQuestion {
    pub question: QuizQuestion,
    pub violations: Vec<SchemaViolation>,
}

/// 结构化出题结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOutcome {
    /// 通过结构校验的题目（大类/子类一定在分类体系内）
    pub accepted: Vec<QuizQuestion>,
    pub rejected: Vec<RejectedQuestion>,
}

impl GenerationOutcome {
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

/// 出题服务
pub struct GenerationService {
    model: Arc<dyn LanguageModel>,
    taxonomy: Arc<Taxonomy>,
    prompt_builder: PromptBuilder,
    schema: QuestionSchema,
    default_author: String,
}

impl GenerationService {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        taxonomy: Arc<Taxonomy>,
        default_author: impl Into<String>,
    ) -> Self {
        Self {
            model,
            prompt_builder: PromptBuilder::new(taxonomy.clone()),
            schema: QuestionSchema::new(taxonomy.clone()),
            taxonomy,
            default_author: default_author.into(),
        }
    }

    /// 自由文本出题，原样返回
    pub async fn generate_text(&self, opts: &PromptOptions) -> AppResult<String> {
        let prompt = self.prompt_builder.build_question_prompt(opts)?;
        info!(
            "📝 正在生成 {} 道题目 (模型: {})...",
            opts.number_of_questions,
            self.model.model_name()
        );

        self.model
            .generate_text(&GenerationRequest::new(prompt))
            .await
            .map_err(AppError::Generation)
    }

    /// 自由文本出题（流式）
    ///
    /// 调用方需要把流读完
    pub async fn stream_questions(&self, opts: &PromptOptions) -> AppResult<FragmentStream> {
        let prompt = self.prompt_builder.build_question_prompt(opts)?;
        info!(
            "📝 正在流式生成 {} 道题目 (模型: {})...",
            opts.number_of_questions,
            self.model.model_name()
        );

        let fragments = self
            .model
            .stream_text(&GenerationRequest::new(prompt))
            .await
            .map_err(AppError::Generation)?;

        Ok(fragments
            .map(|fragment| fragment.map_err(AppError::Generation))
            .boxed())
    }

    /// 结构化出题
    ///
    /// 元数据（id、createdAt、createdBy、createdByEmail、author.name）一律覆盖
    pub async fn generate_structured(
        &self,
        opts: &PromptOptions,
        metadata: &QuestionMetadata,
    ) -> AppResult<GenerationOutcome> {
        let prompt = self.prompt_builder.build_structured_prompt(opts)?;
        let model_name = self.model.model_name().to_string();
        info!(
            "📝 正在结构化生成 {} 道题目 (模型: {})...",
            opts.number_of_questions, model_name
        );

        let value = self
            .model
            .generate_object(&GenerationRequest::new(prompt), &self.schema.output_schema())
            .await
            .map_err(AppError::Generation)?;

        let batch: QuizQuestionBatch = serde_json::from_value(value).map_err(|e| {
            AppError::Generation(LlmError::invalid_payload(&model_name, e.to_string()))
        })?;

        debug!("模型返回 {} 道题目", batch.questions.len());

        self.check_enum_constraints(&model_name, &batch.questions)?;

        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let author_name = metadata
            .author_name
            .clone()
            .unwrap_or_else(|| self.default_author.clone());

        let mut outcome = GenerationOutcome::default();
        for mut question in batch.questions {
            question.id = Uuid::new_v4().to_string();
            question.created_at = created_at.clone();
            question.created_by = metadata.created_by.clone();
            question.created_by_email = metadata.created_by_email.clone();
            question.author.name = author_name.clone();

            let violations = self.schema.validate(&question);
            if violations.is_empty() {
                outcome.accepted.push(question);
            } else {
                warn!(
                    "⚠️ 题目未通过结构校验 ({}): {}",
                    question.id,
                    violations
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; ")
                );
                outcome.rejected.push(RejectedQuestion {
                    question,
                    violations,
                });
            }
        }

        info!(
            "✓ 结构化出题完成: 通过 {}/{}",
            outcome.accepted.len(),
            outcome.total()
        );

        Ok(outcome)
    }

    /// 模型承诺的枚举约束：大类、子类各自都在分类体系内
    fn check_enum_constraints(&self, model_name: &str, questions: &[QuizQuestion]) -> AppResult<()> {
        let subcategories = self.taxonomy.all_subcategories();

        for question in questions {
            if !self.taxonomy.contains_major(&question.category) {
                return Err(AppError::Generation(LlmError::invalid_payload(
                    model_name,
                    format!("category \"{}\" 不在枚举范围内", question.category),
                )));
            }
            if !subcategories.contains(&question.subcategory.as_str()) {
                return Err(AppError::Generation(LlmError::invalid_payload(
                    model_name,
                    format!("subcategory \"{}\" 不在枚举范围内", question.subcategory),
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{LlmResult, OutputSchema};
    use crate::services::question_schema::tests::valid_question;
    use async_trait::async_trait;
    use serde_json::{json, Value as JsonValue};

    /// 固定返回内容的模型
    struct FixedModel {
        text: String,
        object: JsonValue,
    }

    #[async_trait]
    impl LanguageModel for FixedModel {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn generate_text(&self, _request: &GenerationRequest) -> LlmResult<String> {
            Ok(self.text.clone())
        }

        async fn generate_object(
            &self,
            _request: &GenerationRequest,
            _schema: &OutputSchema,
        ) -> LlmResult<JsonValue> {
            Ok(self.object.clone())
        }
    }

    fn service(object: JsonValue) -> GenerationService {
        let model = FixedModel {
            text: "1. [Culture - Mythology]\nQ\n[Answer] A".to_string(),
            object,
        };
        GenerationService::new(Arc::new(model), Arc::new(Taxonomy::builtin()), "Default Author")
    }

    fn metadata() -> QuestionMetadata {
        QuestionMetadata {
            created_by: "a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d".to_string(),
            created_by_email: "editor@quiz.example".to_string(),
            author_name: None,
        }
    }

    fn model_output(question: &QuizQuestion) -> JsonValue {
        let mut value = serde_json::to_value(question).unwrap();
        value["id"] = json!("1");
        value["createdAt"] = json!("yesterday");
        value["createdBy"] = json!("model");
        value["createdByEmail"] = json!("model");
        value["author"] = json!({ "name": "The Model" });
        value
    }

    #[tokio::test]
    async fn test_generate_text_returns_raw_output() {
        let text = service(json!({}))
            .generate_text(&PromptOptions::new(1))
            .await
            .unwrap();
        assert!(text.starts_with("1. [Culture - Mythology]"));
    }

    #[tokio::test]
    async fn test_stream_default_yields_full_text() {
        let mut fragments = service(json!({}))
            .stream_questions(&PromptOptions::new(1))
            .await
            .unwrap();

        let mut full = String::new();
        while let Some(fragment) = fragments.next().await {
            full.push_str(&fragment.unwrap());
        }
        assert!(full.contains("[Answer] A"));
    }

    #[tokio::test]
    async fn test_structured_overwrites_metadata() {
        let payload = json!({ "questions": [model_output(&valid_question())] });
        let outcome = service(payload)
            .generate_structured(&PromptOptions::new(1), &metadata())
            .await
            .unwrap();

        assert_eq!(outcome.accepted.len(), 1);
        let question = &outcome.accepted[0];
        assert_ne!(question.id, "1");
        assert!(Uuid::parse_str(&question.id).is_ok());
        assert_eq!(question.created_by, "a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d");
        assert_eq!(question.created_by_email, "editor@quiz.example");
        assert_eq!(question.author.name, "Default Author");
        assert!(question.created_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_structured_uses_supplied_author() {
        let payload = json!({ "questions": [model_output(&valid_question())] });
        let mut meta = metadata();
        meta.author_name = Some("Jane Quizmaster".to_string());

        let outcome = service(payload)
            .generate_structured(&PromptOptions::new(1), &meta)
            .await
            .unwrap();

        assert_eq!(outcome.accepted[0].author.name, "Jane Quizmaster");
    }

    #[tokio::test]
    async fn test_cross_field_mismatch_is_rejected_not_failed() {
        let mut wrong = valid_question();
        wrong.category = "Sciences".to_string();
        let payload = json!({
            "questions": [model_output(&valid_question()), model_output(&wrong)]
        });

        let outcome = service(payload)
            .generate_structured(&PromptOptions::new(2), &metadata())
            .await
            .unwrap();

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].violations[0].field, "subcategory");
    }

    #[tokio::test]
    async fn test_out_of_range_difficulty_rejects_only_that_question() {
        let mut negative = model_output(&valid_question());
        negative["difficulty"] = json!(-1);
        let mut huge = model_output(&valid_question());
        huge["difficulty"] = json!(300);
        let payload = json!({
            "questions": [model_output(&valid_question()), negative, huge]
        });

        let outcome = service(payload)
            .generate_structured(&PromptOptions::new(3), &metadata())
            .await
            .unwrap();

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 2);
        for rejected in &outcome.rejected {
            assert_eq!(rejected.violations[0].field, "difficulty");
        }
        assert_eq!(outcome.rejected[0].question.difficulty, -1);
    }

    #[tokio::test]
    async fn test_out_of_enum_category_is_generation_failure() {
        let mut wrong = valid_question();
        wrong.category = "Astrology".to_string();
        let payload = json!({ "questions": [model_output(&wrong)] });

        let result = service(payload)
            .generate_structured(&PromptOptions::new(1), &metadata())
            .await;

        assert!(matches!(
            result,
            Err(AppError::Generation(LlmError::InvalidPayload { .. }))
        ));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_generation_failure() {
        let result = service(json!({ "items": [] }))
            .generate_structured(&PromptOptions::new(1), &metadata())
            .await;

        assert!(matches!(result, Err(AppError::Generation(_))));
    }

    #[tokio::test]
    async fn test_zero_questions_never_reaches_model() {
        let result = service(json!({})).generate_text(&PromptOptions::new(0)).await;
        assert!(matches!(result, Err(AppError::PromptBuild { .. })));
    }
}
