//! 评分器公共部分 - 业务能力层
//!
//! 评分器只处理单个题目，批量与并发交给编排层

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use crate::error::{AppError, AppResult, LlmError};
use crate::infrastructure::{GenerationRequest, LanguageModel, OutputSchema};
use crate::models::evaluation::{Evaluation, EvaluatorKind, Grade};
use crate::models::question::QuestionEntry;

/// 一条待评估的题目
///
/// `reference` 对质量评估是答案，对分类评估是分类标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationItem {
    pub question: String,
    pub reference: String,
}

impl EvaluationItem {
    pub fn with_answer(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            reference: answer.into(),
        }
    }

    pub fn with_category_tag(question: impl Into<String>, category_tag: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            reference: category_tag.into(),
        }
    }

    /// 质量评估条目
    pub fn quality_items(entries: &[QuestionEntry]) -> Vec<Self> {
        entries
            .iter()
            .map(|e| Self::with_answer(&e.question, &e.answer))
            .collect()
    }

    /// 分类评估条目，没有分类标签的题目被跳过
    pub fn category_items(entries: &[QuestionEntry]) -> Vec<Self> {
        entries
            .iter()
            .filter_map(|e| {
                e.category_tag
                    .as_ref()
                    .map(|tag| Self::with_category_tag(&e.question, tag))
            })
            .collect()
    }
}

/// 评分器
#[async_trait]
pub trait Evaluator: Send + Sync {
    fn kind(&self) -> EvaluatorKind;

    /// 评估单题，失败时返回 `AppError::Evaluation`，不重试
    async fn evaluate(&self, item: &EvaluationItem) -> AppResult<Evaluation>;
}

/// 模型回复
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GradeReply {
    score: Grade,
    feedback: String,
    #[serde(default)]
    detected_category: Option<String>,
    #[serde(default)]
    detected_subcategory: Option<String>,
}

/// 评分回复的 JSON Schema
pub(crate) fn grade_schema(kind: EvaluatorKind) -> OutputSchema {
    let mut properties = json!({
        "score": { "type": "string", "enum": ["A", "B", "C", "D"] },
        "feedback": {
            "type": "string",
            "description": "Detailed feedback about the question, including specific issues found."
        }
    });
    let mut required = vec!["score", "feedback"];

    if kind == EvaluatorKind::Category {
        properties["detectedCategory"] = json!({
            "type": ["string", "null"],
            "description": "What major category the question actually belongs to"
        });
        properties["detectedSubcategory"] = json!({
            "type": ["string", "null"],
            "description": "What subcategory the question actually belongs to"
        });
        required.extend(["detectedCategory", "detectedSubcategory"]);
    }

    let name = match kind {
        EvaluatorKind::Quality => "question_quality_grade",
        EvaluatorKind::Category => "category_grade",
    };

    OutputSchema::new(
        name,
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        }),
    )
}

/// 调用模型评分并换算分数
pub(crate) async fn grade_with_model(
    model: &dyn LanguageModel,
    kind: EvaluatorKind,
    system: &str,
    prompt: String,
) -> AppResult<Evaluation> {
    let request = GenerationRequest::new(prompt).with_system(system);

    let value = model
        .generate_object(&request, &grade_schema(kind))
        .await
        .map_err(AppError::Evaluation)?;

    let evaluation = evaluation_from_reply(model.model_name(), kind, value)?;
    debug!(
        "{}评估完成: {} ({:.2})",
        kind.name(),
        evaluation.score,
        evaluation.numeric_score
    );

    Ok(evaluation)
}

fn evaluation_from_reply(model: &str, kind: EvaluatorKind, value: JsonValue) -> AppResult<Evaluation> {
    let reply: GradeReply = serde_json::from_value(value)
        .map_err(|e| AppError::Evaluation(LlmError::invalid_payload(model, e.to_string())))?;

    let mut evaluation = Evaluation::new(kind, reply.score, reply.feedback);
    if kind == EvaluatorKind::Category {
        evaluation.detected_category = reply.detected_category.filter(|s| !s.trim().is_empty());
        evaluation.detected_subcategory = reply.detected_subcategory.filter(|s| !s.trim().is_empty());
    }

    Ok(evaluation)
}
