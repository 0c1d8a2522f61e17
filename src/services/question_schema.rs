//! 题目结构约束
//!
//! 两部分：
//! - `json_schema`：发给模型的 JSON Schema（结构与枚举约束）
//! - `QuestionSchema::validate`：本地校验，返回违规列表而不是报错

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::infrastructure::OutputSchema;
use crate::models::question::QuizQuestion;
use crate::models::taxonomy::Taxonomy;

/// 题干最少字符数
pub const MIN_QUESTION_LENGTH: usize = 200;

static CREATED_AT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{3})?Z$").expect("合法的正则")
});
static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("合法的正则")
});
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("合法的正则"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(_[a-z0-9]+)*$").expect("合法的正则"));
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("合法的正则"));

/// 单条违规
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    pub field: &'static str,
    pub message: String,
}

impl SchemaViolation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// 题目结构校验器
#[derive(Debug, Clone)]
pub struct QuestionSchema {
    taxonomy: Arc<Taxonomy>,
}

impl QuestionSchema {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    /// 校验一道题，返回空列表表示通过
    pub fn validate(&self, q: &QuizQuestion) -> Vec<SchemaViolation> {
        let mut violations = Vec::new();

        if q.id.trim().is_empty() {
            violations.push(SchemaViolation::new("id", "不能为空"));
        }

        let length = q.question.chars().count();
        if length < MIN_QUESTION_LENGTH {
            violations.push(SchemaViolation::new(
                "question",
                format!("长度 {} 少于 {} 个字符", length, MIN_QUESTION_LENGTH),
            ));
        }

        let answer = q.answer.trim();
        if answer.is_empty() {
            violations.push(SchemaViolation::new("answer", "不能为空"));
        } else if q.question.to_lowercase().contains(&answer.to_lowercase()) {
            violations.push(SchemaViolation::new(
                "question",
                format!("题干中直接出现了答案 \"{}\"", answer),
            ));
        }

        // 大类与子类一起校验
        match self.taxonomy.subcategories(&q.category) {
            None => violations.push(SchemaViolation::new(
                "category",
                format!("\"{}\" 不在分类体系中", q.category),
            )),
            Some(subs) if !subs.iter().any(|s| *s == q.subcategory) => {
                violations.push(SchemaViolation::new(
                    "subcategory",
                    format!("\"{}\" 不属于大类 \"{}\"", q.subcategory, q.category),
                ))
            }
            Some(_) => {}
        }

        if !(1..=5).contains(&q.difficulty) {
            violations.push(SchemaViolation::new(
                "difficulty",
                format!("{} 不在 [1, 5] 范围内", q.difficulty),
            ));
        }

        for (idx, tag) in q.tags.iter().enumerate() {
            if !TAG_RE.is_match(tag) {
                violations.push(SchemaViolation::new(
                    "tags",
                    format!("标签 \"{}\" 必须为小写并以下划线连接", tag),
                ));
            }
            if q.tags[..idx].contains(tag) {
                violations.push(SchemaViolation::new("tags", format!("标签 \"{}\" 重复", tag)));
            }
        }

        if q.author.name.trim().is_empty() {
            violations.push(SchemaViolation::new("author.name", "不能为空"));
        }
        if !URL_RE.is_match(&q.image) {
            violations.push(SchemaViolation::new("image", format!("\"{}\" 不是合法的 URL", q.image)));
        }
        if !CREATED_AT_RE.is_match(&q.created_at) {
            violations.push(SchemaViolation::new(
                "createdAt",
                format!("\"{}\" 不是合法的 ISO 8601 时间", q.created_at),
            ));
        }
        if !UUID_RE.is_match(&q.created_by) {
            violations.push(SchemaViolation::new(
                "createdBy",
                format!("\"{}\" 不是合法的 UUID", q.created_by),
            ));
        }
        if !EMAIL_RE.is_match(&q.created_by_email) {
            violations.push(SchemaViolation::new(
                "createdByEmail",
                format!("\"{}\" 不是合法的邮箱地址", q.created_by_email),
            ));
        }

        violations
    }

    /// 结构化出题使用的输出约束 `{questions: [QuizQuestion]}`
    pub fn output_schema(&self) -> OutputSchema {
        OutputSchema::new("quiz_questions", json_schema(&self.taxonomy))
            .with_description("A batch of trivia quiz questions")
    }
}

/// 题目数组的 JSON Schema
///
/// strict 模式要求所有字段必填且不允许额外字段
pub fn json_schema(taxonomy: &Taxonomy) -> JsonValue {
    let categories: Vec<&str> = taxonomy.majors().collect();
    let subcategories = taxonomy.all_subcategories();

    let question = json!({
        "type": "object",
        "properties": {
            "id": { "type": "string", "description": "Unique identifier for the question" },
            "question": {
                "type": "string",
                "description": format!(
                    "The quiz question text, at least {} characters long, clear and specific with only one possible answer",
                    MIN_QUESTION_LENGTH
                )
            },
            "answer": { "type": "string", "description": "The correct answer to the question" },
            "category": {
                "type": "string",
                "enum": categories,
                "description": format!("Major category - must be one of: {}", categories.join(", "))
            },
            "subcategory": {
                "type": "string",
                "enum": subcategories,
                "description": "Subcategory that belongs to the chosen major category"
            },
            "difficulty": {
                "type": "integer",
                "minimum": 1,
                "maximum": 5,
                "description": "Difficulty level from 1 (easiest) to 5 (hardest)"
            },
            "tags": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Lowercase tags, multi-word tags use underscores, must not give away the answer"
            },
            "author": {
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"],
                "additionalProperties": false
            },
            "image": { "type": "string", "description": "URL to a relevant image for the question" },
            "imageAlt": { "type": "string", "description": "Alt text description for the image" },
            "additionalInfo": {
                "type": "string",
                "description": "Markdown-formatted text with fun facts, context, and learning resources about the answer"
            },
            "isPublic": { "type": "boolean" },
            "createdAt": { "type": "string", "description": "ISO 8601 datetime" },
            "createdBy": { "type": "string", "description": "UUID of the creator" },
            "createdByEmail": { "type": "string", "description": "Email address of the creator" }
        },
        "required": [
            "id", "question", "answer", "category", "subcategory", "difficulty", "tags",
            "author", "image", "imageAlt", "additionalInfo", "isPublic", "createdAt",
            "createdBy", "createdByEmail"
        ],
        "additionalProperties": false
    });

    json!({
        "type": "object",
        "properties": {
            "questions": { "type": "array", "items": question }
        },
        "required": ["questions"],
        "additionalProperties": false
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::question::Author;

    pub(crate) fn valid_question() -> QuizQuestion {
        QuizQuestion {
            id: "3f1c2a8e-5b7d-4c1e-9a2b-0d4e6f8a1b3c".to_string(),
            question: "Worshipped at a circular temple in the Forum where a sacred flame was never \
                       allowed to die, this virgin goddess of the hearth was served by six priestesses \
                       sworn to thirty years of chastity. Which deity, counterpart of the Greek Hestia, \
                       was she?"
                .to_string(),
            answer: "Vesta".to_string(),
            category: "Culture".to_string(),
            subcategory: "Mythology".to_string(),
            difficulty: 3,
            tags: vec!["roman_religion".to_string(), "hearth".to_string()],
            author: Author {
                name: "Trivia Question Architect".to_string(),
            },
            image: "https://example.com/temple.jpg".to_string(),
            image_alt: "Ruins of a round temple".to_string(),
            additional_info: "The flame was renewed every **1 March**.".to_string(),
            is_public: true,
            created_at: "2025-03-01T10:00:00.000Z".to_string(),
            created_by: "00000000-0000-4000-8000-000000000000".to_string(),
            created_by_email: "quiz-bot@example.com".to_string(),
        }
    }

    fn schema() -> QuestionSchema {
        QuestionSchema::new(Arc::new(Taxonomy::builtin()))
    }

    fn fields(violations: &[SchemaViolation]) -> Vec<&'static str> {
        violations.iter().map(|v| v.field).collect()
    }

    #[test]
    fn test_valid_question_passes() {
        let violations = schema().validate(&valid_question());
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_short_question_is_rejected() {
        let mut q = valid_question();
        q.question = "Which goddess of the hearth had six priestesses?".to_string();
        assert_eq!(fields(&schema().validate(&q)), vec!["question"]);
    }

    #[test]
    fn test_answer_in_question_is_rejected() {
        let mut q = valid_question();
        q.question = format!("{} Named VESTA, who was she?", q.question);
        let violations = schema().validate(&q);
        assert!(violations.iter().any(|v| v.message.contains("答案")));
    }

    #[test]
    fn test_subcategory_checked_against_its_category() {
        let mut q = valid_question();
        q.category = "Sciences".to_string();
        assert_eq!(fields(&schema().validate(&q)), vec!["subcategory"]);
    }

    #[test]
    fn test_unknown_category() {
        let mut q = valid_question();
        q.category = "Religion".to_string();
        assert_eq!(fields(&schema().validate(&q)), vec!["category"]);
    }

    #[test]
    fn test_metadata_formats() {
        let mut q = valid_question();
        q.created_at = "2025-03-01 10:00:00".to_string();
        q.created_by = "not-a-uuid".to_string();
        q.created_by_email = "nobody".to_string();
        q.difficulty = 6;

        assert_eq!(
            fields(&schema().validate(&q)),
            vec!["difficulty", "createdAt", "createdBy", "createdByEmail"]
        );
    }

    #[test]
    fn test_tags_must_be_lowercase_and_unique() {
        let mut q = valid_question();
        q.tags = vec!["Roman Religion".to_string(), "hearth".to_string(), "hearth".to_string()];
        assert_eq!(fields(&schema().validate(&q)), vec!["tags", "tags"]);
    }

    #[test]
    fn test_json_schema_lists_taxonomy_enums() {
        let value = json_schema(&Taxonomy::builtin());
        let item = &value["properties"]["questions"]["items"];

        let categories = item["properties"]["category"]["enum"].as_array().unwrap();
        assert_eq!(categories.len(), 8);
        assert!(item["properties"]["subcategory"]["enum"]
            .as_array()
            .unwrap()
            .contains(&json!("Fauna")));
        assert_eq!(item["required"].as_array().unwrap().len(), 15);
        assert_eq!(item["properties"]["difficulty"]["minimum"], 1);
        assert_eq!(item["properties"]["difficulty"]["maximum"], 5);
    }
}
