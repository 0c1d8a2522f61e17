use serde::{Deserialize, Serialize};

/// 题目作者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
}

/// 一道知识竞赛题
///
/// 字段名与 JSON 约定一致（camelCase）。元数据字段
/// （`id`、`createdAt`、`createdBy`、`createdByEmail`、`author`）
/// 生成后一律由调用方覆盖，不信任模型输出。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub subcategory: String,
    /// 有符号宽整数，越界值留给结构校验逐题拒绝
    pub difficulty: i64,
    pub tags: Vec<String>,
    pub author: Author,
    pub image: String,
    pub image_alt: String,
    pub additional_info: String,
    pub is_public: bool,
    pub created_at: String,
    pub created_by: String,
    pub created_by_email: String,
}

impl QuizQuestion {
    /// `[大类 - 子类]` 形式的分类标签
    pub fn category_tag(&self) -> String {
        crate::services::category_validator::format_category_tag(
            &self.category,
            &self.subcategory,
        )
    }
}

/// 结构化出题的外层结构 `{questions: [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestionBatch {
    pub questions: Vec<QuizQuestion>,
}

/// 调用方提供的规范元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionMetadata {
    pub created_by: String,
    pub created_by_email: String,
    /// 为空时使用配置中的默认作者
    pub author_name: Option<String>,
}

/// 一条问答（自由文本解析结果，或从文件读取的待评估题目）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionEntry {
    pub question: String,
    pub answer: String,
    /// `[大类 - 子类]` 形式的分类标签（可选）
    #[serde(default, alias = "categoryTag", skip_serializing_if = "Option::is_none")]
    pub category_tag: Option<String>,
}

impl QuestionEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            category_tag: None,
        }
    }

    pub fn with_category_tag(mut self, tag: impl Into<String>) -> Self {
        self.category_tag = Some(tag.into());
        self
    }
}

impl From<&QuizQuestion> for QuestionEntry {
    fn from(q: &QuizQuestion) -> Self {
        Self {
            question: q.question.clone(),
            answer: q.answer.clone(),
            category_tag: Some(q.category_tag()),
        }
    }
}

impl std::fmt::Display for QuestionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 截断题干以便显示（最多80个字符）
        let preview = crate::utils::logging::truncate_text(&self.question, 80);
        write!(f, "{} [答案: {}]", preview, self.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_uses_camel_case_json() {
        let json = serde_json::json!({
            "id": "q-1",
            "question": "Q",
            "answer": "A",
            "category": "Culture",
            "subcategory": "Mythology",
            "difficulty": 3,
            "tags": ["greek_myth"],
            "author": { "name": "someone" },
            "image": "https://example.com/a.png",
            "imageAlt": "alt",
            "additionalInfo": "**info**",
            "isPublic": true,
            "createdAt": "2025-01-01T00:00:00Z",
            "createdBy": "00000000-0000-4000-8000-000000000000",
            "createdByEmail": "a@b.co"
        });

        let question: QuizQuestion = serde_json::from_value(json).unwrap();
        assert_eq!(question.image_alt, "alt");
        assert!(question.is_public);
        assert_eq!(question.category_tag(), "[Culture - Mythology]");
    }

    #[test]
    fn test_entry_accepts_camel_case_tag() {
        let entry: QuestionEntry = serde_json::from_value(serde_json::json!({
            "question": "Q",
            "answer": "A",
            "categoryTag": "[World - Flags]"
        }))
        .unwrap();

        assert_eq!(entry.category_tag.as_deref(), Some("[World - Flags]"));
    }
}
