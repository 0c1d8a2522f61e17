//! 分类评分
//!
//! 系统提示词内嵌完整分类体系，由模型判断分类标签是否合法且与题目内容匹配

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::infrastructure::LanguageModel;
use crate::models::evaluation::{Evaluation, EvaluatorKind};
use crate::models::taxonomy::Taxonomy;
use crate::services::evaluator::{grade_with_model, EvaluationItem, Evaluator};

/// 分类评分器
pub struct CategoryEvaluator {
    model: Arc<dyn LanguageModel>,
    system_prompt: String,
}

impl CategoryEvaluator {
    pub fn new(model: Arc<dyn LanguageModel>, taxonomy: &Taxonomy) -> Self {
        Self {
            model,
            system_prompt: build_system_prompt(taxonomy),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn build_prompt(question: &str, category_tag: &str) -> String {
        format!(
            "<question>\n{}\n</question>\n\n<category-tag>\n{}\n</category-tag>\n\nEvaluate if this category tag is valid and appropriate for this question.",
            question.trim(),
            category_tag.trim()
        )
    }
}

fn build_system_prompt(taxonomy: &Taxonomy) -> String {
    let majors: Vec<&str> = taxonomy.majors().collect();

    format!(
        r#"
You are an expert quiz question evaluator specializing in category validation.

Your job is to verify that questions are properly categorized according to a strict taxonomy.

Available categories and their subcategories:
{}

Evaluation rules:
1. **Valid Category**: The major category MUST be one of: {}
2. **Valid Subcategory**: The subcategory MUST be from the list under the major category
3. **Appropriate Match**: The question content should actually belong to the assigned category and subcategory
4. **Correct Format**: Category tag should be formatted as [Major Category - Subcategory]

Reply with a score of A, B, C, or D:

A: Perfect - Valid category and subcategory from the taxonomy, and the question content matches the category
B: Good - Valid category and subcategory from the taxonomy, but the question content is a slight mismatch
C: Poor - Category or subcategory is not from the valid taxonomy, OR major mismatch between content and category
D: Failed - Invalid category AND subcategory, OR category format is completely wrong

Provide specific feedback about the categorization.
"#,
        taxonomy.to_pretty_json(),
        majors.join(", ")
    )
}

#[async_trait]
impl Evaluator for CategoryEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Category
    }

    async fn evaluate(&self, item: &EvaluationItem) -> AppResult<Evaluation> {
        grade_with_model(
            self.model.as_ref(),
            self.kind(),
            &self.system_prompt,
            Self::build_prompt(&item.question, &item.reference),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_embeds_taxonomy() {
        let prompt = build_system_prompt(&Taxonomy::builtin());
        assert!(prompt.contains("\"Sport & Games\": ["));
        assert!(prompt.contains("MUST be one of: Culture, Entertainment, History"));
    }

    #[test]
    fn test_prompt_wraps_category_tag() {
        let prompt = CategoryEvaluator::build_prompt("Which road?", "[History - History]");
        assert!(prompt.contains("<category-tag>\n[History - History]\n</category-tag>"));
    }
}
