//! 题目质量评分
//!
//! 规则：事实准确、不泄露答案、语境相关、答案明确、不过于冷门、不编造关联

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::infrastructure::LanguageModel;
use crate::models::evaluation::{Evaluation, EvaluatorKind};
use crate::services::evaluator::{grade_with_model, EvaluationItem, Evaluator};

pub const QUESTION_QUALITY_PROMPT: &str = r#"
You are an expert quiz question evaluator. Your job is to assess the quality and accuracy of trivia questions.

Evaluate each question based on these critical rules:

1. **Factual Accuracy**: Each question must be factually accurate and verifiable - never create fictional facts or misleading information

2. **No Answer in Question**: The SPECIFIC answer must NOT be revealed in the question itself. However, providing context about:
   - Etymology of terms (e.g., explaining "triumvirate" when asking for "First Triumvirate")
   - General categories (e.g., explaining "amphitheater" when asking for "Colosseum")
   - Related concepts or word roots
   ...is ACCEPTABLE as long as the specific answer (the proper name, specific term, or unique identifier being asked for) is not given away.

   Examples of ACCEPTABLE:
   - "From the Latin for 'of three men', the term denotes a regime of three leaders. Which specific alliance of 60 BCE involved Caesar, Pompey, and Crassus?" Answer: First Triumvirate
   - "From the Greek word meaning 'rule by the people', what system of government originated in ancient Athens?" Answer: Democracy

   Examples of VIOLATION:
   - "From the Latin 'salarium' meaning salt money, what word means a fixed payment?" Answer: Salary (too similar to the Latin term)
   - "Named Vesta, which Roman goddess..." Answer: Vesta (exact match - the answer is literally stated in the question)

3. **Context Relevance**: Any contextual lead-ins (historical, etymological, pop-culture) must be accurate and genuinely relevant to the answer

4. **Clear Answer**: Each question should have one clear, unambiguous correct answer

5. **Avoid Obscurity**: Questions should not be impossibly obscure - aim for facts that are learnable and verifiable through reputable sources

6. **No False Connections**: Do not make fake connections (e.g., claiming something shares a name with a dessert when it doesn't)

Reply with a score of A, B, C, or D:

A: Excellent - Factually accurate, specific answer not revealed (though general context is fine), relevant context, clear answer
B: Good - Minor issues with context relevance or slight ambiguity, but factually accurate
C: Poor - Contains factual errors, false connections, or reveals the SPECIFIC answer in the question
D: Failed - Multiple serious issues: factual errors AND answer revealed AND/or false information

Provide specific feedback about what's wrong or what's done well.
"#;

/// 题目质量评分器
pub struct QualityEvaluator {
    model: Arc<dyn LanguageModel>,
}

impl QualityEvaluator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    fn build_prompt(question: &str, answer: &str) -> String {
        format!(
            "<question>\n{}\n</question>\n\n<answer>\n{}\n</answer>\n\nEvaluate this question based on the rules above.",
            question.trim(),
            answer.trim()
        )
    }
}

#[async_trait]
impl Evaluator for QualityEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Quality
    }

    async fn evaluate(&self, item: &EvaluationItem) -> AppResult<Evaluation> {
        grade_with_model(
            self.model.as_ref(),
            self.kind(),
            QUESTION_QUALITY_PROMPT,
            Self::build_prompt(&item.question, &item.reference),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_wraps_question_and_answer() {
        let prompt = QualityEvaluator::build_prompt("  Which road?  ", "Via Appia");
        assert!(prompt.starts_with("<question>\nWhich road?\n</question>"));
        assert!(prompt.contains("<answer>\nVia Appia\n</answer>"));
    }

    #[test]
    fn test_rubric_lists_leakage_examples() {
        assert!(QUESTION_QUALITY_PROMPT.contains("Named Vesta"));
        assert!(QUESTION_QUALITY_PROMPT.contains("No False Connections"));
    }

    /// 测试真实模型对泄题题目的评分
    #[tokio::test]
    #[ignore]
    async fn test_vesta_question_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = crate::config::Config::from_env();
        let model = crate::infrastructure::OpenAiModel::with_model(&config, config.evaluator_model_name.clone());
        let evaluator = QualityEvaluator::new(Arc::new(model));

        let item = EvaluationItem::with_answer(
            "Named Vesta, which Roman goddess of the hearth was tended by six priestesses?",
            "Vesta",
        );
        let evaluation = evaluator.evaluate(&item).await.unwrap();

        println!("评分: {} 反馈: {}", evaluation.score, evaluation.feedback);
        assert_ne!(evaluation.score, crate::models::Grade::A);
    }
}
