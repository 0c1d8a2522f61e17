//! 出题提示词构建
//!
//! 纯函数：相同输入得到相同提示词，没有副作用

use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::taxonomy::Taxonomy;

/// 示例题：(分类标签内容, 题干, 答案)
pub const EXEMPLAR_QUESTIONS: [(&str, &str, &str); 10] = [
    (
        "Culture - Fine Art",
        "From the Greek meaning 'arrangement of skin', what name is given to the art of preserving an animal's body in a lifelike state by stuffing it?",
        "Taxidermy",
    ),
    (
        "History - History",
        "The 'Hallstein Doctrine' (1955-1969) was a foreign policy principle of West Germany, declaring it an 'unfriendly act' if third countries established diplomatic relations with which other country?",
        "East Germany",
    ),
    (
        "Sport & Games - Sports",
        "Which carbohydrate precedes the names of the boxers Ray Leonard and Ray Robinson and the UFC fighter Rashad Evans?",
        "Sugar",
    ),
    (
        "Entertainment - Television",
        "Which French TV series starring Omar Sy, inspired by the stories of writer Maurice Leblanc, shares its name from a character in the Harry Potter universe?",
        "Lupin",
    ),
    (
        "Culture - Mythology",
        "Which beautiful youth in Greek mythology fell in love with his own reflection, giving his name to a psychological term for excessive self-love?",
        "Narcissus",
    ),
    (
        "Media - Literature",
        "Which word appears in the titles of books by Thomas Mann, Agatha Christie, Leo Tolstoy, and Arthur Miller?",
        "Death",
    ),
    (
        "History - Current Affairs",
        "Which former Prime Minister of New Zealand published her memoir 'A Different Kind of Power' in 2025?",
        "Jacinda Ardern",
    ),
    (
        "Sciences - Fauna",
        "The 'Chupacabra' was first reportedly sighted in 1995. According to its Spanish name, which animals does this 'vampiric' creature particularly target?",
        "Goats",
    ),
    (
        "History - Exploration",
        "Butch Cassidy and the Sundance Kid in 1908 and Che Guevara in 1967 were all shot dead in which South American country?",
        "Bolivia",
    ),
    (
        "Culture - Architecture",
        "Which Italian architect, who shares his surname with a musical instrument, worked with Richard Rodgers on the Pompidou Centre in Paris?",
        "Renzo Piano",
    ),
];

/// 出题参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub topic: Option<String>,
    pub number_of_questions: usize,
}

impl PromptOptions {
    pub fn new(number_of_questions: usize) -> Self {
        Self {
            topic: None,
            number_of_questions,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// 题目数量必须大于 0；主题若提供则不能为空白
    pub fn validate(&self) -> AppResult<()> {
        if self.number_of_questions == 0 {
            return Err(AppError::prompt_build("题目数量必须大于 0"));
        }
        if self.topic.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::prompt_build("主题不能为空白"));
        }
        Ok(())
    }
}

/// 提示词构建器
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    taxonomy: Arc<Taxonomy>,
}

impl PromptBuilder {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    /// 自由文本出题提示词
    pub fn build_question_prompt(&self, opts: &PromptOptions) -> AppResult<String> {
        opts.validate()?;

        let topic = opts.topic.as_deref().map(str::trim);
        let count = opts.number_of_questions;
        let majors: Vec<&str> = self.taxonomy.majors().collect();
        let majors_json = serde_json::to_string(&majors).unwrap_or_default();

        let task_topic = match topic {
            Some(t) => format!(" on the topic: \"{}\"", t),
            None => " across various topics".to_string(),
        };

        let category_distribution = if topic.is_none() {
            format!(
                r#"<category-distribution>
If no specific topic is provided, ensure questions are equally distributed across these categories:
{}

Aim for balanced representation across the major category groups ({}).
</category-distribution>
"#,
                self.taxonomy.to_pretty_json(),
                majors.join(", ")
            )
        } else {
            String::new()
        };

        let user_input = match topic {
            Some(t) => format!("The topic for the questions is: {}", t),
            None => "No specific topic provided - distribute questions across the categories listed above.".to_string(),
        };

        let ask_scope = match topic {
            Some(t) => format!(" on the topic \"{}\"", t),
            None => " distributed across the categories".to_string(),
        };
        let plural = if count == 1 { "" } else { "s" };

        Ok(format!(
            r#"<task-context>
You are acting as an elite Trivia Question Architect. Your goal is to generate original, high-caliber quiz questions{task_topic}. You will adopt a style that blends the intellectual rigor of the "Austrian Open" with the cultural breadth of the "UK Grand Prix" circuit.
</task-context>

<style-guide>
When crafting questions, use these stylistic markers:
1. **The "Multi-Layered" Lead-in**: Don't just ask for a name. Provide 1-2 sentences of fascinating context (historical, etymological, or pop-culture connections) before the actual "ask."
2. **Inter-disciplinary Connections**: Relate the primary topic to something else. (e.g., "Which word appears in the titles of books by Thomas Mann, Agatha Christie, and Leo Tolstoy?")
3. **Etymological Hints**: Provide the linguistic root of a term (e.g., "From the Sanskrit for 'sacred syllable'...") to help the solver deduce the answer.
4. **Contemporary Relevance**: Frame historical topics through a modern lens, such as referencing a recent memoir or a recent viral event.
5. **Avoid Repetition**: If the user asks for 5 or more questions, at most 2 questions may start with an interrogative word such as What, Which or Who.
6. **Keep It Short**: The question length must be at most 350 characters.
</style-guide>

{category_distribution}
<rules>
Here are important rules for crafting quiz questions:
- **Elite Style**: Always maintain the elite, high-caliber style of competitive quiz circuits (Austrian Open, UK Grand Prix, Squizzed, WQC)
- **Factual Accuracy**: Each question must be factually accurate and verifiable - never create fictional facts or misleading information
- **Challenging but Fair**: Questions should be challenging but fair - provide enough context clues that a knowledgeable solver can deduce the answer
- **Proper Categorization**: Category tags MUST be taken directly from the category taxonomy. Select one major category and one subcategory from the available options. Always use the exact format [Major Category - Subcategory]
- **Clear Answer**: Avoid ambiguous phrasing - each question should have one clear, unambiguous correct answer
- **Difficulty Progression**: Vary the difficulty level across questions to maintain engagement, from moderately challenging to expert-level. Sort them from easy to expert level.
- **Current Information**: When referencing current events or recent publications, ensure the information is up-to-date
- **Answer Uniqueness**: Ensure the answer is distinctive enough that partial knowledge or context clues point to only one correct response
- **Avoid Obscurity**: Avoid questions that are impossibly obscure - aim for facts that are learnable and verifiable through reputable sources
- **Interdisciplinary Connections**: When possible, create questions that bridge multiple categories to showcase interdisciplinary knowledge (e.g., Science + History, Art + Geography)
- **No Answer in Question**: The SPECIFIC answer must NOT be revealed in the question itself, neither verbatim nor as a close phonetic or lexical match. However, providing context about etymology of terms, general categories, or related concepts is ACCEPTABLE as long as the specific answer (the proper name, specific term, or unique identifier being asked for) is not given away.

  ACCEPTABLE examples:
  • "From the Latin for 'of three men', the term denotes a regime of three leaders. Which specific alliance of 60 BCE involved Caesar, Pompey, and Crassus?" Answer: First Triumvirate
  • "From the Greek word meaning 'rule by the people', what system of government originated in ancient Athens?" Answer: Democracy

  VIOLATION examples (NEVER do this):
  • "From the Latin 'salarium' meaning salt money, what word means a fixed payment?" Answer: Salary (too phonetically similar to the Latin term)
  • "Named Vesta, which Roman goddess..." Answer: Vesta (exact match - the answer is literally stated)
  • "Romans wearing the 'toga candida' were seeking which political position?" Answer: Candidate (the Latin term is too similar to the English answer)
</rules>

<exemplar-questions>
Use these examples as your gold standard for phrasing, representing different categories from {majors_json}:

{exemplars}
</exemplar-questions>

<user-input>
{user_input}
Number of questions to generate: {count}
</user-input>

<the-ask>
Based on the above specifications, generate {count} quiz question{plural}{ask_scope}.
Ensure each question follows the style guide, adheres to the rules, and matches the quality of the exemplar questions.
</the-ask>

<thinking-instructions>
Before writing the questions, think about:
1. Identify a "hidden" or complex fact about the topic.
2. Brainstorm a connection to another field (e.g., how a scientific discovery influenced a famous painting).
3. Draft a lead-in that provides enough context to make the answer deducible even if the specific fact is unknown.
</thinking-instructions>

<output-formatting>
Please provide the questions in the following format:
- Question Number
- Category Tag (MUST use format [Major Category - Subcategory] with values directly from the taxonomy)
- Question Text (formatted with the context-heavy style described above)
- [Answer]
</output-formatting>
"#,
            exemplars = format_exemplar_questions(),
        ))
    }

    /// 结构化出题提示词：在自由文本提示词后追加字段要求
    pub fn build_structured_prompt(&self, opts: &PromptOptions) -> AppResult<String> {
        let base = self.build_question_prompt(opts)?;

        Ok(format!(
            r#"{base}
<structured-output>
Ignore the output-formatting section above and return a JSON object of the form {{"questions": [...]}} with exactly {count} entries.
- "question" must be at least 200 characters long and must not contain the answer.
- "category" must be a major category and "subcategory" must be one of that category's own subcategories.
- "difficulty" is an integer from 1 (easiest) to 5 (hardest).
- "tags" are lowercase; multi-word tags use underscores; tags must not give away the answer.
- "image" is a URL to a relevant image and "imageAlt" describes it.
- "additionalInfo" is markdown with fun facts, context, and learning resources about the answer.
- "id", "author", "createdAt", "createdBy" and "createdByEmail" may be placeholders; they are replaced after generation.
</structured-output>
"#,
            count = opts.number_of_questions,
        ))
    }
}

/// 示例题渲染为 `N. [大类 - 子类] "题干"`
pub fn format_exemplar_questions() -> String {
    EXEMPLAR_QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, (category, question, _))| format!("{}. [{}] \"{}\"", i + 1, category, question))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::category_validator::CategoryValidator;

    fn builder() -> PromptBuilder {
        PromptBuilder::new(Arc::new(Taxonomy::builtin()))
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let opts = PromptOptions::new(5).with_topic("Ancient Rome");
        let a = builder().build_question_prompt(&opts).unwrap();
        let b = builder().build_question_prompt(&opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_topic_prompt_omits_taxonomy() {
        let prompt = builder()
            .build_question_prompt(&PromptOptions::new(3).with_topic("Ancient Rome"))
            .unwrap();

        assert!(prompt.contains("on the topic: \"Ancient Rome\""));
        assert!(!prompt.contains("<category-distribution>"));
        assert!(prompt.contains("generate 3 quiz questions on the topic \"Ancient Rome\""));
    }

    #[test]
    fn test_no_topic_prompt_embeds_taxonomy() {
        let prompt = builder().build_question_prompt(&PromptOptions::new(1)).unwrap();

        assert!(prompt.contains("<category-distribution>"));
        assert!(prompt.contains("\"Physical Geography\""));
        assert!(prompt.contains("generate 1 quiz question distributed across the categories"));
    }

    #[test]
    fn test_prompt_contains_leakage_rules_and_exemplars() {
        let prompt = builder().build_question_prompt(&PromptOptions::new(2)).unwrap();

        assert!(prompt.contains("Named Vesta"));
        assert!(prompt.contains("toga candida"));
        assert!(prompt.contains("First Triumvirate"));
        assert!(prompt.contains("10. [Culture - Architecture]"));
    }

    #[test]
    fn test_rejects_zero_questions() {
        let result = builder().build_question_prompt(&PromptOptions::new(0));
        assert!(matches!(result, Err(AppError::PromptBuild { .. })));
    }

    #[test]
    fn test_rejects_blank_topic() {
        let result = builder().build_question_prompt(&PromptOptions::new(2).with_topic("   "));
        assert!(result.is_err());
    }

    #[test]
    fn test_exemplar_tags_belong_to_builtin_taxonomy() {
        let validator = CategoryValidator::new(Arc::new(Taxonomy::builtin()));
        for (category, _, _) in EXEMPLAR_QUESTIONS {
            let result = validator.validate_category(&format!("[{}]", category));
            assert!(result.valid, "{}: {:?}", category, result.errors);
        }
    }

    #[test]
    fn test_structured_prompt_appends_field_rules() {
        let prompt = builder()
            .build_structured_prompt(&PromptOptions::new(4).with_topic("Volcanoes"))
            .unwrap();

        assert!(prompt.contains("<structured-output>"));
        assert!(prompt.contains("exactly 4 entries"));
    }
}
