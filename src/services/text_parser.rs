//! 自由文本题目解析
//!
//! 启发式解析，不是语法：找不到 `[Answer]` 的题块被丢弃并计数，
//! 调用方应当用 `ParseReport::count_mismatch` 对比请求数量。

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::models::question::QuestionEntry;

/// 题块分隔：`- Question N`、`**N.`、行首 `N.`
static BLOCK_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:- Question \d+|\*\*\d+\.|^\s*\d+\.)").expect("合法的正则")
});
static ANSWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\[Answer\]\s*(.*)$").expect("合法的正则"));
static CATEGORY_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\-\*\s]*\[(.+?\s*-\s*.+?)\]\s*\**$").expect("合法的正则")
});

/// 解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub questions: Vec<QuestionEntry>,
    /// 像题目（有分类行或答案标记）但无法解析的题块数
    pub dropped_blocks: usize,
}

impl ParseReport {
    /// 解析数量与请求数量不一致时返回 `(解析数, 请求数)`
    pub fn count_mismatch(&self, requested: usize) -> Option<(usize, usize)> {
        let parsed = self.questions.len();
        (parsed != requested).then_some((parsed, requested))
    }
}

/// 从模型自由文本中恢复 `(题干, 答案, 分类标签)`
pub fn parse_questions(text: &str) -> ParseReport {
    let mut report = ParseReport::default();

    for (idx, block) in BLOCK_SPLIT_RE.split(text).enumerate() {
        if block.trim().is_empty() {
            continue;
        }
        // 第一个分隔符之前的说明文字
        if idx == 0 && !looks_like_question(block) {
            continue;
        }

        match parse_block(block) {
            Some(entry) => report.questions.push(entry),
            None => {
                debug!("丢弃无法解析的题块: {}", block.trim());
                report.dropped_blocks += 1;
            }
        }
    }

    if report.dropped_blocks > 0 {
        warn!("⚠️ 有 {} 个题块无法解析（缺少答案或题干），已丢弃", report.dropped_blocks);
    }

    report
}

fn looks_like_question(block: &str) -> bool {
    block
        .lines()
        .map(str::trim)
        .any(|l| ANSWER_RE.is_match(l) || CATEGORY_LINE_RE.is_match(l))
}

fn parse_block(block: &str) -> Option<QuestionEntry> {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut question_lines: Vec<&str> = Vec::new();
    let mut category_tag: Option<String> = None;
    let mut answer: Option<&str> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        i += 1;

        if let Some(caps) = ANSWER_RE.captures(line) {
            let inline = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if !inline.is_empty() {
                answer = Some(inline);
            } else if let Some(next) = lines.get(i) {
                answer = Some(next);
            }
            // 答案之后的内容不属于题干
            break;
        }

        if let Some(caps) = CATEGORY_LINE_RE.captures(line) {
            if category_tag.is_none() {
                category_tag = caps.get(1).map(|m| format!("[{}]", m.as_str().trim()));
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("- ") {
            question_lines.push(rest);
        } else if !line.starts_with('[') && !line.starts_with("**") {
            question_lines.push(line);
        }
    }

    let answer = answer?.trim_matches('*').trim();
    let question = question_lines.join(" ");
    let question = question.trim();

    if question.is_empty() || answer.is_empty() {
        return None;
    }

    let entry = QuestionEntry::new(question, answer);
    Some(match category_tag {
        Some(tag) => entry.with_category_tag(tag),
        None => entry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"Here are your questions.

1. [History - Military History]
Built to deter raids from the north, this 73-mile stone barrier crossed Britannia. Which emperor ordered it?
[Answer] Hadrian

2. [Culture - Mythology]
- Tended by six priestesses, whose sacred flame burned in a round temple in the Forum?
[Answer]
The goddess Vesta

3. [World - Cities]
Which city was founded, according to legend, by twins raised by a she-wolf?
"#;

    #[test]
    fn test_parses_inline_and_next_line_answers() {
        let report = parse_questions(SAMPLE);

        assert_eq!(report.questions.len(), 2);
        assert_eq!(report.questions[0].answer, "Hadrian");
        assert_eq!(
            report.questions[0].category_tag.as_deref(),
            Some("[History - Military History]")
        );
        assert!(report.questions[0].question.starts_with("Built to deter"));

        assert_eq!(report.questions[1].answer, "The goddess Vesta");
        assert!(report.questions[1].question.starts_with("Tended by"));
    }

    #[test]
    fn test_missing_answer_is_dropped_and_counted() {
        let report = parse_questions(SAMPLE);

        // 开头的说明文字不计入，只有第 3 题被丢弃
        assert_eq!(report.dropped_blocks, 1);
        assert_eq!(report.count_mismatch(3), Some((2, 3)));
        assert_eq!(report.count_mismatch(2), None);
    }

    #[test]
    fn test_block_without_answer_yields_nothing() {
        let report = parse_questions("1. [Sciences - Biology]\nWhich organ filters blood?\n");
        assert!(report.questions.is_empty());
        assert_eq!(report.dropped_blocks, 1);
    }

    #[test]
    fn test_question_marker_and_bold_numbering() {
        let text = "- Question 1\n- **[Media - Literature]**\nWho wrote the Aeneid?\n[ANSWER] Virgil\n\
                    **2.** [World - Flags]\nWhich flag has a maple leaf?\n[Answer] **Canada**";
        let report = parse_questions(text);

        assert_eq!(report.questions.len(), 2);
        assert_eq!(report.questions[0].category_tag.as_deref(), Some("[Media - Literature]"));
        assert_eq!(report.questions[0].answer, "Virgil");
        assert_eq!(report.questions[1].answer, "Canada");
        assert_eq!(report.questions[1].question, "Which flag has a maple leaf?");
    }

    #[test]
    fn test_leading_text_with_answer_is_still_parsed() {
        let text = "[Culture - Mythology]\nWhich goddess guarded the hearth?\n[Answer] Vesta\n\n\
                    2. [World - Flags]\nWhich flag has a maple leaf?\n";
        let report = parse_questions(text);

        assert_eq!(report.questions.len(), 1);
        assert_eq!(report.questions[0].answer, "Vesta");
        assert_eq!(report.dropped_blocks, 1);
    }

    #[test]
    fn test_empty_text() {
        let report = parse_questions("   \n ");
        assert_eq!(report, ParseReport::default());
        assert_eq!(report.count_mismatch(0), None);
    }
}
