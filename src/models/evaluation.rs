use serde::{Deserialize, Serialize};

/// 评分等级（有序，非数值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::A, Grade::B, Grade::C, Grade::D];

    /// A 或 B 视为通过
    pub fn passes(self) -> bool {
        matches!(self, Grade::A | Grade::B)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 评估器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvaluatorKind {
    /// 题目质量评估（事实、泄题、语境等）
    Quality,
    /// 分类评估
    Category,
}

impl EvaluatorKind {
    /// 等级 → 分数，调用方约定，与模型无关
    pub fn numeric_score(self, grade: Grade) -> f64 {
        match (self, grade) {
            (_, Grade::A) => 1.0,
            (EvaluatorKind::Quality, Grade::B) => 0.5,
            (EvaluatorKind::Quality, Grade::C) => 0.0,
            (EvaluatorKind::Category, Grade::B) => 0.67,
            (EvaluatorKind::Category, Grade::C) => 0.33,
            (_, Grade::D) => 0.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EvaluatorKind::Quality => "题目质量",
            EvaluatorKind::Category => "分类",
        }
    }
}

/// 单题评估结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub score: Grade,
    pub numeric_score: f64,
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_subcategory: Option<String>,
}

impl Evaluation {
    pub fn new(kind: EvaluatorKind, score: Grade, feedback: impl Into<String>) -> Self {
        Self {
            score,
            numeric_score: kind.numeric_score(score),
            feedback: feedback.into(),
            detected_category: None,
            detected_subcategory: None,
        }
    }
}

/// 批量评估结果，每次调用重新计算
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// 与输入顺序一致
    pub evaluations: Vec<Evaluation>,
    pub average_score: f64,
    pub pass_rate: f64,
    pub pass_count: usize,
}

impl BatchResult {
    /// 空批次的平均分与通过率均为 0
    pub fn from_evaluations(evaluations: Vec<Evaluation>) -> Self {
        let total = evaluations.len();
        let pass_count = evaluations.iter().filter(|e| e.score.passes()).count();

        let (average_score, pass_rate) = if total == 0 {
            (0.0, 0.0)
        } else {
            let sum: f64 = evaluations.iter().map(|e| e.numeric_score).sum();
            (sum / total as f64, pass_count as f64 / total as f64)
        };

        Self {
            evaluations,
            average_score,
            pass_rate,
            pass_count,
        }
    }

    pub fn total(&self) -> usize {
        self.evaluations.len()
    }
}
