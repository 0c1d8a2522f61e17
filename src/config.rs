use std::str::FromStr;

use tracing::warn;

use crate::error::ConfigError;

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// 自由文本出题 → 解析 → 评估
    Generate,
    /// 结构化出题 → 结构校验 → 评估
    Structured,
    /// 从 TOML 文件读取题目，只做评估
    Evaluate,
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generate" | "text" => Ok(RunMode::Generate),
            "structured" | "object" => Ok(RunMode::Structured),
            "evaluate" | "eval" => Ok(RunMode::Evaluate),
            _ => Err(ConfigError::UnknownMode {
                value: s.to_string(),
            }),
        }
    }
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Generate => "generate",
            RunMode::Structured => "structured",
            RunMode::Evaluate => "evaluate",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 运行模式
    pub mode: RunMode,
    /// 出题主题，为空时按分类均衡出题
    pub topic: Option<String>,
    /// 出题数量
    pub number_of_questions: usize,
    /// 自由文本模式下是否流式输出
    pub stream_output: bool,
    /// 自定义分类体系 TOML 文件，为空时使用内置分类
    pub taxonomy_file: Option<String>,
    /// evaluate 模式下读取的题目 TOML 文件
    pub questions_file: Option<String>,
    /// 结构化结果输出文件（JSON）
    pub output_file: Option<String>,
    /// 同时进行的评估调用上限，None 表示不限
    pub max_concurrent_evaluations: Option<usize>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 题目元数据 ---
    pub default_author: String,
    pub created_by: String,
    pub created_by_email: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub evaluator_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: RunMode::Generate,
            topic: Some("Ancient Rome".to_string()),
            number_of_questions: 5,
            stream_output: false,
            taxonomy_file: None,
            questions_file: None,
            output_file: None,
            max_concurrent_evaluations: None,
            verbose_logging: false,
            default_author: "Trivia Question Architect".to_string(),
            created_by: "00000000-0000-4000-8000-000000000000".to_string(),
            created_by_email: "quiz-bot@example.com".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            evaluator_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            mode: std::env::var("QUIZ_MODE")
                .ok()
                .and_then(|v| parse_or_warn("QUIZ_MODE", &v))
                .unwrap_or(default.mode),
            topic: match std::env::var("QUIZ_TOPIC") {
                Ok(v) if v.trim().is_empty() => None,
                Ok(v) => Some(v),
                Err(_) => default.topic,
            },
            number_of_questions: std::env::var("QUESTION_COUNT").ok().and_then(|v| parse_or_warn("QUESTION_COUNT", &v)).unwrap_or(default.number_of_questions),
            stream_output: std::env::var("STREAM_OUTPUT").ok().and_then(|v| parse_or_warn("STREAM_OUTPUT", &v)).unwrap_or(default.stream_output),
            taxonomy_file: std::env::var("TAXONOMY_FILE").ok().or(default.taxonomy_file),
            questions_file: std::env::var("QUESTIONS_FILE").ok().or(default.questions_file),
            output_file: std::env::var("OUTPUT_FILE").ok().or(default.output_file),
            max_concurrent_evaluations: std::env::var("MAX_CONCURRENT_EVALUATIONS")
                .ok()
                .and_then(|v| parse_or_warn::<usize>("MAX_CONCURRENT_EVALUATIONS", &v))
                .filter(|n| *n > 0)
                .or(default.max_concurrent_evaluations),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| parse_or_warn("VERBOSE_LOGGING", &v)).unwrap_or(default.verbose_logging),
            default_author: std::env::var("DEFAULT_AUTHOR").unwrap_or(default.default_author),
            created_by: std::env::var("CREATED_BY").unwrap_or(default.created_by),
            created_by_email: std::env::var("CREATED_BY_EMAIL").unwrap_or(default.created_by_email),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            evaluator_model_name: std::env::var("EVALUATOR_MODEL_NAME").unwrap_or(default.evaluator_model_name),
        }
    }
}

fn parse_or_warn<T: FromStr>(var_name: &str, value: &str) -> Option<T> {
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("环境变量 {} 的值 '{}' 无法解析，使用默认值", var_name, value);
            None
        }
    }
}
