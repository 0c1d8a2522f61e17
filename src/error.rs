use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 提示词参数非法（题目数量为 0、主题为空白等）
    #[error("提示词构建失败: {reason}")]
    PromptBuild { reason: String },

    /// 出题调用失败，或结构化输出不符合约定结构
    #[error("题目生成失败: {0}")]
    Generation(#[source] LlmError),

    /// 评分调用失败
    #[error("题目评估失败: {0}")]
    Evaluation(#[source] LlmError),

    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// LLM 能力层错误
///
/// 不做任何重试，原样向上抛出
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败（网络、鉴权、配额等）
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },

    /// 返回内容无法按约定结构解析
    #[error("LLM返回结构非法 (模型: {model}): {reason}")]
    InvalidPayload { model: String, reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// JSON 序列化失败
    #[error("JSON序列化失败: {0}")]
    JsonSerializeFailed(#[from] serde_json::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 分类体系不满足约束
    #[error("分类体系非法: {reason}")]
    InvalidTaxonomy { reason: String },

    /// 运行模式无法识别
    #[error("未知运行模式: '{value}' (可选: generate, structured, evaluate)")]
    UnknownMode { value: String },

    /// 当前模式缺少必需的配置项
    #[error("缺少配置项 {var_name}")]
    Missing { var_name: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建提示词构建错误
    pub fn prompt_build(reason: impl Into<String>) -> Self {
        AppError::PromptBuild {
            reason: reason.into(),
        }
    }
}

impl LlmError {
    /// 创建 API 调用错误
    pub fn api_call_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        }
    }

    /// 创建结构非法错误
    pub fn invalid_payload(model: impl Into<String>, reason: impl Into<String>) -> Self {
        LlmError::InvalidPayload {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
