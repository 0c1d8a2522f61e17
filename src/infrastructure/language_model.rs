//! 语言模型 - 基础设施层
//!
//! 持有唯一的 LLM 客户端，只暴露"生成"能力：
//! 自由文本、结构化对象、流式文本片段。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;

/// 能力层结果类型
pub type LlmResult<T> = Result<T, LlmError>;

/// 有序、有限、不可重放的文本片段流
///
/// 消费方需要读到结束，否则底层请求的资源不保证被释放
pub type TextStream = BoxStream<'static, LlmResult<String>>;

/// 一次生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// 结构化输出约束（JSON Schema）
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub description: Option<String>,
    pub schema: JsonValue,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, schema: JsonValue) -> Self {
        Self {
            name: name.into(),
            description: None,
            schema,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// 外部生成能力
///
/// 重试、限流、鉴权都不在这里处理，错误原样返回
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// 返回完整文本
    async fn generate_text(&self, request: &GenerationRequest) -> LlmResult<String>;

    /// 返回满足 schema 结构的 JSON 对象
    async fn generate_object(
        &self,
        request: &GenerationRequest,
        schema: &OutputSchema,
    ) -> LlmResult<JsonValue>;

    /// 返回文本片段流，默认把完整文本作为唯一片段
    async fn stream_text(&self, request: &GenerationRequest) -> LlmResult<TextStream> {
        let text = self.generate_text(request).await?;
        Ok(stream::once(async move { Ok(text) }).boxed())
    }
}

/// OpenAI 兼容接口的语言模型
pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiModel {
    /// 使用出题模型创建
    pub fn new(config: &Config) -> Self {
        Self::with_model(config, config.llm_model_name.clone())
    }

    /// 使用自定义模型名创建（例如评分模型）
    pub fn with_model(config: &Config, model_name: impl Into<String>) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: model_name.into(),
        }
    }

    /// 构建消息列表与请求
    fn build_request(
        &self,
        request: &GenerationRequest,
        response_format: Option<ResponseFormat>,
        stream: bool,
    ) -> LlmResult<CreateChatCompletionRequest> {
        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = &request.system {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg.as_str())
                .build()
                .map_err(|e| LlmError::api_call_failed(&self.model_name, e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt.as_str())
            .build()
            .map_err(|e| LlmError::api_call_failed(&self.model_name, e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model_name).messages(messages);

        if let Some(temperature) = request.temperature {
            builder.temperature(temperature);
        }
        if let Some(format) = response_format {
            builder.response_format(format);
        }
        if stream {
            builder.stream(true);
        }

        builder
            .build()
            .map_err(|e| LlmError::api_call_failed(&self.model_name, e))
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate_text(&self, request: &GenerationRequest) -> LlmResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", request.prompt.len());

        let chat_request = self.build_request(request, None, false)?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            LlmError::api_call_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })
    }

    async fn generate_object(
        &self,
        request: &GenerationRequest,
        schema: &OutputSchema,
    ) -> LlmResult<JsonValue> {
        debug!(
            "调用 LLM API (结构化输出 {})，模型: {}",
            schema.name, self.model_name
        );

        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: schema.description.clone(),
                name: schema.name.clone(),
                schema: Some(schema.schema.clone()),
                strict: Some(true),
            },
        };
        let chat_request = self.build_request(request, Some(response_format), false)?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            LlmError::api_call_failed(&self.model_name, e)
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        parse_json_payload(&self.model_name, &content)
    }

    async fn stream_text(&self, request: &GenerationRequest) -> LlmResult<TextStream> {
        debug!("调用 LLM API (流式)，模型: {}", self.model_name);

        let chat_request = self.build_request(request, None, true)?;

        let chunks = self
            .client
            .chat()
            .create_stream(chat_request)
            .await
            .map_err(|e| {
                warn!("LLM 流式调用失败: {}", e);
                LlmError::api_call_failed(&self.model_name, e)
            })?;

        let model = self.model_name.clone();
        let fragments = chunks.filter_map(move |chunk| {
            let model = model.clone();
            async move {
                match chunk {
                    Ok(response) => {
                        let text: String = response
                            .choices
                            .iter()
                            .filter_map(|choice| choice.delta.content.as_deref())
                            .collect();
                        (!text.is_empty()).then_some(Ok(text))
                    }
                    Err(e) => Some(Err(LlmError::api_call_failed(model, e))),
                }
            }
        });

        Ok(fragments.boxed())
    }
}

/// 解析结构化输出内容
///
/// 部分兼容服务会把 JSON 包在 markdown 代码块里，先去掉代码块标记
pub fn parse_json_payload(model: &str, content: &str) -> LlmResult<JsonValue> {
    let trimmed = strip_code_fence(content.trim());
    if trimmed.is_empty() {
        return Err(LlmError::EmptyContent {
            model: model.to_string(),
        });
    }

    serde_json::from_str(trimmed).map_err(|e| LlmError::invalid_payload(model, e.to_string()))
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    // 跳过语言标记（```json）
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let value = parse_json_payload("m", r#"{"score": "A"}"#).unwrap();
        assert_eq!(value["score"], "A");
    }

    #[test]
    fn test_parse_fenced_json() {
        let content = "```json\n{\"score\": \"B\", \"feedback\": \"ok\"}\n```";
        let value = parse_json_payload("m", content).unwrap();
        assert_eq!(value["feedback"], "ok");
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_json_payload("m", "Grade: A");
        assert!(matches!(result, Err(LlmError::InvalidPayload { .. })));
    }

    #[test]
    fn test_parse_empty_content() {
        let result = parse_json_payload("m", "  ");
        assert!(matches!(result, Err(LlmError::EmptyContent { .. })));
    }

    #[test]
    fn test_build_request_includes_system_and_format() {
        let model = OpenAiModel::new(&Config::default());
        let request = GenerationRequest::new("hello")
            .with_system("be brief")
            .with_temperature(0.2);

        let chat_request = model
            .build_request(&request, Some(ResponseFormat::JsonObject), false)
            .unwrap();

        assert_eq!(chat_request.messages.len(), 2);
        assert_eq!(chat_request.model, "gpt-4o-mini");
        assert!(chat_request.response_format.is_some());
    }

    /// 测试通用 LLM 调用
    #[tokio::test]
    #[ignore]
    async fn test_generate_text_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let model = OpenAiModel::new(&Config::from_env());
        let request = GenerationRequest::new("Say hello in one sentence!");

        let response = model.generate_text(&request).await.unwrap();
        println!("LLM 响应: {}", response);
        assert!(!response.is_empty());
    }

    /// 测试流式输出
    #[tokio::test]
    #[ignore]
    async fn test_stream_text_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let model = OpenAiModel::new(&Config::from_env());
        let request =
            GenerationRequest::new("Give me the first paragraph of a story about an imaginary planet.");

        let mut fragments = model.stream_text(&request).await.unwrap();
        let mut full = String::new();
        while let Some(fragment) = fragments.next().await {
            full.push_str(&fragment.unwrap());
        }
        assert!(!full.is_empty());
    }
}
