//! 出题评估流程 - 流程层
//!
//! 核心职责：定义"一次出题会话"的完整处理流程
//!
//! 三种流程：
//! 1. generate：自由文本出题 → 解析 → 分类标签校验 → 质量评估
//! 2. structured：结构化出题 → 结构校验 → 质量评估 + 分类评估
//! 3. evaluate：已有题目 → 质量评估 + 分类校验 + 分类评估

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tokio::io::{AsyncWriteExt, Stdout};
use tracing::{info, warn};

use crate::config::{Config, RunMode};
use crate::error::{AppResult, FileError};
use crate::infrastructure::LanguageModel;
use crate::models::evaluation::BatchResult;
use crate::models::question::{QuestionEntry, QuestionMetadata, QuizQuestion};
use crate::models::taxonomy::Taxonomy;
use crate::workflow::batch_evaluator::BatchEvaluator;
use crate::services::category_validator::{CategoryBatchSummary, CategoryValidator};
use crate::services::evaluator::EvaluationItem;
use crate::services::generation_service::{GenerationService, RejectedQuestion};
use crate::services::prompt_builder::PromptOptions;
use crate::services::text_parser::parse_questions;
use crate::services::{CategoryEvaluator, QualityEvaluator};
use crate::utils::logging;

/// 一次会话的结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub mode: &'static str,
    /// 参与评估的题目，顺序与评估结果一致
    pub questions: Vec<QuestionEntry>,
    /// 请求的题目数（evaluate 模式为空）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<usize>,
    /// 自由文本中无法解析而被丢弃的题块
    pub dropped_blocks: usize,
    /// 结构化出题通过校验的完整题目
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accepted: Vec<QuizQuestion>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_check: Option<CategoryBatchSummary>,
    pub quality: BatchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<BatchResult>,
}

impl SessionReport {
    fn new(mode: RunMode, questions: Vec<QuestionEntry>, quality: BatchResult) -> Self {
        Self {
            mode: mode.as_str(),
            questions,
            requested: None,
            dropped_blocks: 0,
            accepted: Vec::new(),
            rejected: Vec::new(),
            category_check: None,
            quality,
            category: None,
        }
    }

    /// 解析或校验后剩下的题目数少于请求数
    pub fn is_short(&self) -> bool {
        self.requested
            .is_some_and(|requested| self.questions.len() < requested)
    }
}

/// 出题评估流程
///
/// - 编排出题、解析、校验与评估
/// - 不持有配置之外的状态，可重复运行
pub struct QuizFlow {
    generation_service: GenerationService,
    category_validator: CategoryValidator,
    quality_batch: BatchEvaluator,
    category_batch: BatchEvaluator,
    metadata: QuestionMetadata,
    stream_output: bool,
    verbose_logging: bool,
}

impl QuizFlow {
    pub fn new(
        generator: Arc<dyn LanguageModel>,
        grader: Arc<dyn LanguageModel>,
        taxonomy: Arc<Taxonomy>,
        config: &Config,
    ) -> Self {
        let quality = Arc::new(QualityEvaluator::new(grader.clone()));
        let category = Arc::new(CategoryEvaluator::new(grader, &taxonomy));

        Self {
            generation_service: GenerationService::new(
                generator,
                taxonomy.clone(),
                config.default_author.clone(),
            ),
            category_validator: CategoryValidator::new(taxonomy),
            quality_batch: BatchEvaluator::new(quality)
                .with_max_concurrency(config.max_concurrent_evaluations),
            category_batch: BatchEvaluator::new(category)
                .with_max_concurrency(config.max_concurrent_evaluations),
            metadata: QuestionMetadata {
                created_by: config.created_by.clone(),
                created_by_email: config.created_by_email.clone(),
                author_name: None,
            },
            stream_output: config.stream_output,
            verbose_logging: config.verbose_logging,
        }
    }

    /// 自由文本出题并评估
    pub async fn run_generate(&self, opts: &PromptOptions) -> AppResult<SessionReport> {
        let text = if self.stream_output {
            self.stream_to_stdout(opts).await?
        } else {
            self.generation_service.generate_text(opts).await?
        };

        if self.verbose_logging {
            logging::log_section("📝 模型原始输出");
            info!("{}", text);
        }

        let parsed = parse_questions(&text);
        info!("✓ 解析出 {} 道题目", parsed.questions.len());
        if let Some((got, requested)) = parsed.count_mismatch(opts.number_of_questions) {
            warn!("⚠️ 解析数量与请求数量不一致: {}/{}", got, requested);
        }

        let category_check = self.check_category_tags(&parsed.questions);

        let quality = self
            .quality_batch
            .evaluate_all(&EvaluationItem::quality_items(&parsed.questions))
            .await?;

        let mut report = SessionReport::new(RunMode::Generate, parsed.questions, quality);
        report.requested = Some(opts.number_of_questions);
        report.dropped_blocks = parsed.dropped_blocks;
        report.category_check = category_check;

        Ok(report)
    }

    /// 结构化出题并评估通过校验的题目
    pub async fn run_structured(&self, opts: &PromptOptions) -> AppResult<SessionReport> {
        let outcome = self
            .generation_service
            .generate_structured(opts, &self.metadata)
            .await?;

        let entries: Vec<QuestionEntry> = outcome.accepted.iter().map(QuestionEntry::from).collect();

        let quality = self
            .quality_batch
            .evaluate_all(&EvaluationItem::quality_items(&entries))
            .await?;
        let category = self
            .category_batch
            .evaluate_all(&EvaluationItem::category_items(&entries))
            .await?;

        let mut report = SessionReport::new(RunMode::Structured, entries, quality);
        report.requested = Some(opts.number_of_questions);
        report.accepted = outcome.accepted;
        report.rejected = outcome.rejected;
        report.category = Some(category);

        Ok(report)
    }

    /// 评估已有题目
    pub async fn run_evaluate(&self, entries: Vec<QuestionEntry>) -> AppResult<SessionReport> {
        let category_check = self.check_category_tags(&entries);

        let quality = self
            .quality_batch
            .evaluate_all(&EvaluationItem::quality_items(&entries))
            .await?;

        let tagged = EvaluationItem::category_items(&entries);
        let category = if tagged.is_empty() {
            None
        } else {
            Some(self.category_batch.evaluate_all(&tagged).await?)
        };

        let mut report = SessionReport::new(RunMode::Evaluate, entries, quality);
        report.category_check = category_check;
        report.category = category;

        Ok(report)
    }

    /// 校验带分类标签的题目，没有标签时返回 None
    fn check_category_tags(&self, entries: &[QuestionEntry]) -> Option<CategoryBatchSummary> {
        let tagged: Vec<(&str, &str)> = entries
            .iter()
            .filter_map(|e| e.category_tag.as_deref().map(|tag| (e.question.as_str(), tag)))
            .collect();

        if tagged.is_empty() {
            return None;
        }

        Some(self.category_validator.validate_categories(tagged))
    }

    /// 流式输出到终端，同时拼出完整文本
    ///
    /// 流必须读完才返回
    async fn stream_to_stdout(&self, opts: &PromptOptions) -> AppResult<String> {
        let mut fragments = self.generation_service.stream_questions(opts).await?;
        let mut stdout = tokio::io::stdout();
        let mut text = String::new();

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            write_stdout(&mut stdout, fragment.as_bytes()).await?;
            text.push_str(&fragment);
        }
        write_stdout(&mut stdout, b"\n").await?;

        Ok(text)
    }
}

async fn write_stdout(stdout: &mut Stdout, bytes: &[u8]) -> AppResult<()> {
    stdout.write_all(bytes).await.map_err(stdout_error)?;
    stdout.flush().await.map_err(stdout_error)?;
    Ok(())
}

fn stdout_error(source: std::io::Error) -> FileError {
    FileError::WriteFailed {
        path: "<stdout>".to_string(),
        source,
    }
}
