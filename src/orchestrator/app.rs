//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：加载分类体系，创建出题模型与评分模型
//! 2. **按模式运行**：generate / structured / evaluate
//! 3. **结果输出**：逐题报告、汇总统计，可选写入 JSON 文件

use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::{info, warn};

use crate::config::{Config, RunMode};
use crate::error::{AppResult, ConfigError, FileError};
use crate::infrastructure::{LanguageModel, OpenAiModel};
use crate::models::evaluation::EvaluatorKind;
use crate::models::taxonomy::Taxonomy;
use crate::models::{load_question_entries, load_taxonomy};
use crate::services::prompt_builder::PromptOptions;
use crate::utils::logging;
use crate::workflow::{QuizFlow, SessionReport};

/// 应用主结构
pub struct App {
    config: Config,
    flow: QuizFlow,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        if config.llm_api_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                var_name: "LLM_API_KEY".to_string(),
            }
            .into());
        }

        let generator: Arc<dyn LanguageModel> = Arc::new(OpenAiModel::new(&config));
        let grader: Arc<dyn LanguageModel> = Arc::new(OpenAiModel::with_model(
            &config,
            config.evaluator_model_name.clone(),
        ));

        Self::with_models(config, generator, grader).await
    }

    /// 使用指定的模型初始化（测试或自定义后端）
    pub async fn with_models(
        config: Config,
        generator: Arc<dyn LanguageModel>,
        grader: Arc<dyn LanguageModel>,
    ) -> AppResult<Self> {
        let taxonomy = match &config.taxonomy_file {
            Some(path) => load_taxonomy(Path::new(path)).await?,
            None => Taxonomy::builtin(),
        };

        let flow = QuizFlow::new(generator, grader, Arc::new(taxonomy), &config);

        Ok(Self { config, flow })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<SessionReport> {
        logging::log_startup(&self.config);

        let report = match self.config.mode {
            RunMode::Generate => self.flow.run_generate(&self.prompt_options()).await?,
            RunMode::Structured => self.flow.run_structured(&self.prompt_options()).await?,
            RunMode::Evaluate => {
                let path = self
                    .config
                    .questions_file
                    .as_deref()
                    .ok_or_else(|| ConfigError::Missing {
                        var_name: "QUESTIONS_FILE".to_string(),
                    })?;
                let entries = load_question_entries(Path::new(path)).await?;
                if entries.is_empty() {
                    warn!("⚠️ 题目文件为空: {}", path);
                }
                self.flow.run_evaluate(entries).await?
            }
        };

        print_report(&report);

        if let Some(path) = &self.config.output_file {
            write_report(Path::new(path), &report).await?;
        }

        Ok(report)
    }

    fn prompt_options(&self) -> PromptOptions {
        let opts = PromptOptions::new(self.config.number_of_questions);
        match &self.config.topic {
            Some(topic) => opts.with_topic(topic.clone()),
            None => opts,
        }
    }
}

fn print_report(report: &SessionReport) {
    logging::log_rejected(&report.rejected);

    if let Some(summary) = &report.category_check {
        logging::log_category_summary(summary);
    }

    logging::log_evaluation_report(EvaluatorKind::Quality, &report.questions, &report.quality);

    if let Some(category) = &report.category {
        let tagged: Vec<_> = report
            .questions
            .iter()
            .filter(|q| q.category_tag.is_some())
            .cloned()
            .collect();
        logging::log_evaluation_report(EvaluatorKind::Category, &tagged, category);
    }

    if let Some(requested) = report.requested {
        if report.is_short() {
            warn!(
                "⚠️ 请求 {} 道题目，只有 {} 道进入评估 (丢弃 {} 个题块，{} 道未通过结构校验)",
                requested,
                report.questions.len(),
                report.dropped_blocks,
                report.rejected.len()
            );
        }
    }
}

async fn write_report(path: &Path, report: &SessionReport) -> AppResult<()> {
    let json = serde_json::to_string_pretty(report).map_err(FileError::from)?;

    fs::write(path, json)
        .await
        .map_err(|source| FileError::WriteFailed {
            path: path.display().to_string(),
            source,
        })?;

    info!("\n结果已保存至: {}", path.display());
    Ok(())
}
