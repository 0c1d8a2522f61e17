/// 日志工具模块
///
/// 初始化 tracing 订阅者，并提供报告输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::evaluation::{BatchResult, EvaluatorKind};
use crate::models::question::QuestionEntry;
use crate::services::category_validator::CategoryBatchSummary;
use crate::services::generation_service::RejectedQuestion;

/// 初始化日志
///
/// `RUST_LOG` 优先，默认 `info`。重复调用无副作用。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 模式: {}", config.mode);
    info!("🤖 出题模型: {}", config.llm_model_name);
    info!("🧑‍⚖️ 评估模型: {}", config.evaluator_model_name);
    match config.max_concurrent_evaluations {
        Some(limit) => info!("📊 评估并发上限: {}", limit),
        None => info!("📊 评估并发上限: 不限"),
    }
    info!("{}", "=".repeat(60));
}

/// 记录小节标题
pub fn log_section(title: &str) {
    info!("\n{}", "─".repeat(60));
    info!("{}", title);
    info!("{}", "─".repeat(60));
}

/// 逐题输出评估结果
///
/// `entries` 与 `result.evaluations` 一一对应
pub fn log_evaluation_report(kind: EvaluatorKind, entries: &[QuestionEntry], result: &BatchResult) {
    log_section(&format!("📋 {}评估结果", kind.name()));

    for (idx, (entry, evaluation)) in entries.iter().zip(&result.evaluations).enumerate() {
        info!(
            "[题目 {}] 等级: {} ({:.2})",
            idx + 1,
            evaluation.score,
            evaluation.numeric_score
        );
        info!("  题干: {}", truncate_text(&entry.question, 80));
        info!("  答案: {}", entry.answer);
        if let Some(tag) = &entry.category_tag {
            info!("  分类: {}", tag);
        }
        if let (Some(major), Some(sub)) = (&evaluation.detected_category, &evaluation.detected_subcategory) {
            info!("  模型判断分类: [{} - {}]", major, sub);
        }
        info!("  反馈: {}", evaluation.feedback);
    }

    log_batch_summary(kind, result);
}

/// 输出批量评估汇总
pub fn log_batch_summary(kind: EvaluatorKind, result: &BatchResult) {
    info!("\n{}", "=".repeat(60));
    info!("📊 {}评估汇总", kind.name());
    info!("{}", "=".repeat(60));
    info!("题目数: {}", result.total());
    info!("📈 平均分: {:.2}", result.average_score);
    info!(
        "✅ 通过率 (A 或 B): {:.1}% ({}/{})",
        result.pass_rate * 100.0,
        result.pass_count,
        result.total()
    );
    info!("{}", "=".repeat(60));
}

/// 输出分类标签校验汇总
pub fn log_category_summary(summary: &CategoryBatchSummary) {
    log_section("🏷️ 分类标签校验");

    for (idx, check) in summary.results.iter().enumerate() {
        if check.validation.valid {
            continue;
        }
        info!(
            "[题目 {}] ❌ {}",
            idx + 1,
            truncate_text(&check.question, 60)
        );
        for error in &check.validation.errors {
            info!("  - {}", error);
        }
    }

    info!(
        "✓ 合法 {}/{}，通过率 {:.1}%",
        summary.valid_count,
        summary.total_count,
        summary.pass_rate * 100.0
    );
}

/// 输出未通过结构校验的题目
pub fn log_rejected(rejected: &[RejectedQuestion]) {
    if rejected.is_empty() {
        return;
    }

    log_section(&format!("⚠️ {} 道题目未通过结构校验", rejected.len()));
    for item in rejected {
        info!("题干: {}", truncate_text(&item.question.question, 80));
        for violation in &item.violations {
            info!("  - {}", violation);
        }
    }
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
