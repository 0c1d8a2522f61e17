//! 批量评估 - 流程层
//!
//! 同时发起所有评估调用，等待全部完成后汇总。
//! 结果顺序与输入一致；任意一题失败则整批失败，不返回部分结果。

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::error::AppResult;
use crate::models::evaluation::{BatchResult, Evaluation, EvaluatorKind};
use crate::services::evaluator::{EvaluationItem, Evaluator};

/// 批量评估器
pub struct BatchEvaluator {
    evaluator: Arc<dyn Evaluator>,
    /// 并发上限，None 表示不限
    limiter: Option<Arc<Semaphore>>,
}

impl BatchEvaluator {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            evaluator,
            limiter: None,
        }
    }

    /// 限制同时进行的评估调用数，`None` 或 0 表示不限
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.limiter = limit
            .filter(|n| *n > 0)
            .map(|n| Arc::new(Semaphore::new(n)));
        self
    }

    pub fn kind(&self) -> EvaluatorKind {
        self.evaluator.kind()
    }

    /// 评估全部题目
    pub async fn evaluate_all(&self, items: &[EvaluationItem]) -> AppResult<BatchResult> {
        info!(
            "🧑‍⚖️ 开始{}评估: {} 道题目",
            self.kind().name(),
            items.len()
        );

        let evaluations = try_join_all(
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| self.evaluate_one(idx + 1, item)),
        )
        .await?;

        let result = BatchResult::from_evaluations(evaluations);
        info!(
            "✓ {}评估完成: 平均分 {:.2}，通过 {}/{}",
            self.kind().name(),
            result.average_score,
            result.pass_count,
            result.total()
        );

        Ok(result)
    }

    async fn evaluate_one(&self, index: usize, item: &EvaluationItem) -> AppResult<Evaluation> {
        // 信号量只在本结构体内持有，不会被关闭
        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        self.evaluator.evaluate(item).await.map_err(|e| {
            error!("[题目 {}] ❌ {}评估失败: {}", index, self.kind().name(), e);
            e
        })
    }
}
