//! # Quiz Forge
//!
//! 用大模型生成知识竞赛题，并用第二个模型评分的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 分类体系、题目、评估结果等数据结构与 TOML 加载
//!
//! ### ② 基础设施层（Infrastructure）
//! - `infrastructure/` - `LanguageModel` 能力接口及 OpenAI 兼容实现
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个题目
//! - `PromptBuilder` - 出题提示词
//! - `GenerationService` - 自由文本 / 结构化出题
//! - `QuestionSchema` - 题目结构校验
//! - `CategoryValidator` - 分类标签校验
//! - `QualityEvaluator` / `CategoryEvaluator` - 评分
//! - `parse_questions` - 自由文本解析
//!
//! ### ④ 流程层（Workflow）
//! - `QuizFlow` - 一次会话的完整流程（出题 → 解析/校验 → 评估）
//! - `BatchEvaluator` - 并发批量评估，保持输入顺序
//!
//! ### ⑤ 编排层（Orchestration）
//! - `App` - 初始化资源，按模式运行并输出报告
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, RunMode};
pub use error::{AppError, AppResult};
pub use infrastructure::{LanguageModel, OpenAiModel};
pub use models::{Grade, QuestionEntry, QuizQuestion, Taxonomy};
pub use orchestrator::App;
pub use workflow::{BatchEvaluator, QuizFlow, SessionReport};
