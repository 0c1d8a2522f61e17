//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 管理应用生命周期：初始化模型与分类体系，按运行模式驱动
//! `QuizFlow`，输出逐题报告与全局统计。
//!
//! ## 层次关系
//!
//! ```text
//! app (按模式运行一次会话)
//!     ↓
//! workflow::QuizFlow (出题 → 解析/校验 → 评估)
//!     ↓                    ↓
//! services (单题能力)   workflow::BatchEvaluator (批量并发评估)
//!     ↓
//! infrastructure (LanguageModel)
//! ```

pub mod app;

pub use app::App;
