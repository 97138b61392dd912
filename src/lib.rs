//! # Grade Answer Merge
//!
//! 一个基于 LLM 的开放题答卷自动评分与成绩册合并工具
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（成绩册工作簿），只暴露能力
//! - `JournalBook` - 唯一的 workbook owner，提供单元格读写与锚点解析能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个条目
//! - `ReferenceBank` - 参考答案库快照（加载 / 检索）
//! - `submission_parser` - 答卷列定位与答案切块
//! - `ScoringOracle` / `LlmOracle` - 单题评分能力
//! - `ResultSink` - 结果文件写出能力
//! - `journal_merger` - 成绩册合并能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一行答卷"的完整评分流程
//! - `RowCtx` - 上下文封装（学生ID + 行号 + 学科/讲次）
//! - `RowFlow` - 流程编排（空白短路 → 并发评分 → 按题号重排 → 求和）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 评分应用，管理资源和生命周期
//! - `orchestrator/submission_processor` - 单份答卷处理器，遍历数据行
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
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::JournalBook;
pub use models::{AggregateScore, GradeRecord, MergeReport, ReferenceItem, SubmissionTable};
pub use orchestrator::App;
pub use services::{LlmOracle, ReferenceBank, ResultSink, ScoringOracle, Verdict};
pub use workflow::{RowCtx, RowFlow};
