//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 评分应用
//! - 管理应用生命周期（初始化、运行、统计）
//! - 持有答案库快照和评分流程
//! - 结果落盘与成绩册合并
//!
//! ### `submission_processor` - 单份答卷处理器
//! - 遍历一份答卷的所有数据行
//! - 行与行串行，行内题目并发
//! - 输出逐行统计
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (一次评分运行)
//!     ↓
//! submission_processor (一份答卷的所有行)
//!     ↓
//! workflow::RowFlow (一行答卷，题目并发)
//!     ↓
//! services (能力层：bank / parser / oracle / sink / merger)
//!     ↓
//! infrastructure (基础设施：JournalBook)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管运行，submission_processor 管单份答卷
//! 2. **资源隔离**：成绩册工作簿只经由 JournalBook 访问
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体评分判断

pub mod batch_processor;
pub mod submission_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use submission_processor::grade_submission;
