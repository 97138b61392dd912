//! 评分结果数据模型

use serde::{Deserialize, Serialize};

/// 单题评分下限
pub const MIN_SCORE: i64 = 0;
/// 单题评分上限
pub const MAX_SCORE: i64 = 2;

/// 单题评分记录
///
/// 每个 (学生答卷行 × 参考题目) 产生一条，生成后不可变。
/// question_index 从 1 开始，显式携带题目身份，
/// 下游据此重排，完成顺序不影响结果。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRecord {
    /// 学生ID
    pub identifier: String,
    /// 题号（1-based）
    pub question_index: usize,
    /// 题目
    pub question: String,
    /// 参考答案
    pub reference_answer: String,
    /// 学生答案
    pub submitted_answer: String,
    /// 得分，范围 [0, 2]
    pub score: i64,
    /// 评分说明（LLM 原始回复或失败原因）
    pub rationale: String,
}

/// 单个学生的总分
///
/// 每个答卷行恰好产生一条；total 是该行所有单题得分的和，
/// 范围 [0, 2N]，N 为所选讲次的题目数。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateScore {
    pub identifier: String,
    pub total: i64,
}

/// 评分运行统计
#[derive(Debug, Default)]
pub struct GradingStats {
    /// 已评分的答卷行数
    pub rows: usize,
    /// 单题评分调用总数
    pub questions: usize,
    /// 被吸收的单题失败数（超时、API 错误等，按 0 分计）
    pub absorbed_failures: usize,
}
