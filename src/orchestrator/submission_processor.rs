//! 单份答卷处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理一份答卷文件的所有数据行，是答卷级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **遍历数据行**：循环处理答卷的每个学生
//! 2. **流程调度**：复用 `RowFlow`，逐行评分（行与行串行，行内题目并发）
//! 3. **答案对齐**：按参考答案数量切出每行的答案块
//! 4. **统计输出**：记录行数、调用数、被吸收的失败数

use tracing::info;

use crate::models::{AggregateScore, GradeRecord, GradingStats, ReferenceItem, SubmissionTable};
use crate::services::submission_parser;
use crate::workflow::{RowCtx, RowFlow};

/// 评一份答卷的所有行
///
/// # 参数
/// - `flow`: 答卷行评分流程（复用，不重复创建）
/// - `table`: 已解析的答卷表格
/// - `items`: 所选 (学科, 讲次) 的参考答案，已按题号排序
/// - `id_column`: 学生ID列下标
/// - `question_start`: 题目起始列下标
///
/// # 返回
/// 每行恰好一条总分、|items| 条明细记录；本函数不会因单题失败而报错。
pub async fn grade_submission(
    flow: &RowFlow,
    table: &SubmissionTable,
    items: &[ReferenceItem],
    id_column: usize,
    question_start: usize,
    discipline: &str,
    lecture_id: &str,
) -> (Vec<AggregateScore>, Vec<GradeRecord>, GradingStats) {
    let total_rows = table.row_count();
    let mut aggregates = Vec::with_capacity(total_rows);
    let mut records = Vec::with_capacity(total_rows * items.len());
    let mut stats = GradingStats::default();

    // ========== 逐行评分（行与行串行，行内题目并发） ==========
    for (index, row) in table.rows.iter().enumerate() {
        let row_index = index + 1;

        let identifier = row
            .get(id_column)
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default();

        info!(
            "\n🔹 [{}/{}] 开始评分: 学生 {}",
            row_index,
            total_rows,
            if identifier.is_empty() { "(无ID)" } else { identifier.as_str() }
        );

        let answers = submission_parser::extract_answers(row, question_start, items.len());

        let ctx = RowCtx::new(
            identifier,
            row_index,
            discipline.to_string(),
            lecture_id.to_string(),
        );

        let outcome = flow.run(&ctx, items, &answers).await;

        stats.rows += 1;
        stats.questions += outcome.records.len();
        stats.absorbed_failures += outcome.absorbed_failures;

        aggregates.push(outcome.aggregate);
        records.extend(outcome.records);
    }

    (aggregates, records, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    use crate::config::Config;
    use crate::error::OracleError;
    use crate::services::{ScoringOracle, Verdict};

    /// 按答案文本长度给分的假评分服务（1 或 2）
    struct LengthOracle;

    #[async_trait]
    impl ScoringOracle for LengthOracle {
        async fn score(&self, _q: &str, _r: &str, a: &str) -> Result<Verdict, OracleError> {
            let score = if a.chars().count() > 3 { 2 } else { 1 };
            Ok(Verdict {
                score,
                rationale: score.to_string(),
            })
        }
    }

    fn test_items(count: usize) -> Vec<ReferenceItem> {
        (1..=count)
            .map(|i| ReferenceItem {
                discipline: "建筑设备".to_string(),
                lecture_id: "Lec01".to_string(),
                question_id: format!("Q{:03}", i),
                question: format!("问题{}", i),
                answer: format!("参考答案{}", i),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_one_aggregate_per_row_and_full_records() {
        let flow = RowFlow::new(Arc::new(LengthOracle), &Config::default());
        let items = test_items(3);
        let table = SubmissionTable {
            headers: vec![
                "学号".to_string(),
                "1. 问题1".to_string(),
                "2. 问题2".to_string(),
                "3. 问题3".to_string(),
            ],
            rows: vec![
                vec!["101".to_string(), "很长的答案文本".to_string(), "短".to_string(), String::new()],
                // 截断行：缺的题目按空白答案补齐
                vec!["102".to_string(), "短".to_string()],
            ],
        };

        let (aggregates, records, stats) =
            grade_submission(&flow, &table, &items, 0, 1, "建筑设备", "Lec01").await;

        assert_eq!(aggregates.len(), 2);
        assert_eq!(records.len(), 6);
        assert_eq!(stats.rows, 2);
        assert_eq!(stats.questions, 6);

        // 101: 2 + 1 + 0（空白）
        assert_eq!(aggregates[0].identifier, "101");
        assert_eq!(aggregates[0].total, 3);
        // 102: 1 + 0 + 0（截断补空白）
        assert_eq!(aggregates[1].identifier, "102");
        assert_eq!(aggregates[1].total, 1);
    }

    #[tokio::test]
    async fn test_zero_questions_is_valid() {
        let flow = RowFlow::new(Arc::new(LengthOracle), &Config::default());
        let table = SubmissionTable {
            headers: vec!["学号".to_string()],
            rows: vec![vec!["101".to_string()]],
        };

        let (aggregates, records, _) =
            grade_submission(&flow, &table, &[], 0, 0, "建筑设备", "Lec09").await;

        // 零道题也要产出总分行（0 分），不是错误
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].total, 0);
        assert!(records.is_empty());
    }
}
