//! 答卷行评分流程 - 流程层
//!
//! 核心职责：定义"一行答卷"的完整评分流程
//!
//! 流程顺序：
//! 1. 空白答案直接记 0 分（不调用评分服务）
//! 2. 其余题目并发派发给评分服务（信号量限流，每行上限 10 个任务）
//! 3. 全部完成后按题号重排、求和
//!
//! 完成顺序不确定，但聚合结果与顺序无关：总分是可交换的求和，
//! 每条记录显式携带题号，重排后结果确定。
//! 单题失败（超时、API 错误、任务崩溃）一律吸收为 0 分记录，
//! 本流程永不失败：一行答卷总是产出恰好 N 条记录和一条总分。

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::OracleError;
use crate::models::{AggregateScore, GradeRecord, ReferenceItem};
use crate::services::ScoringOracle;
use crate::utils::logging::truncate_text;
use crate::workflow::row_ctx::RowCtx;

/// 空白答案的评分说明
const EMPTY_ANSWER_RATIONALE: &str = "空白答案";

/// 一行答卷的评分产出
#[derive(Debug)]
pub struct RowOutcome {
    /// 该学生的总分
    pub aggregate: AggregateScore,
    /// 按题号升序的单题记录，恰好 min(题目数, 答案数) 条
    pub records: Vec<GradeRecord>,
    /// 被吸收的单题失败数（按 0 分计入记录）
    pub absorbed_failures: usize,
}

/// 答卷行评分流程
///
/// - 编排一行答卷的并发评分
/// - 只依赖评分能力（ScoringOracle）
/// - 不持有任何资源（工作簿）
pub struct RowFlow {
    oracle: Arc<dyn ScoringOracle>,
    max_concurrent: usize,
    verbose_logging: bool,
}

impl RowFlow {
    /// 创建新的答卷行评分流程
    pub fn new(oracle: Arc<dyn ScoringOracle>, config: &Config) -> Self {
        Self {
            oracle,
            // 限流下限 1，避免配置成 0 把整行卡死
            max_concurrent: config.max_concurrent_scoring.max(1),
            verbose_logging: config.verbose_logging,
        }
    }

    /// 评一行答卷
    ///
    /// 题目数以参考答案为准，超出参考答案范围的题号从不派发。
    pub async fn run(
        &self,
        ctx: &RowCtx,
        items: &[ReferenceItem],
        answers: &[String],
    ) -> RowOutcome {
        let count = items.len().min(answers.len());
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let mut records: Vec<GradeRecord> = Vec::with_capacity(count);
        let mut handles = Vec::new();
        let mut absorbed_failures = 0usize;

        for i in 0..count {
            let question_index = i + 1;
            let item = &items[i];
            let answer = &answers[i];

            // 空白答案直接记 0 分，不占用评分服务
            if answer.trim().is_empty() {
                records.push(make_record(
                    ctx,
                    question_index,
                    item,
                    answer,
                    0,
                    EMPTY_ANSWER_RATIONALE.to_string(),
                ));
                continue;
            }

            let oracle = Arc::clone(&self.oracle);
            let permit_source = Arc::clone(&semaphore);
            let question = item.question.clone();
            let reference_answer = item.answer.clone();
            let submitted_answer = answer.clone();

            let handle = tokio::spawn(async move {
                // 信号量在整个评分期间不会被关闭
                let _permit = permit_source.acquire_owned().await.ok();
                let verdict = oracle
                    .score(&question, &reference_answer, &submitted_answer)
                    .await;
                (question_index, verdict)
            });
            handles.push((question_index, handle));
        }

        // 等待本行所有评分任务完成（先完成先收取，顺序不定）
        let (indexes, tasks): (Vec<usize>, Vec<_>) = handles.into_iter().unzip();
        let joined = futures::future::join_all(tasks).await;

        for (question_index, joined_result) in indexes.into_iter().zip(joined) {
            let item = &items[question_index - 1];
            let answer = &answers[question_index - 1];

            let (score, rationale) = match joined_result {
                Ok((_, Ok(verdict))) => (verdict.score, verdict.rationale),
                Ok((_, Err(e))) => {
                    // 单题失败吸收为 0 分，错误文本进评分说明
                    absorbed_failures += 1;
                    log_absorbed(ctx, question_index, &e);
                    (0, e.to_string())
                }
                Err(e) => {
                    absorbed_failures += 1;
                    error!("{} 题目 {} 评分任务异常: {}", ctx, question_index, e);
                    (0, format!("评分任务异常: {}", e))
                }
            };

            if self.verbose_logging {
                debug!(
                    "{} 题目 {}: {} 分 (答案: {})",
                    ctx,
                    question_index,
                    score,
                    truncate_text(answer, 40)
                );
            }

            records.push(make_record(ctx, question_index, item, answer, score, rationale));
        }

        // 按题号重排，消除完成顺序的影响
        records.sort_by_key(|r| r.question_index);

        let total: i64 = records.iter().map(|r| r.score).sum();

        info!(
            "{} ✓ 评分完成: 共 {} 题，总分 {}",
            ctx,
            records.len(),
            total
        );

        RowOutcome {
            aggregate: AggregateScore {
                identifier: ctx.identifier.clone(),
                total,
            },
            records,
            absorbed_failures,
        }
    }
}

fn make_record(
    ctx: &RowCtx,
    question_index: usize,
    item: &ReferenceItem,
    answer: &str,
    score: i64,
    rationale: String,
) -> GradeRecord {
    GradeRecord {
        identifier: ctx.identifier.clone(),
        question_index,
        question: item.question.clone(),
        reference_answer: item.answer.clone(),
        submitted_answer: answer.to_string(),
        score,
        rationale,
    }
}

fn log_absorbed(ctx: &RowCtx, question_index: usize, e: &OracleError) {
    tracing::warn!("{} ⚠️ 题目 {} 评分失败，按 0 分处理: {}", ctx, question_index, e);
}
