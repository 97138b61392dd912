//! 评分应用 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次评分运行的生命周期和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动运行日志、加载答案库快照、创建评分流程
//! 2. **答卷加载**：解析答卷表格并定位ID列、题目起始列
//! 3. **批量评分**：委托 submission_processor 逐行处理
//! 4. **结果落盘**：总分表 + 明细流水（可选 ZIP 打包）
//! 5. **成绩册合并**：按讲次把总分写入成绩册工作簿
//! 6. **全局统计**：汇总整次运行的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单行答卷的细节
//! - **快照传递**：答案库作为不可变快照显式持有，不做全局缓存
//! - **向下委托**：委托 submission_processor 处理单份答卷

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::SchemaError;
use crate::infrastructure::JournalBook;
use crate::models::{GradingStats, MergeReport, SubmissionTable};
use crate::orchestrator::submission_processor;
use crate::services::journal_merger;
use crate::services::result_sink::parse_result_filename;
use crate::services::submission_parser;
use crate::services::{LlmOracle, ReferenceBank, ResultArtifacts, ResultSink};
use crate::utils::logging::{init_log_file, log_submission_loaded};
use crate::workflow::RowFlow;

/// 应用主结构
pub struct App {
    config: Config,
    bank: ReferenceBank,
    flow: RowFlow,
    sink: ResultSink,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化运行日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        // 加载答案库快照
        let bank = ReferenceBank::load(&config.reference_path)
            .with_context(|| format!("无法加载答案库: {}", config.reference_path))?;

        // 创建评分流程（持有评分服务）
        let oracle = Arc::new(LlmOracle::new(&config));
        let flow = RowFlow::new(oracle, &config);
        let sink = ResultSink::new(&config.output_dir, config.bundle_results);

        Ok(Self {
            config,
            bank,
            flow,
            sink,
        })
    }

    /// 运行应用主逻辑：评分，然后按需合并成绩册
    pub async fn run(&self) -> Result<()> {
        let artifacts = self.grade().await?;

        if self.config.journal_path.is_empty() {
            info!("💡 未配置成绩册路径，跳过合并步骤");
        } else {
            let report = self.merge_results_file(&artifacts.aggregate_path)?;
            log_merge_report(&report);
        }

        Ok(())
    }

    /// 评一份答卷文件，写出结果文件
    pub async fn grade(&self) -> Result<ResultArtifacts> {
        let discipline = &self.config.discipline;
        let lecture_id = &self.config.lecture_id;

        // 加载答卷
        let table = SubmissionTable::load(&self.config.submission_path)
            .with_context(|| format!("无法加载答卷: {}", self.config.submission_path))?;
        if table.is_empty() {
            return Err(SchemaError::EmptyTable.into());
        }

        // 检索本讲次的参考答案（已按题号排序）
        let items = self.bank.select(discipline, lecture_id);

        // 定位ID列；题目起始列只在有题目时才需要
        let id_column = submission_parser::locate_identifier_column(
            &table.headers,
            &self.config.id_column_marker,
        )?;
        let question_start = if items.is_empty() {
            warn!(
                "⚠️ ({}, {}) 下没有参考题目，所有学生将计 0 分",
                discipline, lecture_id
            );
            0
        } else {
            submission_parser::locate_question_start(
                &table.headers,
                &self.config.question_start_marker,
            )?
        };

        log_submission_loaded(table.row_count(), items.len());

        // 逐行评分
        let (aggregates, records, stats) = submission_processor::grade_submission(
            &self.flow,
            &table,
            &items,
            id_column,
            question_start,
            discipline,
            lecture_id,
        )
        .await;

        // 结果落盘
        let artifacts = self
            .sink
            .write(&aggregates, &records, discipline, lecture_id)?;

        print_grading_stats(&stats, &self.config);

        Ok(artifacts)
    }

    /// 把一份总分表文件合并进成绩册
    ///
    /// 讲次编号从文件名还原（`results_{学科}_Lec{N}_…`），
    /// 与交互端"选一个结果文件来合并"的用法一致。
    pub fn merge_results_file(&self, results_path: &Path) -> Result<MergeReport> {
        let file_name = results_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let (_, lecture_number) = parse_result_filename(&file_name)
            .ok_or_else(|| anyhow!("无法从结果文件名解析学科和讲次编号: {}", file_name))?;

        let scores = journal_merger::load_scores_csv(results_path)?;
        self.merge_scores(&scores, lecture_number)
    }

    /// 把 (学生ID -> 总分) 合并进成绩册的指定讲次槽位
    pub fn merge_scores(
        &self,
        scores: &std::collections::HashMap<String, i64>,
        lecture_number: usize,
    ) -> Result<MergeReport> {
        info!(
            "📖 正在合并成绩册: {} (第 {} 讲)",
            self.config.journal_path, lecture_number
        );

        let mut book = JournalBook::open(&self.config.journal_path)?;
        let report = journal_merger::merge(&mut book, scores, lecture_number)?;

        if self.config.journal_output_path.is_empty() {
            book.save()?;
        } else {
            book.save_as(&self.config.journal_output_path)?;
            info!("✓ 合并结果另存至: {}", self.config.journal_output_path);
        }

        Ok(report)
    }

    /// 当前配置对应的讲次编号（"Lec03" -> 3）
    pub fn lecture_number(&self) -> Result<usize> {
        let re = Regex::new(r"\d+").expect("讲次编号正则非法");
        re.find(&self.config.lecture_id)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(|| anyhow!("无法从讲次编号解析数字: {}", self.config.lecture_id))
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 答卷自动评分模式");
    info!("📊 学科: {} / 讲次: {}", config.discipline, config.lecture_id);
    info!("📊 行内并发评分数: {}", config.max_concurrent_scoring);
    info!("{}", "=".repeat(60));
}

fn print_grading_stats(stats: &GradingStats, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 评分完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 答卷行数: {}", stats.rows);
    info!("✅ 单题评分数: {}", stats.questions);
    if stats.absorbed_failures > 0 {
        info!("⚠️ 被吸收的单题失败数（按 0 分计）: {}", stats.absorbed_failures);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);
}

fn log_merge_report(report: &MergeReport) {
    if report.all_matched() {
        info!("✅ {}", report);
    } else {
        // 结果里有、成绩册里没有的学生是数据完整性信号，必须醒目提示
        warn!("⚠️ {}", report);
    }
}
