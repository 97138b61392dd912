//! 结果写出 - 业务能力层
//!
//! 只负责把总分表和明细流水落盘，不关心评分流程。
//! 两个CSV文件独立产出，可选打包为一个 ZIP 方便一次下载。

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use regex::Regex;
use tracing::info;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::error::WriteError;
use crate::models::{AggregateScore, GradeRecord};

/// 一次写出产生的文件路径
#[derive(Debug, Clone)]
pub struct ResultArtifacts {
    /// 总分表（学生ID + 总分）
    pub aggregate_path: PathBuf,
    /// 评分明细流水
    pub detail_path: PathBuf,
    /// 可选的 ZIP 包（包含上面两个文件）
    pub bundle_path: Option<PathBuf>,
}

/// 结果写出服务
pub struct ResultSink {
    output_dir: PathBuf,
    bundle: bool,
}

impl ResultSink {
    /// 创建新的结果写出服务
    pub fn new(output_dir: impl Into<PathBuf>, bundle: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            bundle,
        }
    }

    /// 写出总分表与明细流水，文件名带当前时间戳
    pub fn write(
        &self,
        aggregates: &[AggregateScore],
        records: &[GradeRecord],
        discipline: &str,
        lecture_id: &str,
    ) -> Result<ResultArtifacts, WriteError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        self.write_stamped(aggregates, records, discipline, lecture_id, &timestamp)
    }

    /// 写出到带指定时间戳的文件名（文件名规则见 `artifact_name`）
    pub fn write_stamped(
        &self,
        aggregates: &[AggregateScore],
        records: &[GradeRecord],
        discipline: &str,
        lecture_id: &str,
        timestamp: &str,
    ) -> Result<ResultArtifacts, WriteError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| WriteError::DirCreateFailed {
            path: self.output_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let safe_discipline = sanitize_name(discipline);
        let safe_lecture = sanitize_name(lecture_id);

        let aggregate_path = self.output_dir.join(format!(
            "results_{}_{}_{}.csv",
            safe_discipline, safe_lecture, timestamp
        ));
        let detail_path = self.output_dir.join(format!(
            "log_{}_{}_{}.csv",
            safe_discipline, safe_lecture, timestamp
        ));

        write_aggregate_csv(&aggregate_path, aggregates)?;
        write_detail_csv(&detail_path, records)?;

        info!(
            "✓ 结果已写出: {} / {}",
            aggregate_path.display(),
            detail_path.display()
        );

        let bundle_path = if self.bundle {
            let zip_path = self.output_dir.join(format!(
                "results_{}_{}_{}.zip",
                safe_discipline, safe_lecture, timestamp
            ));
            bundle_files(&zip_path, &[&aggregate_path, &detail_path])?;
            info!("✓ 结果已打包: {}", zip_path.display());
            Some(zip_path)
        } else {
            None
        };

        Ok(ResultArtifacts {
            aggregate_path,
            detail_path,
            bundle_path,
        })
    }
}

/// 文件名安全化：连续的非字母数字字符折叠为一个下划线
pub fn sanitize_name(name: &str) -> String {
    let re = Regex::new(r"\W+").expect("文件名正则非法");
    re.replace_all(name, "_").to_string()
}

/// 从总分表文件名还原 (学科, 讲次编号)
///
/// 识别 `results_{学科}_Lec{N}_{时间戳}` 形式的文件名。
pub fn parse_result_filename(file_name: &str) -> Option<(String, usize)> {
    let re = Regex::new(r"^results_(.*?)_Lec(\d+)_").expect("结果文件名正则非法");
    let caps = re.captures(file_name)?;
    let discipline = caps.get(1)?.as_str().to_string();
    let lecture_number: usize = caps.get(2)?.as_str().parse().ok()?;
    Some((discipline, lecture_number))
}

fn write_aggregate_csv(path: &Path, aggregates: &[AggregateScore]) -> Result<(), WriteError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| WriteError::file_write_failed(path.display().to_string(), e))?;

    writer
        .write_record(["学生ID", "总分"])
        .map_err(|e| WriteError::file_write_failed(path.display().to_string(), e))?;

    for aggregate in aggregates {
        let total = aggregate.total.to_string();
        writer
            .write_record([aggregate.identifier.as_str(), total.as_str()])
            .map_err(|e| WriteError::file_write_failed(path.display().to_string(), e))?;
    }

    writer
        .flush()
        .map_err(|e| WriteError::file_write_failed(path.display().to_string(), e))
}

fn write_detail_csv(path: &Path, records: &[GradeRecord]) -> Result<(), WriteError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| WriteError::file_write_failed(path.display().to_string(), e))?;

    writer
        .write_record(["学生ID", "题号", "题目", "参考答案", "学生答案", "得分"])
        .map_err(|e| WriteError::file_write_failed(path.display().to_string(), e))?;

    for record in records {
        let question_index = record.question_index.to_string();
        let score = record.score.to_string();
        writer
            .write_record([
                record.identifier.as_str(),
                question_index.as_str(),
                record.question.as_str(),
                record.reference_answer.as_str(),
                record.submitted_answer.as_str(),
                score.as_str(),
            ])
            .map_err(|e| WriteError::file_write_failed(path.display().to_string(), e))?;
    }

    writer
        .flush()
        .map_err(|e| WriteError::file_write_failed(path.display().to_string(), e))
}

/// 把若干文件压进一个 ZIP（deflate）
fn bundle_files(zip_path: &Path, files: &[&Path]) -> Result<(), WriteError> {
    let archive_failed = |e: &dyn std::fmt::Display| WriteError::ArchiveFailed {
        path: zip_path.display().to_string(),
        message: e.to_string(),
    };

    let file = File::create(zip_path).map_err(|e| archive_failed(&e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let bytes = std::fs::read(path).map_err(|e| archive_failed(&e))?;

        zip.start_file(name, options).map_err(|e| archive_failed(&e))?;
        zip.write_all(&bytes).map_err(|e| archive_failed(&e))?;
    }

    zip.finish().map_err(|e| archive_failed(&e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_data() -> (Vec<AggregateScore>, Vec<GradeRecord>) {
        let aggregates = vec![
            AggregateScore {
                identifier: "101".to_string(),
                total: 4,
            },
            AggregateScore {
                identifier: "102".to_string(),
                total: 1,
            },
        ];
        let records = vec![GradeRecord {
            identifier: "101".to_string(),
            question_index: 1,
            question: "什么是给水系统".to_string(),
            reference_answer: "建筑内部供水的管道系统".to_string(),
            submitted_answer: "供水管道".to_string(),
            score: 2,
            rationale: "2".to_string(),
        }];
        (aggregates, records)
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("建筑 设备/基础"), "建筑_设备_基础");
        assert_eq!(sanitize_name("Lec01"), "Lec01");
    }

    #[test]
    fn test_parse_result_filename() {
        assert_eq!(
            parse_result_filename("results_建筑设备_Lec03_20250601_120000.csv"),
            Some(("建筑设备".to_string(), 3))
        );
        assert_eq!(parse_result_filename("log_建筑设备_Lec03_x.csv"), None);
    }

    #[test]
    fn test_write_creates_both_files_and_bundle() {
        let dir = tempdir().unwrap();
        let sink = ResultSink::new(dir.path(), true);
        let (aggregates, records) = sample_data();

        let artifacts = sink
            .write_stamped(&aggregates, &records, "建筑设备", "Lec01", "20250601_120000")
            .unwrap();

        assert!(artifacts.aggregate_path.exists());
        assert!(artifacts.detail_path.exists());
        let bundle = artifacts.bundle_path.expect("应产出 ZIP 包");
        assert!(bundle.exists());

        let name = artifacts
            .aggregate_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        assert_eq!(name, "results_建筑设备_Lec01_20250601_120000.csv");
        // 文件名能被合并步骤还原
        assert_eq!(
            parse_result_filename(&name),
            Some(("建筑设备".to_string(), 1))
        );
    }

    #[test]
    fn test_write_without_bundle() {
        let dir = tempdir().unwrap();
        let sink = ResultSink::new(dir.path(), false);
        let (aggregates, records) = sample_data();

        let artifacts = sink
            .write_stamped(&aggregates, &records, "建筑设备", "Lec01", "20250601_120000")
            .unwrap();
        assert!(artifacts.bundle_path.is_none());
    }

    #[test]
    fn test_aggregate_csv_content() {
        let dir = tempdir().unwrap();
        let sink = ResultSink::new(dir.path(), false);
        let (aggregates, records) = sample_data();

        let artifacts = sink
            .write_stamped(&aggregates, &records, "建筑设备", "Lec01", "20250601_120000")
            .unwrap();

        let content = std::fs::read_to_string(&artifacts.aggregate_path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("学生ID,总分"));
        assert_eq!(lines.next(), Some("101,4"));
        assert_eq!(lines.next(), Some("102,1"));
    }
}
