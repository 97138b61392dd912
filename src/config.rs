use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 单个学生答卷内的并发评分任务数
    pub max_concurrent_scoring: usize,
    /// 单次评分调用的超时时间（秒），超时按 0 分处理
    pub oracle_timeout_secs: u64,
    /// 参考答案库文件路径（.xlsx/.csv）
    pub reference_path: String,
    /// 待评分的答卷CSV文件路径
    pub submission_path: String,
    /// 评分使用的学科名称
    pub discipline: String,
    /// 评分使用的讲次编号（形如 Lec01）
    pub lecture_id: String,
    /// 成绩册工作簿路径（为空则跳过合并步骤）
    pub journal_path: String,
    /// 合并后成绩册的另存路径（为空则覆盖原文件）
    pub journal_output_path: String,
    /// 学生ID列的表头标记子串
    pub id_column_marker: String,
    /// 题目起始列的表头标记子串（留空则只按 "1." 前缀识别）
    pub question_start_marker: String,
    /// 结果文件输出目录
    pub output_dir: String,
    /// 是否把两个结果文件打包成一个 ZIP
    pub bundle_results: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_scoring: 10,
            oracle_timeout_secs: 60,
            reference_path: "data/base_questions.xlsx".to_string(),
            submission_path: "data/submissions.csv".to_string(),
            discipline: String::new(),
            lecture_id: String::new(),
            journal_path: String::new(),
            journal_output_path: String::new(),
            id_column_marker: "学号".to_string(),
            question_start_marker: String::new(),
            output_dir: "temp".to_string(),
            bundle_results: true,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            llm_api_key: "ollama".to_string(),
            llm_api_base_url: "http://localhost:11434/v1".to_string(),
            llm_model_name: "mistral".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_scoring: std::env::var("MAX_CONCURRENT_SCORING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_scoring),
            oracle_timeout_secs: std::env::var("ORACLE_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.oracle_timeout_secs),
            reference_path: std::env::var("REFERENCE_PATH").unwrap_or(default.reference_path),
            submission_path: std::env::var("SUBMISSION_PATH").unwrap_or(default.submission_path),
            discipline: std::env::var("DISCIPLINE").unwrap_or(default.discipline),
            lecture_id: std::env::var("LECTURE_ID").unwrap_or(default.lecture_id),
            journal_path: std::env::var("JOURNAL_PATH").unwrap_or(default.journal_path),
            journal_output_path: std::env::var("JOURNAL_OUTPUT_PATH").unwrap_or(default.journal_output_path),
            id_column_marker: std::env::var("ID_COLUMN_MARKER").unwrap_or(default.id_column_marker),
            question_start_marker: std::env::var("QUESTION_START_MARKER").unwrap_or(default.question_start_marker),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            bundle_results: std::env::var("BUNDLE_RESULTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.bundle_results),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }

    /// 从 TOML 配置文件加载，缺省字段回退到默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_bounds() {
        let config = Config::default();
        assert_eq!(config.max_concurrent_scoring, 10);
        assert_eq!(config.oracle_timeout_secs, 60);
        assert!(config.bundle_results);
    }

    #[test]
    fn test_from_toml_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "discipline = \"建筑设备\"").unwrap();
        writeln!(file, "lecture_id = \"Lec03\"").unwrap();
        writeln!(file, "max_concurrent_scoring = 4").unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.discipline, "建筑设备");
        assert_eq!(config.lecture_id, "Lec03");
        assert_eq!(config.max_concurrent_scoring, 4);
        // 未指定的字段保持默认
        assert_eq!(config.oracle_timeout_secs, 60);
    }

    #[test]
    fn test_from_toml_file_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_concurrent_scoring = \"not a number\"").unwrap();

        assert!(Config::from_toml_file(file.path()).is_err());
    }
}
