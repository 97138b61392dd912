//! 答卷数据模型

use std::path::Path;

use crate::error::LoadError;
use crate::models::loaders::{load_table, RawTable};

/// 一份已解析的答卷表格
///
/// 保留原始表头与数据行，列定位（ID列、题目起始列）
/// 由 `services::submission_parser` 在此之上完成。
/// 生命周期：每次上传消费一次，评分后即弃。
#[derive(Debug, Clone)]
pub struct SubmissionTable {
    /// 表头（去除首尾空白）
    pub headers: Vec<String>,
    /// 数据行，行长度允许不一致（导出文件可能被截断）
    pub rows: Vec<Vec<String>>,
}

impl SubmissionTable {
    /// 从表格文件加载答卷
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Ok(load_table(path)?.into())
    }

    /// 数据行数
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<RawTable> for SubmissionTable {
    fn from(table: RawTable) -> Self {
        Self {
            headers: table.headers,
            rows: table.rows,
        }
    }
}
