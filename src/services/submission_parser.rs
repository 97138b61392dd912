//! 答卷解析 - 业务能力层
//!
//! 只负责在任意导出表格中定位ID列和题目列块，并切出答案，
//! 不关心评分流程。

use regex::Regex;
use tracing::debug;

use crate::error::SchemaError;

/// 定位学生ID列
///
/// 扫描表头，返回第一个包含标记子串的列下标。
/// 存在多个匹配时不做区分，取首个。
pub fn locate_identifier_column(headers: &[String], marker: &str) -> Result<usize, SchemaError> {
    headers
        .iter()
        .position(|h| h.contains(marker))
        .ok_or_else(|| SchemaError::IdentifierColumnNotFound {
            marker: marker.to_string(),
        })
}

/// 定位题目起始列
///
/// 两条规则，满足其一即可：
/// - 表头包含配置的标记子串（标记为空串时此规则不生效）
/// - 表头去除首尾空白后以"整数+句点"开头（如 "1. 什么是…"）
pub fn locate_question_start(headers: &[String], marker: &str) -> Result<usize, SchemaError> {
    let numbered = Regex::new(r"^\d+\.").expect("题目序号正则非法");

    let found = headers.iter().position(|h| {
        (!marker.is_empty() && h.contains(marker)) || numbered.is_match(h.trim())
    });

    match found {
        Some(idx) => {
            debug!("题目起始列: {} ('{}')", idx, headers[idx]);
            Ok(idx)
        }
        None => Err(SchemaError::QuestionStartNotFound {
            marker: marker.to_string(),
        }),
    }
}

/// 从数据行切出答案
///
/// 从 start 起取恰好 count 个单元格；行被截断时缺失的位置补空串，
/// 不报错（容忍不完整的导出文件）。
pub fn extract_answers(row: &[String], start: usize, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            row.get(start + i)
                .map(|cell| cell.trim().to_string())
                .unwrap_or_default()
        })
        .collect()
}
