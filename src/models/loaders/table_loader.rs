//! 原始表格加载器
//!
//! 按扩展名自动选择解析方式（.csv / .xlsx / .xls），
//! 统一产出「表头 + 字符串数据行」，供参考答案库和答卷解析复用。

use std::fs::File;
use std::path::Path;

use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use tracing::debug;

use crate::error::LoadError;

/// 原始表格：表头 + 数据行
///
/// 单元格一律以去除首尾空白的字符串表示，空单元格为 ""。
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// 加载表格文件，按扩展名分派
pub fn load_table(path: impl AsRef<Path>) -> Result<RawTable, LoadError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LoadError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "xlsx" | "xls" => load_xlsx(path),
        _ => Err(LoadError::UnsupportedFormat(ext)),
    }
}

/// 加载 CSV 文件
///
/// flexible 模式：允许行长度不一致（被截断的导出文件），
/// 完全空白的行直接跳过。
fn load_csv(path: &Path) -> Result<RawTable, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::read_failed(path.display().to_string(), e))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::read_failed(path.display().to_string(), e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| LoadError::read_failed(path.display().to_string(), e))?;
        let row: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

        if row.iter().all(|v| v.is_empty()) {
            continue;
        }
        rows.push(row);
    }

    debug!("CSV 加载完成: {} ({} 行)", path.display(), rows.len());

    Ok(RawTable { headers, rows })
}

/// 加载 Excel 文件（读取第一个工作表）
fn load_xlsx(path: &Path) -> Result<RawTable, LoadError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e: calamine::XlsxError| {
        LoadError::read_failed(path.display().to_string(), e)
    })?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| LoadError::NoWorksheet(path.display().to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::read_failed(path.display().to_string(), e))?;

    let mut row_iter = range.rows();
    let headers: Vec<String> = row_iter
        .next()
        .map(|header_row| {
            header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut rows = Vec::new();
    for data_row in row_iter {
        let row: Vec<String> = data_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        if row.iter().all(|v| v.is_empty()) {
            continue;
        }
        rows.push(row);
    }

    debug!("Excel 加载完成: {} ({} 行)", path.display(), rows.len());

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_csv(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_csv_basic() {
        let file = temp_csv("学号,姓名,1. 什么是混凝土\n101,张三,一种建筑材料\n102,李四,\n");
        let table = load_table(file.path()).unwrap();

        assert_eq!(table.headers, vec!["学号", "姓名", "1. 什么是混凝土"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["101", "张三", "一种建筑材料"]);
        assert_eq!(table.rows[1], vec!["102", "李四", ""]);
    }

    #[test]
    fn test_load_csv_skips_empty_rows() {
        let file = temp_csv("a,b\n1,2\n,\n3,4\n");
        let table = load_table(file.path()).unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_load_csv_flexible_row_length() {
        let file = temp_csv("a,b,c\n1,2\n");
        let table = load_table(file.path()).unwrap();
        // 截断行原样保留，补齐由上层负责
        assert_eq!(table.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn test_file_not_found() {
        let result = load_table(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(LoadError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"hello").unwrap();
        let result = load_table(file.path());
        assert!(matches!(result, Err(LoadError::UnsupportedFormat(_))));
    }
}
