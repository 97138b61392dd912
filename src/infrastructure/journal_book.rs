//! 成绩册工作簿 - 基础设施层
//!
//! 唯一的 workbook owner，只暴露能力：读单元格、写分数、保存。
//! 工作簿整体载入内存、就地修改、一次性写回，没有增量写入路径。
//!
//! 合并单元格只有左上角锚点承载值，写入落在合并区域内的坐标
//! 必须改写到锚点。锚点索引在打开时一次性预计算，
//! 写入阶段不再线性扫描合并区域列表。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use umya_spreadsheet::{reader, writer, Spreadsheet, Worksheet};

use crate::error::{LoadError, WriteError};

/// 成绩册工作簿
pub struct JournalBook {
    book: Spreadsheet,
    path: PathBuf,
    /// (列, 行) -> 合并区域锚点 (列, 行)，均为 1-based
    merge_anchor: HashMap<(u32, u32), (u32, u32)>,
}

impl JournalBook {
    /// 打开成绩册工作簿（使用第一个工作表）
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LoadError::FileNotFound(path.display().to_string()));
        }

        let book = reader::xlsx::read(path)
            .map_err(|e| LoadError::read_failed(path.display().to_string(), e))?;

        let sheet = book
            .get_sheet(&0)
            .ok_or_else(|| LoadError::NoWorksheet(path.display().to_string()))?;

        let merge_anchor = build_merge_index(sheet);
        debug!(
            "成绩册已载入: {} (合并区域覆盖 {} 个单元格)",
            path.display(),
            merge_anchor.len()
        );

        Ok(Self {
            book,
            path: path.to_path_buf(),
            merge_anchor,
        })
    }

    /// 最后一个有数据的行号（1-based）
    pub fn highest_row(&self) -> u32 {
        self.sheet().get_highest_row()
    }

    /// 读取单元格文本（空单元格返回空字符串）
    pub fn cell_text(&self, col: u32, row: u32) -> String {
        self.sheet().get_value((col, row))
    }

    /// 解析 (列, 行) 的实际写入目标
    ///
    /// 坐标落在合并区域内时返回该区域的左上角锚点，否则原样返回。
    pub fn anchor_of(&self, col: u32, row: u32) -> (u32, u32) {
        self.merge_anchor
            .get(&(col, row))
            .copied()
            .unwrap_or((col, row))
    }

    /// 把分数写入 (列, 行)，自动改写到合并区域锚点
    pub fn write_score(&mut self, col: u32, row: u32, value: i64) {
        let (target_col, target_row) = self.anchor_of(col, row);
        self.book
            .get_sheet_mut(&0)
            .expect("工作表在打开时已校验存在")
            .get_cell_mut((target_col, target_row))
            .set_value_number(value as f64);
    }

    /// 覆盖保存回原路径
    pub fn save(&self) -> Result<(), WriteError> {
        self.save_as(&self.path)
    }

    /// 另存为指定路径
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<(), WriteError> {
        let path = path.as_ref();
        writer::xlsx::write(&self.book, path).map_err(|e| WriteError::BookSaveFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn sheet(&self) -> &Worksheet {
        self.book
            .get_sheet(&0)
            .expect("工作表在打开时已校验存在")
    }
}

/// 预计算合并区域锚点索引
fn build_merge_index(sheet: &Worksheet) -> HashMap<(u32, u32), (u32, u32)> {
    let mut index = HashMap::new();

    for range in sheet.get_merge_cells() {
        let Some(((min_col, min_row), (max_col, max_row))) = parse_range(&range.get_range())
        else {
            continue;
        };

        for col in min_col..=max_col {
            for row in min_row..=max_row {
                index.insert((col, row), (min_col, min_row));
            }
        }
    }

    index
}

/// 把列字母转为 1-based 列号（"A" -> 1, "B" -> 2, "AA" -> 27）
pub fn column_index(letters: &str) -> u32 {
    letters
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .fold(0u32, |acc, c| {
            acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)
        })
}

/// 解析单元格引用 "F10" -> (6, 10)
fn parse_cell_ref(cell: &str) -> Option<(u32, u32)> {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits: String = cell.chars().skip_while(|c| c.is_ascii_alphabetic()).collect();

    if letters.is_empty() || digits.is_empty() {
        return None;
    }

    let row: u32 = digits.parse().ok()?;
    Some((column_index(&letters), row))
}

/// 解析区域引用 "F10:G11" -> ((6,10), (7,11))；单格引用 "F10" 也接受
fn parse_range(range: &str) -> Option<((u32, u32), (u32, u32))> {
    match range.split_once(':') {
        Some((start, end)) => {
            let start = parse_cell_ref(start)?;
            let end = parse_cell_ref(end)?;
            Some((start, end))
        }
        None => {
            let cell = parse_cell_ref(range)?;
            Some((cell, cell))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A"), 1);
        assert_eq!(column_index("B"), 2);
        assert_eq!(column_index("F"), 6);
        assert_eq!(column_index("X"), 24);
        assert_eq!(column_index("AA"), 27);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("F10:G11"), Some(((6, 10), (7, 11))));
        assert_eq!(parse_range("F10"), Some(((6, 10), (6, 10))));
        assert_eq!(parse_range(""), None);
    }

    #[test]
    fn test_open_missing_file() {
        let result = JournalBook::open("no_such_journal.xlsx");
        assert!(matches!(result, Err(LoadError::FileNotFound(_))));
    }

    #[test]
    fn test_merged_write_lands_on_anchor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.xlsx");

        // 构造一个带合并区域 F10:F11 的工作簿
        let mut book = umya_spreadsheet::new_file();
        {
            let sheet = book.get_sheet_mut(&0).unwrap();
            sheet.get_cell_mut((2u32, 10u32)).set_value("101");
            sheet.add_merge_cells("F10:F11");
        }
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let mut journal = JournalBook::open(&path).unwrap();
        assert_eq!(journal.anchor_of(6, 11), (6, 10));
        assert_eq!(journal.anchor_of(6, 10), (6, 10));
        assert_eq!(journal.anchor_of(7, 10), (7, 10));

        // 写在合并区域的下半格，值必须落到锚点 F10
        journal.write_score(6, 11, 7);
        assert_eq!(journal.cell_text(6, 10), "7");

        journal.save().unwrap();
        let reopened = JournalBook::open(&path).unwrap();
        assert_eq!(reopened.cell_text(6, 10), "7");
    }
}
