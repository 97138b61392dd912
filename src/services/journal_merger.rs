//! 成绩册合并 - 业务能力层
//!
//! 把 (学生ID -> 总分) 写入成绩册工作簿的指定讲次列。
//! 模板布局是固定的：ID在B列，数据从第 8 行开始，
//! 讲次列表共 10 个槽位。写入经过 `JournalBook` 的锚点解析，
//! 合并单元格自动落到左上角。
//!
//! 合并是纯覆盖：相同输入重复执行得到相同的最终值，不累加。

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{CapacityError, LoadError};
use crate::infrastructure::{column_index, JournalBook};
use crate::models::MergeReport;

/// 讲次槽位对应的列字母，第 n 讲写入第 n 个
pub const LECTURE_COLUMNS: [&str; 10] = ["F", "H", "J", "L", "N", "P", "R", "T", "V", "X"];
/// 学生ID所在列
pub const ID_COLUMN: &str = "B";
/// 数据起始行（前面是表头和合并的抬头区域）
pub const DATA_START_ROW: u32 = 8;

/// 把分数合并进成绩册
///
/// 返回的 `MergeReport` 携带更新条数和未匹配的学生ID。
/// 未匹配不是错误：结果里有、成绩册里没有的学生
/// 是数据完整性信号，必须原样上报。
pub fn merge(
    book: &mut JournalBook,
    id_to_score: &HashMap<String, i64>,
    lecture_index: usize,
) -> Result<MergeReport, CapacityError> {
    let target_col = lecture_column(lecture_index)?;

    // 两侧统一规范化后再比较，避免 "123" 与 "123.0" 这类假性不匹配
    let normalized: HashMap<String, i64> = id_to_score
        .iter()
        .map(|(id, &score)| (normalize_identifier(id), score))
        .collect();

    let mut matched: HashSet<String> = HashSet::new();
    let mut updated = 0usize;

    let id_col = column_index(ID_COLUMN);
    let last_row = book.highest_row();

    for row in DATA_START_ROW..=last_row {
        let journal_id = normalize_identifier(&book.cell_text(id_col, row));
        if journal_id.is_empty() {
            continue;
        }

        if let Some(&score) = normalized.get(&journal_id) {
            // 同一ID出现在多行时每一行都更新
            book.write_score(target_col, row, score);
            matched.insert(journal_id);
            updated += 1;
        }
    }

    let mut unmatched: Vec<String> = normalized
        .keys()
        .filter(|id| !matched.contains(*id))
        .cloned()
        .collect();
    unmatched.sort();

    if unmatched.is_empty() {
        info!("✓ 成绩册合并完成: 更新 {} 条，全部学生已匹配", updated);
    } else {
        warn!(
            "⚠️ 成绩册合并完成: 更新 {} 条，{} 个学生ID未找到: {}",
            updated,
            unmatched.len(),
            unmatched.join(", ")
        );
    }

    Ok(MergeReport { updated, unmatched })
}

/// 校验讲次编号并返回目标列号（1-based 列号）
fn lecture_column(lecture_index: usize) -> Result<u32, CapacityError> {
    if lecture_index == 0 || lecture_index > LECTURE_COLUMNS.len() {
        return Err(CapacityError {
            lecture_index,
            capacity: LECTURE_COLUMNS.len(),
        });
    }
    Ok(column_index(LECTURE_COLUMNS[lecture_index - 1]))
}

/// 学生ID的规范形式
///
/// 规则：
/// - 去除首尾空白
/// - 纯数字带 ".0" 小数尾巴的去掉小数部分（电子表格会把数字ID存成浮点）
/// - ASCII 字母统一大写
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();

    let without_fraction = match trimmed.split_once('.') {
        Some((int_part, frac_part))
            if !int_part.is_empty()
                && !frac_part.is_empty()
                && int_part.chars().all(|c| c.is_ascii_digit())
                && frac_part.chars().all(|c| c == '0') =>
        {
            int_part
        }
        _ => trimmed,
    };

    without_fraction.to_ascii_uppercase()
}

/// 从总分表CSV加载 (学生ID -> 总分)
///
/// 第一行是表头；分数解析失败时报错并指明行号。
pub fn load_scores_csv(path: impl AsRef<Path>) -> Result<HashMap<String, i64>, LoadError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LoadError::FileNotFound(path.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| LoadError::read_failed(path.display().to_string(), e))?;

    let mut scores = HashMap::new();
    for (row_idx, result) in reader.records().enumerate() {
        // 表头占第 1 行
        let row_number = row_idx + 2;
        let record = result.map_err(|e| LoadError::read_failed(path.display().to_string(), e))?;

        let identifier = record.get(0).unwrap_or("").trim().to_string();
        let score_text = record.get(1).unwrap_or("").trim();

        if identifier.is_empty() && score_text.is_empty() {
            continue;
        }

        let score: i64 = score_text.parse().map_err(|_| LoadError::InvalidScore {
            row: row_number,
            value: score_text.to_string(),
        })?;

        scores.insert(identifier, score);
    }

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    /// 构造测试用成绩册：ID在B列、数据从第 8 行开始
    fn build_journal(ids: &[(u32, &str)], merges: &[&str]) -> JournalBook {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.xlsx");

        let mut book = umya_spreadsheet::new_file();
        {
            let sheet = book.get_sheet_mut(&0).unwrap();
            sheet.get_cell_mut("A1").set_value("成绩册");
            for &(row, id) in ids {
                sheet.get_cell_mut((2u32, row)).set_value(id);
            }
            for &range in merges {
                sheet.add_merge_cells(range);
            }
        }
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        // tempdir 即将销毁，先读入内存再让目录离开作用域
        let journal = JournalBook::open(&path).unwrap();
        drop(dir);
        journal
    }

    fn scores(pairs: &[(&str, i64)]) -> HashMap<String, i64> {
        pairs
            .iter()
            .map(|&(id, score)| (id.to_string(), score))
            .collect()
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier(" 101 "), "101");
        assert_eq!(normalize_identifier("123.0"), "123");
        assert_eq!(normalize_identifier("123.00"), "123");
        assert_eq!(normalize_identifier("123.5"), "123.5");
        assert_eq!(normalize_identifier("abc101"), "ABC101");
        assert_eq!(normalize_identifier(".0"), ".0");
    }

    #[test]
    fn test_merge_basic_and_unmatched() {
        let mut journal = build_journal(&[(8, "101"), (9, "102"), (10, "103")], &[]);
        let report = merge(&mut journal, &scores(&[("101", 4), ("102", 1), ("999", 7)]), 1).unwrap();

        assert_eq!(report.updated, 2);
        assert_eq!(report.unmatched, vec!["999"]);
        // 第 1 讲写入 F 列
        assert_eq!(journal.cell_text(6, 8), "4");
        assert_eq!(journal.cell_text(6, 9), "1");
        assert_eq!(journal.cell_text(6, 10), "");
    }

    #[test]
    fn test_merge_lecture_column_mapping() {
        let mut journal = build_journal(&[(8, "101")], &[]);
        // 第 2 讲写入 H 列
        merge(&mut journal, &scores(&[("101", 3)]), 2).unwrap();
        assert_eq!(journal.cell_text(8, 8), "3");
        assert_eq!(journal.cell_text(6, 8), "");
    }

    #[test]
    fn test_merge_capacity_error() {
        let mut journal = build_journal(&[(8, "101")], &[]);
        let err = merge(&mut journal, &scores(&[("101", 3)]), 11).unwrap_err();
        assert_eq!(err.lecture_index, 11);
        assert_eq!(err.capacity, 10);

        assert!(merge(&mut journal, &scores(&[("101", 3)]), 0).is_err());
    }

    #[test]
    fn test_merge_into_merged_range_writes_anchor() {
        // F10:F11 是合并区域，ID 在第 11 行，写入必须落到锚点 F10
        let mut journal = build_journal(&[(8, "101"), (11, "103")], &["F10:F11"]);
        let report = merge(&mut journal, &scores(&[("103", 5)]), 1).unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(journal.cell_text(6, 10), "5");
    }

    #[test]
    fn test_merge_duplicate_rows_all_updated() {
        let mut journal = build_journal(&[(8, "101"), (9, "101")], &[]);
        let report = merge(&mut journal, &scores(&[("101", 4)]), 1).unwrap();

        assert_eq!(report.updated, 2);
        assert_eq!(journal.cell_text(6, 8), "4");
        assert_eq!(journal.cell_text(6, 9), "4");
        assert!(report.all_matched());
    }

    #[test]
    fn test_merge_idempotent() {
        let mut journal = build_journal(&[(8, "101"), (9, "102")], &[]);
        let input = scores(&[("101", 4), ("102", 1)]);

        let first = merge(&mut journal, &input, 1).unwrap();
        let after_first = (journal.cell_text(6, 8), journal.cell_text(6, 9));

        let second = merge(&mut journal, &input, 1).unwrap();
        let after_second = (journal.cell_text(6, 8), journal.cell_text(6, 9));

        // 纯覆盖：第二次合并后的值与第一次完全一致
        assert_eq!(after_first, after_second);
        assert_eq!(first.updated, second.updated);
    }

    #[test]
    fn test_merge_normalizes_float_artifact_ids() {
        // 成绩册把数字ID存成了浮点文本
        let mut journal = build_journal(&[(8, "101.0")], &[]);
        let report = merge(&mut journal, &scores(&[("101", 4)]), 1).unwrap();

        assert_eq!(report.updated, 1);
        assert!(report.all_matched());
        assert_eq!(journal.cell_text(6, 8), "4");
    }

    #[test]
    fn test_load_scores_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "学生ID,总分").unwrap();
        writeln!(file, "101,4").unwrap();
        writeln!(file, "102,1").unwrap();

        let scores = load_scores_csv(file.path()).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores["101"], 4);
        assert_eq!(scores["102"], 1);
    }

    #[test]
    fn test_load_scores_csv_invalid_score_reports_row() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "学生ID,总分").unwrap();
        writeln!(file, "101,4").unwrap();
        writeln!(file, "102,四分").unwrap();

        match load_scores_csv(file.path()) {
            Err(LoadError::InvalidScore { row, value }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "四分");
            }
            other => panic!("期望 InvalidScore，实际: {:?}", other.err()),
        }
    }
}
