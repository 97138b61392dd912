//! 参考答案库 - 业务能力层
//!
//! 只负责"加载与检索参考答案"能力，不关心流程。
//!
//! 答案库是显式传递的不可变快照：加载得到一份完整数据，
//! 需要最新数据时调用 `reload()` 换一份新快照，
//! 没有进程级的全局缓存可言。

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::LoadError;
use crate::models::loaders::load_table;
use crate::models::reference::{lecture_id_regex, question_id_regex, ReferenceItem};

/// 答案库必需的列（按此顺序检查）
const REQUIRED_COLUMNS: [&str; 5] = [
    "Discipline",
    "Lecture_ID",
    "Question_ID",
    "Question",
    "Answer",
];

/// 参考答案库快照
///
/// 职责：
/// - 从表格文件加载并校验参考答案
/// - 按 (学科, 讲次) 检索，按题目编号排序
/// - 不出现评分逻辑
/// - 不关心流程顺序
#[derive(Debug, Clone)]
pub struct ReferenceBank {
    source: PathBuf,
    items: Vec<ReferenceItem>,
}

impl ReferenceBank {
    /// 从表格文件加载答案库
    ///
    /// 缺少必需列、编号格式非法都会在这里报错并指明出错的行，
    /// 而不是等到评分阶段才暴露。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let table = load_table(path)?;

        // 定位必需列
        let mut column_indexes = [0usize; REQUIRED_COLUMNS.len()];
        let mut missing = Vec::new();
        for (i, name) in REQUIRED_COLUMNS.iter().enumerate() {
            match table.headers.iter().position(|h| h == name) {
                Some(idx) => column_indexes[i] = idx,
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns {
                missing,
                found: table.headers.clone(),
            });
        }

        let [disc_idx, lec_idx, qid_idx, question_idx, answer_idx] = column_indexes;

        let lecture_re = lecture_id_regex();
        let question_re = question_id_regex();

        let mut items = Vec::with_capacity(table.rows.len());
        for (row_idx, row) in table.rows.iter().enumerate() {
            // 表头占第 1 行，数据从第 2 行开始
            let row_number = row_idx + 2;
            let cell = |idx: usize| row.get(idx).cloned().unwrap_or_default();

            let lecture_id = cell(lec_idx);
            if !lecture_re.is_match(&lecture_id) {
                return Err(LoadError::InvalidId {
                    row: row_number,
                    field: "Lecture_ID".to_string(),
                    value: lecture_id,
                    expected: "Lec01".to_string(),
                });
            }

            let question_id = cell(qid_idx);
            if !question_re.is_match(&question_id) {
                return Err(LoadError::InvalidId {
                    row: row_number,
                    field: "Question_ID".to_string(),
                    value: question_id,
                    expected: "Q001".to_string(),
                });
            }

            items.push(ReferenceItem {
                discipline: cell(disc_idx),
                lecture_id,
                question_id,
                question: cell(question_idx),
                answer: cell(answer_idx),
            });
        }

        info!("✓ 答案库加载完成: {} 条参考答案", items.len());

        Ok(Self {
            source: path.to_path_buf(),
            items,
        })
    }

    /// 重新从源文件加载，返回一份新快照
    pub fn reload(&self) -> Result<Self, LoadError> {
        Self::load(&self.source)
    }

    /// 检索 (学科, 讲次) 下的参考答案，按题目编号升序
    ///
    /// 空结果是合法的（该讲次没有题目），不是错误。
    pub fn select(&self, discipline: &str, lecture_id: &str) -> Vec<ReferenceItem> {
        let mut selected: Vec<ReferenceItem> = self
            .items
            .iter()
            .filter(|item| item.discipline == discipline && item.lecture_id == lecture_id)
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        selected
    }

    /// 库中出现过的学科列表（去重，保持首次出现顺序）
    pub fn disciplines(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for item in &self.items {
            if !seen.contains(&item.discipline) {
                seen.push(item.discipline.clone());
            }
        }
        seen
    }

    /// 某学科下出现过的讲次列表（去重，保持首次出现顺序）
    pub fn lectures(&self, discipline: &str) -> Vec<String> {
        let mut seen = Vec::new();
        for item in &self.items {
            if item.discipline == discipline && !seen.contains(&item.lecture_id) {
                seen.push(item.lecture_id.clone());
            }
        }
        seen
    }

    /// 全部条目数
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
