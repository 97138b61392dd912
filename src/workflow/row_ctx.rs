//! 答卷行处理上下文
//!
//! 封装"我正在评哪个学生的答卷"这一信息

use std::fmt::Display;

/// 答卷行处理上下文
///
/// 包含评一行答卷所需的全部上下文信息
#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 学生ID
    pub identifier: String,

    /// 答卷行号（从1开始，仅用于日志显示）
    pub row_index: usize,

    /// 学科
    pub discipline: String,

    /// 讲次编号
    pub lecture_id: String,
}

impl RowCtx {
    /// 创建新的答卷行上下文
    pub fn new(
        identifier: String,
        row_index: usize,
        discipline: String,
        lecture_id: String,
    ) -> Self {
        Self {
            identifier,
            row_index,
            discipline,
            lecture_id,
        }
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[学生#{} 学科#{} 讲次#{}]",
            self.identifier, self.discipline, self.lecture_id
        )
    }
}
