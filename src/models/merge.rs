//! 成绩册合并结果模型

use std::fmt;

/// 一次成绩册合并的结果
///
/// unmatched 不是错误：结果里有、成绩册里没有的学生ID
/// 是数据完整性信号，必须原样上报给调用方，绝不静默丢弃。
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// 成功写入的单元格数（同一ID出现在多行时每行都计入）
    pub updated: usize,
    /// 在成绩册中没有找到的学生ID（已排序，便于展示与断言）
    pub unmatched: Vec<String>,
}

impl MergeReport {
    /// 是否所有学生都在成绩册中找到了
    pub fn all_matched(&self) -> bool {
        self.unmatched.is_empty()
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all_matched() {
            write!(f, "已更新 {} 条记录，全部学生均已匹配", self.updated)
        } else {
            write!(
                f,
                "已更新 {} 条记录，{} 个学生ID未在成绩册中找到: {}",
                self.updated,
                self.unmatched.len(),
                self.unmatched.join(", ")
            )
        }
    }
}
