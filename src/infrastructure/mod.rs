//! 基础设施层
//!
//! 持有稀缺资源（成绩册工作簿），只向上暴露能力。

pub mod journal_book;

pub use journal_book::{column_index, JournalBook};
