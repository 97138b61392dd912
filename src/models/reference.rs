//! 参考答案数据模型

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 讲次编号的合法格式，形如 Lec01
pub const LECTURE_ID_PATTERN: &str = r"^Lec\d{2}$";
/// 题目编号的合法格式，形如 Q001
pub const QUESTION_ID_PATTERN: &str = r"^Q\d{3}$";

/// 单条参考答案
///
/// (discipline, lecture_id, question_id) 是唯一键。
/// 同一 (discipline, lecture_id) 组内按 question_id 升序排列，
/// 该顺序决定了与答卷题目列的位置对齐。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub discipline: String,
    pub lecture_id: String,
    pub question_id: String,
    pub question: String,
    pub answer: String,
}

/// 构建讲次编号校验用的正则
pub fn lecture_id_regex() -> Regex {
    Regex::new(LECTURE_ID_PATTERN).expect("讲次编号正则非法")
}

/// 构建题目编号校验用的正则
pub fn question_id_regex() -> Regex {
    Regex::new(QUESTION_ID_PATTERN).expect("题目编号正则非法")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lecture_id_pattern() {
        let re = lecture_id_regex();
        assert!(re.is_match("Lec01"));
        assert!(re.is_match("Lec99"));
        assert!(!re.is_match("Lec1"));
        assert!(!re.is_match("lec01"));
        assert!(!re.is_match("Lec001"));
    }

    #[test]
    fn test_question_id_pattern() {
        let re = question_id_regex();
        assert!(re.is_match("Q001"));
        assert!(re.is_match("Q123"));
        assert!(!re.is_match("Q1"));
        assert!(!re.is_match("q001"));
        assert!(!re.is_match("Q0001"));
    }
}
