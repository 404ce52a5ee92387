use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 送入模型摘要的文本上限（字符数）
pub const SUMMARY_INPUT_LIMIT: usize = 6000;

// 学习资料实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/material.ts")]
pub struct StudyMaterial {
    pub id: i64,
    pub title: String,
    pub course_id: Option<i64>,
    pub file_token: String,
    pub summary: String,
    pub created_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 截取前 `limit` 个字符（按字符而非字节）
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        // 多字节字符不会被截断在中间
        assert_eq!(truncate_chars("ααββ", 3), "ααβ");
    }
}
