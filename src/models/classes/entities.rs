use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 班级实体：院系 + 学期 + 分班
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct Class {
    pub id: i64,
    pub department_id: i64,
    pub semester: i32,
    pub section: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// KTU 本科学期范围
pub const MIN_SEMESTER: i32 = 1;
pub const MAX_SEMESTER: i32 = 8;

pub fn is_valid_semester(semester: i32) -> bool {
    (MIN_SEMESTER..=MAX_SEMESTER).contains(&semester)
}

/// 分班名统一为大写并去除空白
pub fn normalize_section(section: &str) -> String {
    section.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semester_bounds() {
        assert!(is_valid_semester(1));
        assert!(is_valid_semester(8));
        assert!(!is_valid_semester(0));
        assert!(!is_valid_semester(9));
    }

    #[test]
    fn test_normalize_section() {
        assert_eq!(normalize_section(" a "), "A");
        assert_eq!(normalize_section("b2"), "B2");
    }
}
