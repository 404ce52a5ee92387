use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 学生实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct Student {
    pub id: i64,
    pub usn: String,
    pub name: String,
    pub class_id: i64,
    pub user_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 学生及其所在班级、院系信息
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentDetail {
    pub id: i64,
    pub usn: String,
    pub name: String,
    pub class_id: i64,
    pub semester: i32,
    pub section: String,
    pub department_id: i64,
    pub department_name: String,
}

/// USN 统一为去空白的大写形式
pub fn normalize_usn(usn: &str) -> String {
    usn.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_usn() {
        assert_eq!(normalize_usn(" tve21cs001 "), "TVE21CS001");
        assert_eq!(normalize_usn("CS01"), "CS01");
    }
}
