use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 成绩记录（已关联课程）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/marks.ts")]
pub struct MarkRecord {
    pub id: i64,
    pub enrollment_id: i64,
    pub course_id: i64,
    pub course_name: String,
    pub assessment: String,
    pub marks: f64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 分数必须为有限的非负数
pub fn is_valid_marks(marks: f64) -> bool {
    marks.is_finite() && marks >= 0.0
}

/// 按课程名、考核名排序
pub fn sort_records(records: &mut [MarkRecord]) {
    records.sort_by(|a, b| {
        a.course_name
            .cmp(&b.course_name)
            .then_with(|| a.assessment.cmp(&b.assessment))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_validation() {
        assert!(is_valid_marks(0.0));
        assert!(is_valid_marks(42.5));
        assert!(!is_valid_marks(-1.0));
        assert!(!is_valid_marks(f64::NAN));
        assert!(!is_valid_marks(f64::INFINITY));
    }
}
