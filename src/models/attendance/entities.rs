use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceDetail {
    pub date: String,
    pub present: bool,
}

/// 单门课程的考勤汇总
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct CourseAttendanceSummary {
    pub course_id: i64,
    pub course_name: String,
    pub present_days: i64,
    pub total_days: i64,
    pub percentage: f64,
    pub details: Vec<AttendanceDetail>,
}

/// 出勤率（百分比，保留两位小数），无记录时为 0
pub fn attendance_percentage(present: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (present as f64 * 100.0 / total as f64 * 100.0).round() / 100.0
}

impl CourseAttendanceSummary {
    /// 由一门课程的全部考勤明细构建汇总，明细按日期倒序
    pub fn from_details(
        course_id: i64,
        course_name: String,
        mut details: Vec<AttendanceDetail>,
    ) -> Self {
        details.sort_by(|a, b| b.date.cmp(&a.date));
        let total_days = details.len() as i64;
        let present_days = details.iter().filter(|d| d.present).count() as i64;
        Self {
            course_id,
            course_name,
            present_days,
            total_days,
            percentage: attendance_percentage(present_days, total_days),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(date: &str, present: bool) -> AttendanceDetail {
        AttendanceDetail {
            date: date.to_string(),
            present,
        }
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(attendance_percentage(2, 3), 66.67);
        assert_eq!(attendance_percentage(1, 3), 33.33);
        assert_eq!(attendance_percentage(3, 3), 100.0);
        assert_eq!(attendance_percentage(0, 0), 0.0);
    }

    #[test]
    fn test_summary_orders_details_newest_first() {
        let summary = CourseAttendanceSummary::from_details(
            7,
            "Operating Systems".into(),
            vec![
                detail("2025-01-02", true),
                detail("2025-01-10", false),
                detail("2025-01-05", true),
            ],
        );
        assert_eq!(summary.present_days, 2);
        assert_eq!(summary.total_days, 3);
        assert_eq!(summary.percentage, 66.67);
        assert_eq!(summary.details[0].date, "2025-01-10");
        assert_eq!(summary.details[2].date, "2025-01-02");
    }
}
