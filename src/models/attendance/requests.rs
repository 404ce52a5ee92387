use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceEntry {
    pub usn: String,
    pub present: bool,
}

/// 教师按授课分配批量登记考勤
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct MarkAttendanceRequest {
    pub assignment_id: i64,
    /// YYYY-MM-DD，缺省为今天
    pub date: Option<String>,
    pub entries: Vec<AttendanceEntry>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceSummaryQuery {
    /// 教师与管理员查询指定学生时使用
    pub usn: Option<String>,
    pub course_id: Option<i64>,
}
