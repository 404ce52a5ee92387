use super::entities::CourseAttendanceSummary;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct MarkAttendanceResponse {
    pub session_id: i64,
    pub course_id: i64,
    pub date: String,
    pub marked: usize,
    pub unknown_usns: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceSummaryResponse {
    pub usn: String,
    pub student_name: String,
    pub minimum_percentage: f64,
    pub courses: Vec<CourseAttendanceSummary>,
}
