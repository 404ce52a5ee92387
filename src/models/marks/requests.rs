use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/marks.ts")]
pub struct RecordMarksRequest {
    pub usn: String,
    pub course_id: i64,
    pub assessment: String,
    pub marks: f64,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/marks.ts")]
pub struct MarksQuery {
    /// 教师与管理员查询指定学生时使用
    pub usn: Option<String>,
    pub course_id: Option<i64>,
}
