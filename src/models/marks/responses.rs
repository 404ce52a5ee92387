use super::entities::MarkRecord;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/marks.ts")]
pub struct MarksListResponse {
    pub usn: String,
    pub student_name: String,
    pub items: Vec<MarkRecord>,
}
