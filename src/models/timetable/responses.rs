use super::entities::TimetableEntry;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/timetable.ts")]
pub struct TimetableResponse {
    pub day: Option<String>,
    pub items: Vec<TimetableEntry>,
}
