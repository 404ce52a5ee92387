use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct SubmitAnswerRequest {
    pub question_id: u32,
    pub answer: String,
    #[serde(default)]
    pub time_spent: f64,
}
