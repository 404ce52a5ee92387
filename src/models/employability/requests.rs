use serde::Deserialize;
use std::collections::BTreeMap;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct GenerateQuestionsRequest {
    pub category: String,
}

#[derive(Debug, Clone, Copy, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct AnswerItem {
    pub selected: usize,
    pub correct: usize,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct SubmitAssessmentRequest {
    /// 类别 -> 该类别下每道题的作答
    pub answers: BTreeMap<String, Vec<AnswerItem>>,
}
