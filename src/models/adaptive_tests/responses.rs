use super::entities::{QuestionView, TestSessionSummary};
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct CurrentQuestionResponse {
    pub completed: bool,
    pub question: Option<QuestionView>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct AnswerResultResponse {
    pub question_id: u32,
    pub correct: bool,
    pub explanation: String,
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct TestSessionListResponse {
    pub items: Vec<TestSessionSummary>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/adaptive_test.ts")]
pub struct TestCreatedResponse {
    pub id: i64,
    pub total_questions: i32,
    pub question: Option<QuestionView>,
}
