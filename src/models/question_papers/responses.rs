use super::entities::{PaperTemplate, QuestionPaper};
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct TemplateListResponse {
    pub items: Vec<PaperTemplate>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct QuestionPaperListResponse {
    pub items: Vec<QuestionPaper>,
    pub pagination: PaginationInfo,
}
