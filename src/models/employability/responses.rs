use super::entities::{
    CategoryInfo, EmployabilityQuestion, EmployabilityResult, LevelInfo,
};
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct CategoryListResponse {
    pub items: Vec<CategoryInfo>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct QuestionSetResponse {
    pub category: String,
    pub questions: Vec<EmployabilityQuestion>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct AssessmentResponse {
    pub result: EmployabilityResult,
    pub employability_level: LevelInfo,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/employability.ts")]
pub struct AssessmentListResponse {
    pub items: Vec<EmployabilityResult>,
}
