use super::entities::{DifficultyDistribution, QuestionEdit, TemplateSection};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

// 创建模板请求，也用于生成时的内联模板
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct CreateTemplateRequest {
    pub name: String,
    pub institution: String,
    pub course: String,
    pub subject: String,
    pub total_marks: i32,
    pub duration_minutes: i32,
    pub sections: Vec<TemplateSection>,
}

impl CreateTemplateRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Template name is required".to_string());
        }
        if self.subject.trim().is_empty() {
            return Err("Subject is required".to_string());
        }
        if self.sections.is_empty() {
            return Err("Please define at least one section".to_string());
        }
        for section in &self.sections {
            if section.name.trim().is_empty() {
                return Err("Section name is required".to_string());
            }
            if section.num_questions == 0 {
                return Err(format!(
                    "Section '{}' must have at least one question",
                    section.name
                ));
            }
            if !section.marks_per_question.is_finite() || section.marks_per_question < 0.0 {
                return Err(format!("Section '{}' has invalid marks", section.name));
            }
        }
        if self.total_marks < 0 || self.duration_minutes < 0 {
            return Err("Total marks and duration must not be negative".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct QuestionPaperQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub template_id: Option<i64>,
}

// 试卷列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct QuestionPaperListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub generated_by: Option<i64>,
    pub template_id: Option<i64>,
}

/// 生成参数（来自 multipart 表单的非文件字段）
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub template_id: Option<i64>,
    pub template: Option<CreateTemplateRequest>,
    pub difficulty: DifficultyDistribution,
}

// 编辑试卷：部分名 -> 题目下标 -> 修改内容
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question_paper.ts")]
pub struct PaperEditRequest {
    pub sections: HashMap<String, BTreeMap<usize, QuestionEdit>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question_papers::entities::SectionType;

    fn template() -> CreateTemplateRequest {
        CreateTemplateRequest {
            name: "Series Test".to_string(),
            institution: "KTU".to_string(),
            course: "B.Tech".to_string(),
            subject: "Thermodynamics".to_string(),
            total_marks: 100,
            duration_minutes: 180,
            sections: vec![TemplateSection {
                name: "Part A".to_string(),
                section_type: SectionType::ShortAnswer,
                num_questions: 10,
                marks_per_question: 3.0,
            }],
        }
    }

    #[test]
    fn test_template_validation() {
        assert!(template().validate().is_ok());

        let mut empty = template();
        empty.sections.clear();
        assert!(empty.validate().is_err());

        let mut zero = template();
        zero.sections[0].num_questions = 0;
        assert!(zero.validate().is_err());

        let mut negative = template();
        negative.sections[0].marks_per_question = -1.0;
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_edit_request_deserialize() {
        let req: PaperEditRequest = serde_json::from_str(
            r#"{"sections":{"Part A":{"0":{"text":"New","difficulty":"hard"}}}}"#,
        )
        .unwrap();
        let edit = &req.sections["Part A"][&0];
        assert_eq!(edit.text.as_deref(), Some("New"));
        assert!(edit.marks.is_none());
    }
}
