//! 试卷生成：模板管理、按大纲生成、编辑与导出 PDF

pub mod generate;
pub mod generator;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header, web};

use crate::errors::CampusError;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    question_papers::{
        entities::QuestionPaper,
        requests::{
            CreateTemplateRequest, PaperEditRequest, QuestionPaperListQuery,
            QuestionPaperQueryParams,
        },
        responses::TemplateListResponse,
    },
    users::entities::{User, UserRole},
};
use crate::services::{error_response, forbidden, unauthorized};
use crate::utils::pdf::render_question_paper;

define_service!(QuestionPaperService);

pub(crate) fn template_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::TemplateNotFound,
        "Template not found",
    ))
}

fn paper_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::QuestionPaperNotFound,
        "Question paper not found",
    ))
}

fn owns_paper(actor: &User, paper: &QuestionPaper) -> bool {
    paper.generated_by == actor.id
}

impl QuestionPaperService {
    pub async fn create_template(
        &self,
        request: &HttpRequest,
        req: CreateTemplateRequest,
    ) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        if let Err(msg) = req.validate() {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::TemplateInvalid, msg)));
        }

        match self.get_storage(request).create_template(req, actor.id).await {
            Ok(template) => Ok(HttpResponse::Created()
                .json(ApiResponse::success(template, "Template created successfully"))),
            Err(e) => Ok(error_response(&e, "Failed to create template")),
        }
    }

    pub async fn list_templates(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        match self.get_storage(request).list_templates_by_user(actor.id).await {
            Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                TemplateListResponse { items },
                "Templates retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to list templates")),
        }
    }

    pub async fn get_template(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        match self.get_storage(request).get_template_by_id(id).await {
            Ok(Some(template)) if template.created_by == actor.id => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(template, "Template retrieved successfully"))),
            Ok(_) => Ok(template_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to get template")),
        }
    }

    pub async fn delete_template(
        &self,
        request: &HttpRequest,
        id: i64,
    ) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);
        match storage.get_template_by_id(id).await {
            Ok(Some(template)) if template.created_by == actor.id => {}
            Ok(_) => return Ok(template_not_found()),
            Err(e) => return Ok(error_response(&e, "Failed to get template")),
        }
        match storage.delete_template(id).await {
            Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Template deleted"))),
            Ok(false) => Ok(template_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to delete template")),
        }
    }

    pub async fn generate(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        generate::handle_generate(self, request, payload).await
    }

    pub async fn list_papers(
        &self,
        request: &HttpRequest,
        query: QuestionPaperQueryParams,
    ) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let list_query = QuestionPaperListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            generated_by: Some(actor.id),
            template_id: query.template_id,
        };
        match self
            .get_storage(request)
            .list_question_papers_with_pagination(list_query)
            .await
        {
            Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                response,
                "Question papers retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to list question papers")),
        }
    }

    pub async fn get_paper(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        match self.get_storage(request).get_question_paper_by_id(id).await {
            Ok(Some(paper)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(paper, "Question paper retrieved successfully"))),
            Ok(None) => Ok(paper_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to get question paper")),
        }
    }

    /// 按小节与题号修改题目，越界题号忽略
    pub async fn edit_paper(
        &self,
        request: &HttpRequest,
        id: i64,
        edits: PaperEditRequest,
    ) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);

        let mut paper = match storage.get_question_paper_by_id(id).await {
            Ok(Some(paper)) => paper,
            Ok(None) => return Ok(paper_not_found()),
            Err(e) => return Ok(error_response(&e, "Failed to get question paper")),
        };
        if !owns_paper(&actor, &paper) {
            return Ok(forbidden("Only the author can edit this question paper"));
        }

        let applied = paper.content.apply_edits(&edits.sections);
        tracing::debug!("Applying {} edits to question paper {}", applied, id);

        match storage.update_question_paper_content(id, &paper.content).await {
            Ok(Some(paper)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(paper, "Question paper updated"))),
            Ok(None) => Ok(paper_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to update question paper")),
        }
    }

    pub async fn delete_paper(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);

        match storage.get_question_paper_by_id(id).await {
            Ok(Some(paper)) if owns_paper(&actor, &paper) || actor.role == UserRole::Admin => {}
            Ok(Some(_)) => return Ok(forbidden("Only the author can delete this question paper")),
            Ok(None) => return Ok(paper_not_found()),
            Err(e) => return Ok(error_response(&e, "Failed to get question paper")),
        }
        match storage.delete_question_paper(id).await {
            Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Question paper deleted",
            ))),
            Ok(false) => Ok(paper_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to delete question paper")),
        }
    }

    pub async fn download_pdf(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);

        let paper = match storage.get_question_paper_by_id(id).await {
            Ok(Some(paper)) => paper,
            Ok(None) => return Ok(paper_not_found()),
            Err(e) => return Ok(error_response(&e, "Failed to get question paper")),
        };
        let template = match storage.get_template_by_id(paper.template_id).await {
            Ok(Some(template)) => template,
            Ok(None) => return Ok(template_not_found()),
            Err(e) => return Ok(error_response(&e, "Failed to load template")),
        };

        let bytes = match web::block(move || render_question_paper(&template, &paper)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return Ok(error_response(&e, "Failed to render PDF")),
            Err(e) => {
                return Ok(error_response(
                    &CampusError::pdf_processing(e.to_string()),
                    "Failed to render PDF",
                ));
            }
        };

        Ok(HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, "application/pdf"))
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"question_paper_{id}.pdf\""),
            ))
            .body(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question_papers::entities::{
        Difficulty, DifficultyDistribution, GeneratedQuestion, PaperContent, PaperSection,
        QuestionEdit, SectionType, TemplateSection,
    };
    use crate::services::testing::{body_json, campus, request_as};
    use std::collections::{BTreeMap, HashMap};

    fn template_request() -> CreateTemplateRequest {
        CreateTemplateRequest {
            name: "Series 1".to_string(),
            institution: "KTU".to_string(),
            course: "B.Tech CSE".to_string(),
            subject: "Compiler Design".to_string(),
            total_marks: 6,
            duration_minutes: 45,
            sections: vec![TemplateSection {
                name: "Part A".to_string(),
                section_type: SectionType::ShortAnswer,
                num_questions: 2,
                marks_per_question: 3.0,
            }],
        }
    }

    async fn stored_paper(campus: &crate::services::testing::Campus) -> QuestionPaper {
        let template = campus
            .storage
            .create_template(template_request(), campus.teacher.id)
            .await
            .unwrap();
        let content = PaperContent {
            sections: vec![PaperSection {
                name: "Part A".to_string(),
                questions: vec![GeneratedQuestion {
                    text: "Define a lexeme.".to_string(),
                    difficulty: Difficulty::Easy,
                    marks: 3.0,
                    options: None,
                }],
            }],
        };
        campus
            .storage
            .create_question_paper(
                template.id,
                "Compiler Design - 2025-03-01",
                &content,
                &DifficultyDistribution::default(),
                campus.teacher.id,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_template_validation_on_create() {
        let campus = campus().await;
        let service = QuestionPaperService::with_deps(campus.storage.clone(), None);
        let mut invalid = template_request();
        invalid.sections.clear();
        let resp = service
            .create_template(&request_as(&campus.teacher), invalid)
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = service
            .create_template(&request_as(&campus.teacher), template_request())
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    #[tokio::test]
    async fn test_edit_paper_marks_it_edited() {
        let campus = campus().await;
        let paper = stored_paper(&campus).await;
        let service = QuestionPaperService::with_deps(campus.storage.clone(), None);

        let mut part_a = BTreeMap::new();
        part_a.insert(
            0,
            QuestionEdit {
                text: Some("Define a token.".to_string()),
                ..Default::default()
            },
        );
        part_a.insert(5, QuestionEdit::default());
        let mut sections = HashMap::new();
        sections.insert("Part A".to_string(), part_a);

        let denied = service
            .edit_paper(
                &request_as(&campus.admin),
                paper.id,
                PaperEditRequest {
                    sections: sections.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(denied.status(), 403);

        let resp = service
            .edit_paper(&request_as(&campus.teacher), paper.id, PaperEditRequest { sections })
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["is_edited"], true);
        assert_eq!(
            body["data"]["content"]["sections"][0]["questions"][0]["text"],
            "Define a token."
        );
    }

    #[tokio::test]
    async fn test_download_pdf() {
        let campus = campus().await;
        let paper = stored_paper(&campus).await;
        let service = QuestionPaperService::with_deps(campus.storage.clone(), None);

        let resp = service
            .download_pdf(&request_as(&campus.teacher), paper.id)
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
