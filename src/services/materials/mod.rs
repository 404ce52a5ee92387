//! 学习资料：上传 PDF 后由 LLM 生成结构化学习摘要

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::{CampusError, Result};
use crate::llm::{ChatMessage, ChatOptions, LlmClient};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    materials::{
        entities::{SUMMARY_INPUT_LIMIT, StudyMaterial, truncate_chars},
        requests::{CreateMaterialRequest, MaterialListQuery, MaterialQueryParams},
    },
    users::entities::{User, UserRole},
};
use crate::services::{error_response, files::read_uploaded, forbidden, unauthorized};
use crate::storage::Storage;
use crate::utils::{is_pdf, pdf::extract_text};

define_service!(MaterialService);

const SUMMARY_PROMPT: &str = "You are an academic assistant for engineering students. \
Summarize the study material provided by the user into a structured study summary with \
three sections titled 'Overview', 'Key Concepts' and 'Important Points'. \
Use short paragraphs and bullet points, keep technical terms and formulas intact, \
and do not invent content that is not in the material.";

fn material_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::MaterialNotFound,
        "Study material not found",
    ))
}

fn can_manage(actor: &User, material: &StudyMaterial) -> bool {
    actor.role == UserRole::Admin || material.created_by == actor.id
}

/// 生成学习摘要，只取正文前若干字符
pub(crate) async fn summarize(llm: &Arc<dyn LlmClient>, text: &str) -> Result<String> {
    let messages = [
        ChatMessage::system(SUMMARY_PROMPT),
        ChatMessage::user(truncate_chars(text, SUMMARY_INPUT_LIMIT)),
    ];
    let summary = llm
        .chat(
            &AppConfig::get().llm.chat_model,
            &messages,
            &ChatOptions::from_config(),
        )
        .await?;
    let summary = summary.trim();
    if summary.is_empty() {
        return Err(CampusError::llm_response("Empty summary returned"));
    }
    Ok(summary.to_string())
}

/// 读取已上传的 PDF 并提取正文
async fn material_text(
    storage: &Arc<dyn Storage>,
    file_token: &str,
) -> std::result::Result<String, HttpResponse> {
    let (_, bytes) = match read_uploaded(storage, file_token).await {
        Ok(found) => found,
        Err(CampusError::NotFound(_)) | Err(CampusError::FileOperation(_)) => {
            return Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::FileNotFound,
                "File not found",
            )));
        }
        Err(e) => return Err(error_response(&e, "Failed to read file")),
    };

    if !is_pdf(&bytes) {
        return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::FileTypeNotAllowed,
            "Study material must be a PDF file",
        )));
    }

    // lopdf 解析是同步的，放到阻塞线程池
    let text = match web::block(move || extract_text(&bytes)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::warn!("PDF parsing failed: {}", e);
            return Err(HttpResponse::UnprocessableEntity().json(ApiResponse::error_empty(
                ErrorCode::PdfTextNotFound,
                "No extractable text found in PDF",
            )));
        }
        Err(e) => {
            return Err(error_response(
                &CampusError::pdf_processing(e.to_string()),
                "Failed to parse PDF",
            ));
        }
    };

    if text.trim().is_empty() {
        return Err(HttpResponse::UnprocessableEntity().json(ApiResponse::error_empty(
            ErrorCode::PdfTextNotFound,
            "No extractable text found in PDF",
        )));
    }
    Ok(text)
}

impl MaterialService {
    pub async fn create_material(
        &self,
        request: &HttpRequest,
        req: CreateMaterialRequest,
    ) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let title = req.title.trim();
        if title.is_empty() {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, "Title is required")));
        }

        let storage = self.get_storage(request);
        if let Some(course_id) = req.course_id {
            match storage.get_course_by_id(course_id).await {
                Ok(Some(_)) => {}
                Ok(None) => return Ok(crate::services::courses::course_not_found()),
                Err(e) => return Ok(error_response(&e, "Failed to get course")),
            }
        }

        let text = match material_text(&storage, &req.file_token).await {
            Ok(text) => text,
            Err(resp) => return Ok(resp),
        };

        let summary = match summarize(&self.get_llm(request), &text).await {
            Ok(summary) => summary,
            Err(e) => return Ok(error_response(&e, "Failed to summarize material")),
        };

        match storage
            .create_material(title, req.course_id, &req.file_token, &summary, actor.id)
            .await
        {
            Ok(material) => Ok(HttpResponse::Created()
                .json(ApiResponse::success(material, "Study material summarized"))),
            Err(e) => Ok(error_response(&e, "Failed to save material")),
        }
    }

    pub async fn list_materials(
        &self,
        request: &HttpRequest,
        query: MaterialQueryParams,
    ) -> ActixResult<HttpResponse> {
        let list_query = MaterialListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            course_id: query.course_id,
        };
        match self
            .get_storage(request)
            .list_materials_with_pagination(list_query)
            .await
        {
            Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                response,
                "Study materials retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to list materials")),
        }
    }

    pub async fn get_material(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        match self.get_storage(request).get_material_by_id(id).await {
            Ok(Some(material)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(material, "Study material retrieved"))),
            Ok(None) => Ok(material_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to get material")),
        }
    }

    pub async fn delete_material(
        &self,
        request: &HttpRequest,
        id: i64,
    ) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);

        match storage.get_material_by_id(id).await {
            Ok(Some(material)) if !can_manage(&actor, &material) => {
                return Ok(forbidden("Only the uploader or an admin can delete this material"));
            }
            Ok(Some(_)) => {}
            Ok(None) => return Ok(material_not_found()),
            Err(e) => return Ok(error_response(&e, "Failed to get material")),
        }

        match storage.delete_material(id).await {
            Ok(true) => {
                Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Study material deleted")))
            }
            Ok(false) => Ok(material_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to delete material")),
        }
    }

    /// 重新生成摘要
    pub async fn regenerate_summary(
        &self,
        request: &HttpRequest,
        id: i64,
    ) -> ActixResult<HttpResponse> {
        let Some(actor) = RequireJWT::extract_user_claims(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);

        let material = match storage.get_material_by_id(id).await {
            Ok(Some(material)) => material,
            Ok(None) => return Ok(material_not_found()),
            Err(e) => return Ok(error_response(&e, "Failed to get material")),
        };
        if !can_manage(&actor, &material) {
            return Ok(forbidden("Only the uploader or an admin can regenerate this summary"));
        }

        let text = match material_text(&storage, &material.file_token).await {
            Ok(text) => text,
            Err(resp) => return Ok(resp),
        };
        let summary = match summarize(&self.get_llm(request), &text).await {
            Ok(summary) => summary,
            Err(e) => return Ok(error_response(&e, "Failed to summarize material")),
        };

        match storage.update_material_summary(id, &summary).await {
            Ok(Some(material)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(material, "Summary regenerated"))),
            Ok(None) => Ok(material_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to save summary")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::ScriptedLlm;
    use crate::services::files::stored_path;
    use crate::services::testing::{body_json, campus, request_as};
    use crate::utils::pdf::text_pdf;

    async fn stage_upload(storage: &Arc<dyn Storage>, owner: i64, bytes: &[u8]) -> String {
        let token = format!("test-{}", uuid::Uuid::new_v4());
        let path = stored_path(&token);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, bytes).await.unwrap();
        storage
            .upload_file(&token, "notes.pdf", &(bytes.len() as i64), "application/pdf", owner)
            .await
            .unwrap();
        token
    }

    #[tokio::test]
    async fn test_create_material_summarizes_pdf_text() {
        let campus = campus().await;
        let llm = Arc::new(ScriptedLlm::always("Overview: parsing turns tokens into trees."));
        let service = MaterialService::with_deps(campus.storage.clone(), Some(llm.clone()));
        let token = stage_upload(
            &campus.storage,
            campus.teacher.id,
            &text_pdf(&["Module 2 Syntax analysis", "LL(1) parsing tables"]),
        )
        .await;

        let resp = service
            .create_material(
                &request_as(&campus.teacher),
                CreateMaterialRequest {
                    title: "Syntax analysis notes".to_string(),
                    course_id: Some(campus.course_id),
                    file_token: token.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body = body_json(resp).await;
        assert!(body["data"]["summary"].as_str().unwrap().starts_with("Overview"));

        let prompt = llm.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("LL(1) parsing tables"));
        let _ = tokio::fs::remove_file(stored_path(&token)).await;
    }

    #[tokio::test]
    async fn test_pdf_without_text_is_unprocessable() {
        let campus = campus().await;
        let llm = Arc::new(ScriptedLlm::always("unused"));
        let service = MaterialService::with_deps(campus.storage.clone(), Some(llm.clone()));
        let token = stage_upload(&campus.storage, campus.teacher.id, &text_pdf(&[])).await;

        let resp = service
            .create_material(
                &request_as(&campus.teacher),
                CreateMaterialRequest {
                    title: "Blank".to_string(),
                    course_id: None,
                    file_token: token.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 422);
        assert_eq!(
            body_json(resp).await["message"],
            "No extractable text found in PDF"
        );
        assert_eq!(llm.call_count(), 0);
        let _ = tokio::fs::remove_file(stored_path(&token)).await;
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_can_delete() {
        let campus = campus().await;
        let material = campus
            .storage
            .create_material("Notes", None, "tok", "summary", campus.teacher.id)
            .await
            .unwrap();
        let service = MaterialService::with_deps(campus.storage.clone(), None);

        let denied = service
            .delete_material(&request_as(&campus.student_user), material.id)
            .await
            .unwrap();
        assert_eq!(denied.status(), 403);

        let ok = service
            .delete_material(&request_as(&campus.admin), material.id)
            .await
            .unwrap();
        assert_eq!(ok.status(), 200);
    }
}
