//! 就业能力评估

mod questions;
mod scoring;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    employability::{
        entities::{CATEGORIES, CategoryInfo, category_description},
        requests::{GenerateQuestionsRequest, SubmitAssessmentRequest},
        responses::{
            AssessmentListResponse, AssessmentResponse, CategoryListResponse, QuestionSetResponse,
        },
    },
};
use crate::services::{error_response, unauthorized};

define_service!(EmployabilityService);

fn invalid_category(category: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::EmployabilityCategoryInvalid,
        format!("Unknown category: {category}"),
    ))
}

impl EmployabilityService {
    pub async fn list_categories(&self, _request: &HttpRequest) -> ActixResult<HttpResponse> {
        let items = CATEGORIES
            .iter()
            .map(|(name, description)| CategoryInfo {
                name: name.to_string(),
                description: description.to_string(),
            })
            .collect();
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            CategoryListResponse { items },
            "Categories retrieved",
        )))
    }

    pub async fn generate_questions(
        &self,
        request: &HttpRequest,
        body: GenerateQuestionsRequest,
    ) -> ActixResult<HttpResponse> {
        if RequireJWT::extract_user_id(request).is_none() {
            return Ok(unauthorized());
        }
        let category = body.category.trim();
        let Some(description) = category_description(category) else {
            return Ok(invalid_category(category));
        };

        let llm = self.get_llm(request);
        let questions = questions::questions_for(&llm, category, description).await;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            QuestionSetResponse {
                category: category.to_string(),
                questions,
            },
            "Questions generated",
        )))
    }

    pub async fn submit_assessment(
        &self,
        request: &HttpRequest,
        body: SubmitAssessmentRequest,
    ) -> ActixResult<HttpResponse> {
        let Some(user_id) = RequireJWT::extract_user_id(request) else {
            return Ok(unauthorized());
        };
        if let Some(unknown) = body
            .answers
            .keys()
            .find(|c| category_description(c).is_none())
        {
            return Ok(invalid_category(unknown));
        }

        let scores = scoring::score_categories(&body.answers);
        let overall = scoring::overall_score(&scores);
        let level = scoring::level_for(overall);
        let suggestions = scoring::suggestions(&scores, &level);

        let storage = self.get_storage(request);
        let result = match storage
            .create_employability_result(user_id, &scores, overall, level.level)
            .await
        {
            Ok(result) => result,
            Err(e) => return Ok(error_response(&e, "Failed to save assessment")),
        };
        tracing::info!(
            "Employability assessment saved for user {}: {:.2} (level {})",
            user_id,
            overall,
            level.level
        );

        Ok(HttpResponse::Created().json(ApiResponse::success(
            AssessmentResponse {
                result,
                employability_level: level,
                suggestions,
            },
            "Assessment completed",
        )))
    }

    pub async fn list_assessments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let Some(user_id) = RequireJWT::extract_user_id(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);
        match storage.list_employability_results(user_id).await {
            Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                AssessmentListResponse { items },
                "Assessments retrieved",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to list assessments")),
        }
    }

    pub async fn get_stats(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let Some(user_id) = RequireJWT::extract_user_id(request) else {
            return Ok(unauthorized());
        };
        let storage = self.get_storage(request);
        match storage.employability_stats(user_id).await {
            Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                stats,
                "Statistics retrieved",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to load statistics")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmClient, mock::ScriptedLlm};
    use crate::models::employability::requests::AnswerItem;
    use crate::services::testing::{body_json, campus, request_as};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn service(
        storage: Arc<dyn crate::storage::Storage>,
        scripted: ScriptedLlm,
    ) -> EmployabilityService {
        let llm: Arc<dyn LlmClient> = Arc::new(scripted);
        EmployabilityService::with_deps(storage, Some(llm))
    }

    #[tokio::test]
    async fn test_questions_fall_back_to_defaults() {
        let campus = campus().await;
        let service = service(campus.storage.clone(), ScriptedLlm::unavailable());
        let req = request_as(&campus.student_user);

        let body = body_json(
            service
                .generate_questions(
                    &req,
                    GenerateQuestionsRequest {
                        category: "Database".to_string(),
                    },
                )
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["data"]["category"], "Database");
        assert_eq!(body["data"]["questions"][0]["options"].as_array().unwrap().len(), 4);

        let resp = service
            .generate_questions(
                &req,
                GenerateQuestionsRequest {
                    category: "Cooking".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_assessment_history_and_stats() {
        let campus = campus().await;
        let service = service(campus.storage.clone(), ScriptedLlm::unavailable());
        let req = request_as(&campus.student_user);

        let all_correct: BTreeMap<String, Vec<AnswerItem>> = CATEGORIES
            .iter()
            .map(|(c, _)| (c.to_string(), vec![AnswerItem { selected: 1, correct: 1 }]))
            .collect();
        let resp = service
            .submit_assessment(&req, SubmitAssessmentRequest { answers: all_correct })
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["result"]["overall_score"], 5.0);
        assert_eq!(body["data"]["employability_level"]["title"], "Job Ready");
        assert_eq!(
            body["data"]["suggestions"][0],
            "Continue to enhance your skills and maintain professional development."
        );

        let mut partial = BTreeMap::new();
        partial.insert("Security".to_string(), vec![AnswerItem { selected: 0, correct: 2 }]);
        service
            .submit_assessment(&req, SubmitAssessmentRequest { answers: partial })
            .await
            .unwrap();

        let body = body_json(service.list_assessments(&req).await.unwrap()).await;
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

        let body = body_json(service.get_stats(&req).await.unwrap()).await;
        assert_eq!(body["data"]["total_assessments"], 2);
        assert_eq!(body["data"]["highest_score"], 5.0);
        assert_eq!(body["data"]["lowest_score"], 0.0);
        assert_eq!(body["data"]["average_score"], 2.5);

        let mut unknown = BTreeMap::new();
        unknown.insert("Cooking".to_string(), Vec::new());
        let resp = service
            .submit_assessment(&req, SubmitAssessmentRequest { answers: unknown })
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }
}
