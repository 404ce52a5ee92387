use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::employability::requests::{GenerateQuestionsRequest, SubmitAssessmentRequest};
use crate::services::EmployabilityService;

static EMPLOYABILITY_SERVICE: Lazy<EmployabilityService> =
    Lazy::new(EmployabilityService::new_lazy);

pub async fn list_categories(req: HttpRequest) -> ActixResult<HttpResponse> {
    EMPLOYABILITY_SERVICE.list_categories(&req).await
}

pub async fn generate_questions(
    req: HttpRequest,
    body: web::Json<GenerateQuestionsRequest>,
) -> ActixResult<HttpResponse> {
    EMPLOYABILITY_SERVICE
        .generate_questions(&req, body.into_inner())
        .await
}

pub async fn submit_assessment(
    req: HttpRequest,
    body: web::Json<SubmitAssessmentRequest>,
) -> ActixResult<HttpResponse> {
    EMPLOYABILITY_SERVICE
        .submit_assessment(&req, body.into_inner())
        .await
}

pub async fn list_assessments(req: HttpRequest) -> ActixResult<HttpResponse> {
    EMPLOYABILITY_SERVICE.list_assessments(&req).await
}

pub async fn get_stats(req: HttpRequest) -> ActixResult<HttpResponse> {
    EMPLOYABILITY_SERVICE.get_stats(&req).await
}

pub fn configure_employability_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/employability")
            .wrap(middlewares::RequireJWT)
            .route("/categories", web::get().to(list_categories))
            .route(
                "/questions",
                web::post()
                    .to(generate_questions)
                    .wrap(middlewares::RateLimit::generation()),
            )
            .route("/assessments", web::post().to(submit_assessment))
            .route("/assessments", web::get().to(list_assessments))
            .route("/assessments/stats", web::get().to(get_stats)),
    );
}
