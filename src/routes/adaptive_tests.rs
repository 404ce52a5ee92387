use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::adaptive_tests::requests::SubmitAnswerRequest;
use crate::services::AdaptiveTestService;
use crate::utils::SafeSessionIdI64;

static ADAPTIVE_TEST_SERVICE: Lazy<AdaptiveTestService> =
    Lazy::new(AdaptiveTestService::new_lazy);

pub async fn create_test(req: HttpRequest) -> ActixResult<HttpResponse> {
    ADAPTIVE_TEST_SERVICE.create_test(&req).await
}

pub async fn list_tests(req: HttpRequest) -> ActixResult<HttpResponse> {
    ADAPTIVE_TEST_SERVICE.list_tests(&req).await
}

pub async fn current_question(
    req: HttpRequest,
    session_id: SafeSessionIdI64,
) -> ActixResult<HttpResponse> {
    ADAPTIVE_TEST_SERVICE
        .current_question(&req, session_id.0)
        .await
}

pub async fn submit_answer(
    req: HttpRequest,
    session_id: SafeSessionIdI64,
    body: web::Json<SubmitAnswerRequest>,
) -> ActixResult<HttpResponse> {
    ADAPTIVE_TEST_SERVICE
        .submit_answer(&req, session_id.0, body.into_inner())
        .await
}

pub async fn finish_test(
    req: HttpRequest,
    session_id: SafeSessionIdI64,
) -> ActixResult<HttpResponse> {
    ADAPTIVE_TEST_SERVICE.finish_test(&req, session_id.0).await
}

pub fn configure_adaptive_test_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/adaptive-tests")
            .wrap(middlewares::RequireJWT)
            .route(
                "",
                web::post()
                    .to(create_test)
                    .wrap(middlewares::RateLimit::generation()),
            )
            .route("", web::get().to(list_tests))
            .route("/{session_id}/current", web::get().to(current_question))
            .route("/{session_id}/answers", web::post().to(submit_answer))
            .route("/{session_id}/finish", web::post().to(finish_test)),
    );
}
