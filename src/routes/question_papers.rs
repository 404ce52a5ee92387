use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::question_papers::requests::{
    CreateTemplateRequest, PaperEditRequest, QuestionPaperQueryParams,
};
use crate::services::QuestionPaperService;
use crate::utils::{SafePaperIdI64, SafeTemplateIdI64};

static QUESTION_PAPER_SERVICE: Lazy<QuestionPaperService> =
    Lazy::new(QuestionPaperService::new_lazy);

pub async fn create_template(
    req: HttpRequest,
    body: web::Json<CreateTemplateRequest>,
) -> ActixResult<HttpResponse> {
    QUESTION_PAPER_SERVICE
        .create_template(&req, body.into_inner())
        .await
}

pub async fn list_templates(req: HttpRequest) -> ActixResult<HttpResponse> {
    QUESTION_PAPER_SERVICE.list_templates(&req).await
}

pub async fn get_template(
    req: HttpRequest,
    template_id: SafeTemplateIdI64,
) -> ActixResult<HttpResponse> {
    QUESTION_PAPER_SERVICE.get_template(&req, template_id.0).await
}

pub async fn delete_template(
    req: HttpRequest,
    template_id: SafeTemplateIdI64,
) -> ActixResult<HttpResponse> {
    QUESTION_PAPER_SERVICE
        .delete_template(&req, template_id.0)
        .await
}

pub async fn generate(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    QUESTION_PAPER_SERVICE.generate(&req, payload).await
}

pub async fn list_papers(
    req: HttpRequest,
    query: web::Query<QuestionPaperQueryParams>,
) -> ActixResult<HttpResponse> {
    QUESTION_PAPER_SERVICE
        .list_papers(&req, query.into_inner())
        .await
}

pub async fn get_paper(req: HttpRequest, paper_id: SafePaperIdI64) -> ActixResult<HttpResponse> {
    QUESTION_PAPER_SERVICE.get_paper(&req, paper_id.0).await
}

pub async fn edit_paper(
    req: HttpRequest,
    paper_id: SafePaperIdI64,
    body: web::Json<PaperEditRequest>,
) -> ActixResult<HttpResponse> {
    QUESTION_PAPER_SERVICE
        .edit_paper(&req, paper_id.0, body.into_inner())
        .await
}

pub async fn delete_paper(
    req: HttpRequest,
    paper_id: SafePaperIdI64,
) -> ActixResult<HttpResponse> {
    QUESTION_PAPER_SERVICE.delete_paper(&req, paper_id.0).await
}

pub async fn download_pdf(
    req: HttpRequest,
    paper_id: SafePaperIdI64,
) -> ActixResult<HttpResponse> {
    QUESTION_PAPER_SERVICE.download_pdf(&req, paper_id.0).await
}

// 试卷生成器仅对教师开放
pub fn configure_question_paper_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/question-papers")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::teacher())
                    .route("/templates", web::post().to(create_template))
                    .route("/templates", web::get().to(list_templates))
                    .route("/templates/{template_id}", web::get().to(get_template))
                    .route("/templates/{template_id}", web::delete().to(delete_template))
                    .route(
                        "/generate",
                        web::post()
                            .to(generate)
                            .wrap(middlewares::RateLimit::generation()),
                    )
                    .route("/papers", web::get().to(list_papers))
                    .route("/papers/{paper_id}", web::get().to(get_paper))
                    .route("/papers/{paper_id}", web::put().to(edit_paper))
                    .route("/papers/{paper_id}", web::delete().to(delete_paper))
                    .route("/papers/{paper_id}/pdf", web::get().to(download_pdf)),
            ),
    );
}
