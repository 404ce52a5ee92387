use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::marks::requests::{MarksQuery, RecordMarksRequest};
use crate::services::MarksService;

static MARKS_SERVICE: Lazy<MarksService> = Lazy::new(MarksService::new_lazy);

pub async fn record_marks(
    req: HttpRequest,
    body: web::Json<RecordMarksRequest>,
) -> ActixResult<HttpResponse> {
    MARKS_SERVICE.record(&req, body.into_inner()).await
}

pub async fn query_marks(
    req: HttpRequest,
    query: web::Query<MarksQuery>,
) -> ActixResult<HttpResponse> {
    MARKS_SERVICE.query(&req, query.into_inner()).await
}

pub fn configure_marks_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/marks")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(query_marks))
                    .route(
                        web::post()
                            .to(record_marks)
                            .wrap(middlewares::RequireRole::teacher()),
                    ),
            ),
    );
}
