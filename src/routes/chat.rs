use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::chat::requests::{ChatRequest, ChatStreamQuery};
use crate::services::ChatService;

static CHAT_SERVICE: Lazy<ChatService> = Lazy::new(ChatService::new_lazy);

pub async fn send_message(
    req: HttpRequest,
    body: web::Json<ChatRequest>,
) -> ActixResult<HttpResponse> {
    CHAT_SERVICE.send_message(&req, body.into_inner()).await
}

pub async fn stream(
    req: HttpRequest,
    query: web::Query<ChatStreamQuery>,
) -> ActixResult<HttpResponse> {
    CHAT_SERVICE.stream(&req, query.into_inner()).await
}

pub async fn get_history(req: HttpRequest) -> ActixResult<HttpResponse> {
    CHAT_SERVICE.get_history(&req).await
}

pub async fn clear_history(req: HttpRequest) -> ActixResult<HttpResponse> {
    CHAT_SERVICE.clear_history(&req).await
}

// 限流中间件在 JWT 之内，按用户计数
pub fn configure_chat_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/chat")
            .wrap(middlewares::RequireJWT)
            .route(
                "",
                web::post()
                    .to(send_message)
                    .wrap(middlewares::RateLimit::chat()),
            )
            .route(
                "/stream",
                web::get().to(stream).wrap(middlewares::RateLimit::chat()),
            )
            .route("/history", web::get().to(get_history))
            .route("/history", web::delete().to(clear_history)),
    );
}
