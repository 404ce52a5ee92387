use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::materials::requests::{CreateMaterialRequest, MaterialQueryParams};
use crate::services::MaterialService;
use crate::utils::SafeMaterialIdI64;

static MATERIAL_SERVICE: Lazy<MaterialService> = Lazy::new(MaterialService::new_lazy);

pub async fn create_material(
    req: HttpRequest,
    body: web::Json<CreateMaterialRequest>,
) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE
        .create_material(&req, body.into_inner())
        .await
}

pub async fn list_materials(
    req: HttpRequest,
    query: web::Query<MaterialQueryParams>,
) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE.list_materials(&req, query.into_inner()).await
}

pub async fn get_material(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE.get_material(&req, material_id.0).await
}

pub async fn delete_material(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE.delete_material(&req, material_id.0).await
}

pub async fn regenerate_summary(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE
        .regenerate_summary(&req, material_id.0)
        .await
}

// 摘要生成会调用 LLM，需要限流
pub fn configure_material_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/materials")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("").route(web::get().to(list_materials)).route(
                    web::post()
                        .to(create_material)
                        .wrap(middlewares::RateLimit::generation()),
                ),
            )
            .service(
                web::resource("/{material_id}")
                    .route(web::get().to(get_material))
                    .route(web::delete().to(delete_material)),
            )
            .route(
                "/{material_id}/summary",
                web::post()
                    .to(regenerate_summary)
                    .wrap(middlewares::RateLimit::generation()),
            ),
    );
}
