use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::departments::requests::{CreateDepartmentRequest, UpdateDepartmentRequest};
use crate::services::DepartmentService;
use crate::utils::SafeDepartmentIdI64;

static DEPARTMENT_SERVICE: Lazy<DepartmentService> = Lazy::new(DepartmentService::new_lazy);

pub async fn list_departments(req: HttpRequest) -> ActixResult<HttpResponse> {
    DEPARTMENT_SERVICE.list_departments(&req).await
}

pub async fn create_department(
    req: HttpRequest,
    body: web::Json<CreateDepartmentRequest>,
) -> ActixResult<HttpResponse> {
    DEPARTMENT_SERVICE
        .create_department(body.into_inner(), &req)
        .await
}

pub async fn get_department(
    req: HttpRequest,
    department_id: SafeDepartmentIdI64,
) -> ActixResult<HttpResponse> {
    DEPARTMENT_SERVICE.get_department(department_id.0, &req).await
}

pub async fn update_department(
    req: HttpRequest,
    department_id: SafeDepartmentIdI64,
    body: web::Json<UpdateDepartmentRequest>,
) -> ActixResult<HttpResponse> {
    DEPARTMENT_SERVICE
        .update_department(department_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_department(
    req: HttpRequest,
    department_id: SafeDepartmentIdI64,
) -> ActixResult<HttpResponse> {
    DEPARTMENT_SERVICE
        .delete_department(department_id.0, &req)
        .await
}

// 登录用户可读，管理员可写
pub fn configure_department_routes(cfg: &mut web::ServiceConfig) {
    let admin = middlewares::RequireRole::admin;

    cfg.service(
        web::scope("/api/v1/departments")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_departments))
                    .route(web::post().to(create_department).wrap(admin())),
            )
            .service(
                web::resource("/{department_id}")
                    .route(web::get().to(get_department))
                    .route(web::put().to(update_department).wrap(admin()))
                    .route(web::delete().to(delete_department).wrap(admin())),
            ),
    );
}
