use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::students::requests::{
    CreateStudentRequest, EnrollStudentRequest, StudentExportParams, StudentQueryParams,
    UpdateStudentRequest,
};
use crate::services::StudentService;
use crate::utils::{SafeCourseIdI64, SafeStudentIdI64};

static STUDENT_SERVICE: Lazy<StudentService> = Lazy::new(StudentService::new_lazy);

pub async fn list_students(
    req: HttpRequest,
    query: web::Query<StudentQueryParams>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.list_students(&req, query.into_inner()).await
}

pub async fn create_student(
    req: HttpRequest,
    body: web::Json<CreateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.create_student(&req, body.into_inner()).await
}

pub async fn export_students(
    req: HttpRequest,
    params: web::Query<StudentExportParams>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .export_students(&req, params.into_inner())
        .await
}

pub async fn get_student(
    req: HttpRequest,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.get_student(&req, student_id.0).await
}

pub async fn update_student(
    req: HttpRequest,
    student_id: SafeStudentIdI64,
    body: web::Json<UpdateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .update_student(&req, student_id.0, body.into_inner())
        .await
}

pub async fn delete_student(
    req: HttpRequest,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.delete_student(&req, student_id.0).await
}

pub async fn list_courses(
    req: HttpRequest,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.list_courses(&req, student_id.0).await
}

pub async fn enroll(
    req: HttpRequest,
    student_id: SafeStudentIdI64,
    body: web::Json<EnrollStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .enroll(&req, student_id.0, body.into_inner())
        .await
}

pub async fn unenroll(
    req: HttpRequest,
    path: web::Path<(SafeStudentIdI64, SafeCourseIdI64)>,
) -> ActixResult<HttpResponse> {
    let (student_id, course_id) = path.into_inner();
    STUDENT_SERVICE
        .unenroll(&req, student_id.0, course_id.0)
        .await
}

// 教职工可读，管理员可写
pub fn configure_student_routes(cfg: &mut web::ServiceConfig) {
    use middlewares::RequireRole;
    let (admin, teacher) = (RequireRole::admin, RequireRole::teacher);

    cfg.service(
        web::scope("/api/v1/students")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_students).wrap(teacher()))
                    .route(web::post().to(create_student).wrap(admin())),
            )
            .route("/export", web::get().to(export_students).wrap(teacher()))
            .service(
                web::resource("/{student_id}")
                    .route(web::get().to(get_student).wrap(teacher()))
                    .route(web::put().to(update_student).wrap(admin()))
                    .route(web::delete().to(delete_student).wrap(admin())),
            )
            .service(
                web::resource("/{student_id}/courses")
                    .route(web::get().to(list_courses).wrap(teacher()))
                    .route(web::post().to(enroll).wrap(admin())),
            )
            .route(
                "/{student_id}/courses/{course_id}",
                web::delete().to(unenroll).wrap(admin()),
            ),
    );
}
