use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::courses::requests::{
    AssignmentListQuery, CourseQueryParams, CreateAssignmentRequest, CreateCourseRequest,
    CreateTimetableSlotRequest, UpdateCourseRequest,
};
use crate::services::CourseService;
use crate::utils::{SafeAssignmentIdI64, SafeCourseIdI64, SafeSlotIdI64};

static COURSE_SERVICE: Lazy<CourseService> = Lazy::new(CourseService::new_lazy);

pub async fn list_courses(
    req: HttpRequest,
    query: web::Query<CourseQueryParams>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_courses(&req, query.into_inner()).await
}

pub async fn create_course(
    req: HttpRequest,
    body: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.create_course(&req, body.into_inner()).await
}

pub async fn get_course(req: HttpRequest, course_id: SafeCourseIdI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course(&req, course_id.0).await
}

pub async fn update_course(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
    body: web::Json<UpdateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .update_course(&req, course_id.0, body.into_inner())
        .await
}

pub async fn delete_course(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.delete_course(&req, course_id.0).await
}

pub async fn create_assignment(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
    body: web::Json<CreateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .create_assignment(&req, course_id.0, body.into_inner())
        .await
}

pub async fn list_assignments(
    req: HttpRequest,
    query: web::Query<AssignmentListQuery>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_assignments(&req, query.into_inner()).await
}

pub async fn delete_assignment(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .delete_assignment(&req, assignment_id.0)
        .await
}

pub async fn create_slot(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
    body: web::Json<CreateTimetableSlotRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .create_slot(&req, assignment_id.0, body.into_inner())
        .await
}

pub async fn list_slots(
    req: HttpRequest,
    assignment_id: SafeAssignmentIdI64,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_slots(&req, assignment_id.0).await
}

pub async fn delete_slot(req: HttpRequest, slot_id: SafeSlotIdI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.delete_slot(&req, slot_id.0).await
}

// 课程、授课分配与课表时段
pub fn configure_course_routes(cfg: &mut web::ServiceConfig) {
    use middlewares::RequireRole;
    let (admin, teacher) = (RequireRole::admin, RequireRole::teacher);

    cfg.service(
        web::scope("/api/v1/courses")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_courses))
                    .route(web::post().to(create_course).wrap(admin())),
            )
            .service(
                web::resource("/{course_id}")
                    .route(web::get().to(get_course))
                    .route(web::put().to(update_course).wrap(admin()))
                    .route(web::delete().to(delete_course).wrap(admin())),
            )
            .route(
                "/{course_id}/assignments",
                web::post().to(create_assignment).wrap(admin()),
            ),
    )
    .service(
        web::scope("/api/v1/assignments")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_assignments).wrap(teacher()))
            .route(
                "/{assignment_id}",
                web::delete().to(delete_assignment).wrap(admin()),
            )
            .service(
                web::resource("/{assignment_id}/slots")
                    .route(web::get().to(list_slots).wrap(teacher()))
                    .route(web::post().to(create_slot).wrap(admin())),
            ),
    )
    .service(
        web::scope("/api/v1/slots")
            // 后注册的中间件先执行，角色检查放在 JWT 之内
            .wrap(admin())
            .wrap(middlewares::RequireJWT)
            .route("/{slot_id}", web::delete().to(delete_slot)),
    );
}
