use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::attendance::requests::{AttendanceSummaryQuery, MarkAttendanceRequest};
use crate::services::AttendanceService;
use crate::utils::SafeCourseIdI64;

static ATTENDANCE_SERVICE: Lazy<AttendanceService> = Lazy::new(AttendanceService::new_lazy);

pub async fn mark_attendance(
    req: HttpRequest,
    body: web::Json<MarkAttendanceRequest>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .mark_attendance(&req, body.into_inner())
        .await
}

pub async fn get_summary(
    req: HttpRequest,
    query: web::Query<AttendanceSummaryQuery>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.get_summary(&req, query.into_inner()).await
}

pub async fn get_course_record(
    req: HttpRequest,
    path: web::Path<(SafeCourseIdI64, String)>,
) -> ActixResult<HttpResponse> {
    let (course_id, usn) = path.into_inner();
    ATTENDANCE_SERVICE
        .get_course_record(&req, course_id.0, &usn)
        .await
}

pub fn configure_attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/attendance")
            .wrap(middlewares::RequireJWT)
            .route(
                "",
                web::post()
                    .to(mark_attendance)
                    .wrap(middlewares::RequireRole::teacher()),
            )
            .route("/summary", web::get().to(get_summary))
            .route(
                "/courses/{course_id}/students/{usn}",
                web::get()
                    .to(get_course_record)
                    .wrap(middlewares::RequireRole::teacher()),
            ),
    );
}
