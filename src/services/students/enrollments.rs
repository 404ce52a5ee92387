use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{StudentService, student_not_found};
use crate::models::{ApiResponse, ErrorCode, students::responses::StudentCoursesResponse};
use crate::services::error_response;

pub async fn list_courses(
    service: &StudentService,
    request: &HttpRequest,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let student = match storage.get_student_by_id(student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => return Ok(student_not_found()),
        Err(e) => return Ok(error_response(&e, "Failed to get student")),
    };

    match storage.list_student_courses(student_id).await {
        Ok(courses) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            StudentCoursesResponse { student, courses },
            "Enrolled courses retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, "Failed to list enrolled courses")),
    }
}

/// 重复选课返回已有记录
pub async fn enroll(
    service: &StudentService,
    request: &HttpRequest,
    student_id: i64,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.get_student_by_id(student_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(student_not_found()),
        Err(e) => return Ok(error_response(&e, "Failed to get student")),
    }
    match storage.get_course_by_id(course_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::CourseNotFound,
                "Course not found",
            )));
        }
        Err(e) => return Ok(error_response(&e, "Failed to get course")),
    }

    match storage.enroll_student(student_id, course_id).await {
        Ok(enrollment_id) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            serde_json::json!({ "enrollment_id": enrollment_id }),
            "Student enrolled successfully",
        ))),
        Err(e) => Ok(error_response(&e, "Failed to enroll student")),
    }
}

pub async fn unenroll(
    service: &StudentService,
    request: &HttpRequest,
    student_id: i64,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    match service
        .get_storage(request)
        .unenroll_student(student_id, course_id)
        .await
    {
        Ok(true) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success_empty("Student unenrolled successfully"))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::EnrollmentNotFound,
            "Enrollment not found",
        ))),
        Err(e) => Ok(error_response(&e, "Failed to unenroll student")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{body_json, campus, request_as};

    #[tokio::test]
    async fn test_enroll_is_idempotent_and_unenroll_reports_missing() {
        let campus = campus().await;
        let service = StudentService::with_deps(campus.storage.clone(), None);
        let req = request_as(&campus.admin);

        let first = enroll(&service, &req, campus.student_id, campus.course_id)
            .await
            .unwrap();
        let first = body_json(first).await;
        let second = enroll(&service, &req, campus.student_id, campus.course_id)
            .await
            .unwrap();
        let second = body_json(second).await;
        assert_eq!(first["data"]["enrollment_id"], second["data"]["enrollment_id"]);

        let missing_course = enroll(&service, &req, campus.student_id, 999).await.unwrap();
        assert_eq!(missing_course.status(), 404);

        let resp = unenroll(&service, &req, campus.student_id, campus.course_id).await.unwrap();
        assert_eq!(resp.status(), 200);
        let resp = unenroll(&service, &req, campus.student_id, campus.course_id).await.unwrap();
        assert_eq!(resp.status(), 404);
    }
}
