use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{CourseService, course_not_found};
use crate::errors::CampusError;
use crate::models::{
    ApiResponse, ErrorCode,
    courses::{
        requests::{AssignmentListQuery, CreateAssignmentRequest},
        responses::AssignmentListResponse,
    },
    users::entities::UserRole,
};
use crate::services::error_response;

/// 分配教师讲授某班级的课程，教师必须具有 teacher 角色
pub async fn create_assignment(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    req: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.get_course_by_id(course_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(course_not_found()),
        Err(e) => return Ok(error_response(&e, "Failed to get course")),
    }
    match storage.get_class_by_id(req.class_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ClassNotFound,
                "Class not found",
            )));
        }
        Err(e) => return Ok(error_response(&e, "Failed to get class")),
    }
    match storage.get_user_by_id(req.teacher_id).await {
        Ok(Some(user)) if user.role == UserRole::Teacher => {}
        Ok(Some(_)) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                "Assigned user must have the teacher role",
            )));
        }
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "Teacher not found",
            )));
        }
        Err(e) => return Ok(error_response(&e, "Failed to get teacher")),
    }

    match storage.create_assignment(course_id, req).await {
        Ok(assignment) => Ok(HttpResponse::Created().json(ApiResponse::success(
            assignment,
            "Teacher assigned successfully",
        ))),
        Err(CampusError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(
                ErrorCode::AssignmentAlreadyExists,
                "This course already has a teacher for the class",
            ),
        )),
        Err(e) => Ok(error_response(&e, "Failed to assign teacher")),
    }
}

pub async fn list_assignments(
    service: &CourseService,
    request: &HttpRequest,
    query: AssignmentListQuery,
) -> ActixResult<HttpResponse> {
    match service.get_storage(request).list_assignments(query).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AssignmentListResponse { items },
            "Assignments retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, "Failed to list assignments")),
    }
}

pub async fn delete_assignment(
    service: &CourseService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    match service.get_storage(request).delete_assignment(assignment_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Assignment removed"))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::AssignmentNotFound,
            "Assignment not found",
        ))),
        Err(e) => Ok(error_response(&e, "Failed to remove assignment")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{campus, request_as};

    #[tokio::test]
    async fn test_assignment_requires_teacher_role_and_is_unique() {
        let campus = campus().await;
        let service = CourseService::with_deps(campus.storage.clone(), None);
        let req = request_as(&campus.admin);

        let to_student = create_assignment(
            &service,
            &req,
            campus.course_id,
            CreateAssignmentRequest {
                class_id: campus.class_id,
                teacher_id: campus.student_user.id,
            },
        )
        .await
        .unwrap();
        assert_eq!(to_student.status(), 400);

        let duplicate = create_assignment(
            &service,
            &req,
            campus.course_id,
            CreateAssignmentRequest {
                class_id: campus.class_id,
                teacher_id: campus.teacher.id,
            },
        )
        .await
        .unwrap();
        assert_eq!(duplicate.status(), 409);
    }
}
