pub mod assignments;
pub mod slots;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::CampusError;
use crate::models::{
    ApiResponse, ErrorCode,
    classes::entities::is_valid_semester,
    courses::requests::{
        AssignmentListQuery, CourseListQuery, CourseQueryParams, CreateAssignmentRequest,
        CreateCourseRequest, CreateTimetableSlotRequest, UpdateCourseRequest,
    },
};
use crate::services::error_response;

define_service!(
    /// 课程、授课分配与课表时段
    CourseService
);

pub(crate) fn course_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::CourseNotFound,
        "Course not found",
    ))
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message))
}

fn course_exists() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::CourseAlreadyExists,
        "A course with this code or name already exists",
    ))
}

impl CourseService {
    pub async fn list_courses(
        &self,
        request: &HttpRequest,
        query: CourseQueryParams,
    ) -> ActixResult<HttpResponse> {
        let list_query = CourseListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            department_id: query.department_id,
            semester: query.semester,
            search: query.search,
        };

        match self
            .get_storage(request)
            .list_courses_with_pagination(list_query)
            .await
        {
            Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                response,
                "Courses retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to list courses")),
        }
    }

    pub async fn get_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        match self.get_storage(request).get_course_by_id(course_id).await {
            Ok(Some(course)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(course, "Course retrieved successfully"))),
            Ok(None) => Ok(course_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to get course")),
        }
    }

    pub async fn create_course(
        &self,
        request: &HttpRequest,
        mut req: CreateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        req.code = req.code.trim().to_uppercase();
        req.name = req.name.trim().to_string();
        if req.code.is_empty() || req.name.is_empty() {
            return Ok(bad_request("Course code and name are required"));
        }
        if !is_valid_semester(req.semester) {
            return Ok(bad_request("Semester must be between 1 and 8"));
        }
        if req.credits < 0 {
            return Ok(bad_request("Credits cannot be negative"));
        }

        let storage = self.get_storage(request);
        match storage.get_department_by_id(req.department_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::DepartmentNotFound,
                    "Department not found",
                )));
            }
            Err(e) => return Ok(error_response(&e, "Failed to load department")),
        }

        match storage.create_course(req).await {
            Ok(course) => Ok(HttpResponse::Created()
                .json(ApiResponse::success(course, "Course created successfully"))),
            Err(CampusError::Conflict(_)) => Ok(course_exists()),
            Err(e) => Ok(error_response(&e, "Failed to create course")),
        }
    }

    pub async fn update_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
        mut update: UpdateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        update.code = update.code.map(|c| c.trim().to_uppercase());
        update.name = update.name.map(|n| n.trim().to_string());
        if update.code.as_deref() == Some("") || update.name.as_deref() == Some("") {
            return Ok(bad_request("Course code and name cannot be empty"));
        }
        if update.semester.is_some_and(|s| !is_valid_semester(s)) {
            return Ok(bad_request("Semester must be between 1 and 8"));
        }

        match self.get_storage(request).update_course(course_id, update).await {
            Ok(Some(course)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(course, "Course updated successfully"))),
            Ok(None) => Ok(course_not_found()),
            Err(CampusError::Conflict(_)) => Ok(course_exists()),
            Err(e) => Ok(error_response(&e, "Failed to update course")),
        }
    }

    pub async fn delete_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        match self.get_storage(request).delete_course(course_id).await {
            Ok(true) => {
                Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                    "Course deleted successfully",
                )))
            }
            Ok(false) => Ok(course_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to delete course")),
        }
    }

    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        course_id: i64,
        req: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        assignments::create_assignment(self, request, course_id, req).await
    }

    pub async fn list_assignments(
        &self,
        request: &HttpRequest,
        query: AssignmentListQuery,
    ) -> ActixResult<HttpResponse> {
        assignments::list_assignments(self, request, query).await
    }

    pub async fn delete_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        assignments::delete_assignment(self, request, assignment_id).await
    }

    pub async fn create_slot(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: CreateTimetableSlotRequest,
    ) -> ActixResult<HttpResponse> {
        slots::create_slot(self, request, assignment_id, req).await
    }

    pub async fn list_slots(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        slots::list_slots(self, request, assignment_id).await
    }

    pub async fn delete_slot(
        &self,
        request: &HttpRequest,
        slot_id: i64,
    ) -> ActixResult<HttpResponse> {
        slots::delete_slot(self, request, slot_id).await
    }
}
