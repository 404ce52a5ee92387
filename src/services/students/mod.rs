pub mod enrollments;
pub mod export;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::CampusError;
use crate::models::{
    ApiResponse, ErrorCode,
    students::{
        entities::{Student, normalize_usn},
        requests::{
            CreateStudentRequest, EnrollStudentRequest, StudentExportParams, StudentListQuery,
            StudentQueryParams, UpdateStudentRequest,
        },
    },
};
use crate::models::users::entities::{User, UserRole};
use crate::services::error_response;
use crate::storage::Storage;
use crate::utils::validate::validate_usn;

define_service!(
    /// 学籍管理，管理员维护、教师只读
    StudentService
);

pub(crate) fn student_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::StudentNotFound,
        "Student not found",
    ))
}

async fn ensure_class(storage: &Arc<dyn Storage>, class_id: i64) -> Result<(), HttpResponse> {
    match storage.get_class_by_id(class_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ClassNotFound,
            "Class not found",
        ))),
        Err(e) => Err(error_response(&e, "Failed to load class")),
    }
}

/// 查询考勤、成绩时的目标学生：学生只能查看自己，教职工须指定 USN
pub(crate) async fn resolve_target_student(
    storage: &Arc<dyn Storage>,
    actor: &User,
    usn: Option<&str>,
) -> crate::errors::Result<Student> {
    let usn = usn.map(normalize_usn).filter(|u| !u.is_empty());

    if actor.role == UserRole::Student {
        let own = storage
            .get_student_by_user_id(actor.id)
            .await?
            .ok_or_else(|| CampusError::not_found("No student record is linked to this account"))?;
        if usn.is_some_and(|u| u != own.usn) {
            return Err(CampusError::authorization(
                "Students can only view their own records",
            ));
        }
        return Ok(own);
    }

    let usn = usn.ok_or_else(|| CampusError::validation("Student USN is required"))?;
    storage
        .get_student_by_usn(&usn)
        .await?
        .ok_or_else(|| CampusError::not_found(format!("Student with USN {usn} not found.")))
}

impl StudentService {
    pub async fn list_students(
        &self,
        request: &HttpRequest,
        query: StudentQueryParams,
    ) -> ActixResult<HttpResponse> {
        let list_query = StudentListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            class_id: query.class_id,
            search: query.search,
        };

        match self
            .get_storage(request)
            .list_students_with_pagination(list_query)
            .await
        {
            Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                response,
                "Students retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to list students")),
        }
    }

    pub async fn get_student(
        &self,
        request: &HttpRequest,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        match self.get_storage(request).get_student_detail(student_id).await {
            Ok(Some(detail)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(detail, "Student retrieved successfully"))),
            Ok(None) => Ok(student_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to get student")),
        }
    }

    pub async fn create_student(
        &self,
        request: &HttpRequest,
        mut req: CreateStudentRequest,
    ) -> ActixResult<HttpResponse> {
        req.usn = normalize_usn(&req.usn);
        req.name = req.name.trim().to_string();
        if let Err(msg) = validate_usn(&req.usn) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
        }
        if req.name.is_empty() {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                "Student name is required",
            )));
        }

        let storage = self.get_storage(request);
        if let Err(resp) = ensure_class(&storage, req.class_id).await {
            return Ok(resp);
        }

        match storage.create_student(req).await {
            Ok(student) => Ok(HttpResponse::Created()
                .json(ApiResponse::success(student, "Student created successfully"))),
            Err(CampusError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
                ApiResponse::error_empty(
                    ErrorCode::StudentAlreadyExists,
                    "A student with this USN already exists",
                ),
            )),
            Err(e) => Ok(error_response(&e, "Failed to create student")),
        }
    }

    pub async fn update_student(
        &self,
        request: &HttpRequest,
        student_id: i64,
        mut update: UpdateStudentRequest,
    ) -> ActixResult<HttpResponse> {
        update.name = update.name.map(|n| n.trim().to_string());
        if update.name.as_deref() == Some("") {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                "Student name cannot be empty",
            )));
        }

        let storage = self.get_storage(request);
        if let Some(class_id) = update.class_id
            && let Err(resp) = ensure_class(&storage, class_id).await
        {
            return Ok(resp);
        }

        match storage.update_student(student_id, update).await {
            Ok(Some(student)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(student, "Student updated successfully"))),
            Ok(None) => Ok(student_not_found()),
            Err(CampusError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
                ApiResponse::error_empty(
                    ErrorCode::StudentAlreadyLinked,
                    "This user is already linked to another student",
                ),
            )),
            Err(e) => Ok(error_response(&e, "Failed to update student")),
        }
    }

    pub async fn delete_student(
        &self,
        request: &HttpRequest,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        match self.get_storage(request).delete_student(student_id).await {
            Ok(true) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success_empty("Student deleted successfully"))),
            Ok(false) => Ok(student_not_found()),
            Err(e) => Ok(error_response(&e, "Failed to delete student")),
        }
    }

    pub async fn export_students(
        &self,
        request: &HttpRequest,
        params: StudentExportParams,
    ) -> ActixResult<HttpResponse> {
        export::export_students(self, request, params).await
    }

    pub async fn list_courses(
        &self,
        request: &HttpRequest,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        enrollments::list_courses(self, request, student_id).await
    }

    pub async fn enroll(
        &self,
        request: &HttpRequest,
        student_id: i64,
        req: EnrollStudentRequest,
    ) -> ActixResult<HttpResponse> {
        enrollments::enroll(self, request, student_id, req.course_id).await
    }

    pub async fn unenroll(
        &self,
        request: &HttpRequest,
        student_id: i64,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        enrollments::unenroll(self, request, student_id, course_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{body_json, campus, request_as};

    #[tokio::test]
    async fn test_create_student_normalizes_and_rejects_duplicates() {
        let campus = campus().await;
        let service = StudentService::with_deps(campus.storage.clone(), None);
        let req = request_as(&campus.admin);

        let create = |usn: &str| CreateStudentRequest {
            usn: usn.to_string(),
            name: "Chitra".to_string(),
            class_id: campus.class_id,
            user_id: None,
        };

        let resp = service.create_student(&req, create(" 4kt21cs009 ")).await.unwrap();
        assert_eq!(resp.status(), 201);
        assert_eq!(body_json(resp).await["data"]["usn"], "4KT21CS009");

        let dup = service.create_student(&req, create("4KT21CS009")).await.unwrap();
        assert_eq!(dup.status(), 409);

        let bad = service.create_student(&req, create("no spaces!")).await.unwrap();
        assert_eq!(bad.status(), 400);
    }

    #[tokio::test]
    async fn test_resolve_target_student_scopes_students_to_themselves() {
        let campus = campus().await;

        let own = resolve_target_student(&campus.storage, &campus.student_user, None)
            .await
            .unwrap();
        assert_eq!(own.usn, "4KT21CS001");

        let other =
            resolve_target_student(&campus.storage, &campus.student_user, Some("4KT21CS002"))
                .await
                .unwrap_err();
        assert!(matches!(other, CampusError::Authorization(_)));

        let missing = resolve_target_student(&campus.storage, &campus.teacher, None)
            .await
            .unwrap_err();
        assert!(matches!(missing, CampusError::Validation(_)));

        let by_usn = resolve_target_student(&campus.storage, &campus.teacher, Some("4kt21cs001"))
            .await
            .unwrap();
        assert_eq!(by_usn.id, campus.student_id);
    }

    #[tokio::test]
    async fn test_get_student_returns_class_detail() {
        let campus = campus().await;
        let service = StudentService::with_deps(campus.storage.clone(), None);

        let resp = service
            .get_student(&request_as(&campus.teacher), campus.student_id)
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["semester"], 5);
        assert_eq!(body["data"]["section"], "A");
    }
}
