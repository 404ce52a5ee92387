//! 班级管理：院系 + 学期 + 分班

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::CampusError;
use crate::models::{
    ApiResponse, ErrorCode,
    classes::{
        entities::{is_valid_semester, normalize_section},
        requests::{ClassListQuery, ClassQueryParams, CreateClassRequest, UpdateClassRequest},
    },
};
use crate::services::error_response;
use crate::storage::Storage;

define_service!(ClassService);

fn invalid(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message))
}

fn already_exists() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::ClassAlreadyExists,
        "A class with this department, semester and section already exists",
    ))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::ClassNotFound,
        "Class not found",
    ))
}

async fn ensure_department(
    storage: &Arc<dyn Storage>,
    department_id: i64,
) -> Result<(), HttpResponse> {
    match storage.get_department_by_id(department_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::DepartmentNotFound,
            "Department not found",
        ))),
        Err(e) => Err(error_response(&e, "Failed to load department")),
    }
}

impl ClassService {
    pub async fn list_classes(
        &self,
        request: &HttpRequest,
        query: ClassQueryParams,
    ) -> ActixResult<HttpResponse> {
        let list_query = ClassListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            department_id: query.department_id,
            semester: query.semester,
        };

        match self
            .get_storage(request)
            .list_classes_with_pagination(list_query)
            .await
        {
            Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                response,
                "Classes retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to list classes")),
        }
    }

    pub async fn create_class(
        &self,
        request: &HttpRequest,
        mut class_data: CreateClassRequest,
    ) -> ActixResult<HttpResponse> {
        if !is_valid_semester(class_data.semester) {
            return Ok(invalid("Semester must be between 1 and 8"));
        }
        class_data.section = normalize_section(&class_data.section);
        if class_data.section.is_empty() {
            return Ok(invalid("Section is required"));
        }

        let storage = self.get_storage(request);
        if let Err(resp) = ensure_department(&storage, class_data.department_id).await {
            return Ok(resp);
        }

        match storage.create_class(class_data).await {
            Ok(class) => {
                tracing::info!(
                    "Class created: dept {} sem {} sec {}",
                    class.department_id,
                    class.semester,
                    class.section
                );
                Ok(HttpResponse::Created()
                    .json(ApiResponse::success(class, "Class created successfully")))
            }
            Err(CampusError::Conflict(_)) => Ok(already_exists()),
            Err(e) => Ok(error_response(&e, "Failed to create class")),
        }
    }

    pub async fn get_class(
        &self,
        request: &HttpRequest,
        class_id: i64,
    ) -> ActixResult<HttpResponse> {
        match self.get_storage(request).get_class_by_id(class_id).await {
            Ok(Some(class)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(class, "Class retrieved successfully"))),
            Ok(None) => Ok(not_found()),
            Err(e) => Ok(error_response(&e, "Failed to get class")),
        }
    }

    pub async fn update_class(
        &self,
        request: &HttpRequest,
        class_id: i64,
        mut update: UpdateClassRequest,
    ) -> ActixResult<HttpResponse> {
        if update.semester.is_some_and(|s| !is_valid_semester(s)) {
            return Ok(invalid("Semester must be between 1 and 8"));
        }
        update.section = update.section.as_deref().map(normalize_section);
        if update.section.as_deref() == Some("") {
            return Ok(invalid("Section cannot be empty"));
        }

        match self.get_storage(request).update_class(class_id, update).await {
            Ok(Some(class)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(class, "Class updated successfully"))),
            Ok(None) => Ok(not_found()),
            Err(CampusError::Conflict(_)) => Ok(already_exists()),
            Err(e) => Ok(error_response(&e, "Failed to update class")),
        }
    }

    pub async fn delete_class(
        &self,
        request: &HttpRequest,
        class_id: i64,
    ) -> ActixResult<HttpResponse> {
        match self.get_storage(request).delete_class(class_id).await {
            Ok(true) => {
                Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                    "Class deleted successfully",
                )))
            }
            Ok(false) => Ok(not_found()),
            Err(e) => Ok(error_response(&e, "Failed to delete class")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{body_json, campus, request_as};

    #[tokio::test]
    async fn test_create_class_rules() {
        let campus = campus().await;
        let service = ClassService::with_deps(campus.storage.clone(), None);
        let req = request_as(&campus.admin);
        let class = campus
            .storage
            .get_class_by_id(campus.class_id)
            .await
            .unwrap()
            .unwrap();

        let request = |semester: i32, section: &str, department_id: i64| CreateClassRequest {
            department_id,
            semester,
            section: section.to_string(),
        };

        let resp = service
            .create_class(&req, request(5, " b ", class.department_id))
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        assert_eq!(body_json(resp).await["data"]["section"], "B");

        let dup = service
            .create_class(&req, request(5, "a", class.department_id))
            .await
            .unwrap();
        assert_eq!(dup.status(), 409);

        let bad_sem = service
            .create_class(&req, request(9, "C", class.department_id))
            .await
            .unwrap();
        assert_eq!(bad_sem.status(), 400);

        let no_dept = service.create_class(&req, request(3, "C", 999)).await.unwrap();
        assert_eq!(no_dept.status(), 404);
    }
}
