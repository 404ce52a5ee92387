//! 院系管理

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::CampusError;
use crate::models::{
    ApiResponse, ErrorCode,
    departments::{
        requests::{CreateDepartmentRequest, UpdateDepartmentRequest},
        responses::DepartmentListResponse,
    },
};
use crate::services::error_response;

define_service!(DepartmentService);

/// 院系代码去空白并转大写
fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn already_exists() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::DepartmentAlreadyExists,
        "Department code already exists",
    ))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::DepartmentNotFound,
        "Department not found",
    ))
}

impl DepartmentService {
    pub async fn list_departments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        match self.get_storage(request).list_departments().await {
            Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                DepartmentListResponse { items },
                "Departments retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e, "Failed to list departments")),
        }
    }

    pub async fn get_department(
        &self,
        department_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        match self.get_storage(request).get_department_by_id(department_id).await {
            Ok(Some(department)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                department,
                "Department retrieved successfully",
            ))),
            Ok(None) => Ok(not_found()),
            Err(e) => Ok(error_response(&e, "Failed to get department")),
        }
    }

    pub async fn create_department(
        &self,
        mut req: CreateDepartmentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        req.code = normalize_code(&req.code);
        req.name = req.name.trim().to_string();
        if req.code.is_empty() || req.name.is_empty() {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                "Department code and name are required",
            )));
        }

        match self.get_storage(request).create_department(req).await {
            Ok(department) => Ok(HttpResponse::Created().json(ApiResponse::success(
                department,
                "Department created successfully",
            ))),
            Err(CampusError::Conflict(_)) => Ok(already_exists()),
            Err(e) => Ok(error_response(&e, "Failed to create department")),
        }
    }

    pub async fn update_department(
        &self,
        department_id: i64,
        mut update: UpdateDepartmentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update.code = update.code.as_deref().map(normalize_code);
        update.name = update.name.map(|n| n.trim().to_string());
        if update.code.as_deref() == Some("") || update.name.as_deref() == Some("") {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                "Department code and name cannot be empty",
            )));
        }

        match self
            .get_storage(request)
            .update_department(department_id, update)
            .await
        {
            Ok(Some(department)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                department,
                "Department updated successfully",
            ))),
            Ok(None) => Ok(not_found()),
            Err(CampusError::Conflict(_)) => Ok(already_exists()),
            Err(e) => Ok(error_response(&e, "Failed to update department")),
        }
    }

    pub async fn delete_department(
        &self,
        department_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        match self.get_storage(request).delete_department(department_id).await {
            Ok(true) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success_empty("Department deleted successfully"))),
            Ok(false) => Ok(not_found()),
            Err(e) => Ok(error_response(&e, "Failed to delete department")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{body_json, campus, request_as};

    #[tokio::test]
    async fn test_create_department_normalizes_code() {
        let campus = campus().await;
        let service = DepartmentService::with_deps(campus.storage.clone(), None);
        let req = request_as(&campus.admin);

        let resp = service
            .create_department(
                CreateDepartmentRequest {
                    code: " ece ".to_string(),
                    name: "Electronics".to_string(),
                },
                &req,
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        assert_eq!(body_json(resp).await["data"]["code"], "ECE");

        let dup = service
            .create_department(
                CreateDepartmentRequest {
                    code: "cse".to_string(),
                    name: "Duplicate".to_string(),
                },
                &req,
            )
            .await
            .unwrap();
        assert_eq!(dup.status(), 409);

        let blank = service
            .create_department(
                CreateDepartmentRequest {
                    code: "  ".to_string(),
                    name: "Blank".to_string(),
                },
                &req,
            )
            .await
            .unwrap();
        assert_eq!(blank.status(), 400);
    }
}
