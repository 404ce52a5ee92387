use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::{
    middlewares::RequireJWT,
    models::{ApiResponse, ErrorCode},
};

pub async fn delete_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    // 管理员不能删除自己
    if RequireJWT::extract_user_id(request) == Some(user_id) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::CanNotDeleteCurrentUser,
            "Cannot delete current user",
        )));
    }

    match service.get_storage(request).delete_user(user_id).await {
        Ok(true) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::UserDeleteFailed,
                format!("User deletion failed: {e}"),
            )),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{campus, request_as};

    #[tokio::test]
    async fn test_admin_cannot_delete_self() {
        let campus = campus().await;
        let service = UserService::with_deps(campus.storage.clone(), None);
        let req = request_as(&campus.admin);

        let resp = delete_user(&service, campus.admin.id, &req).await.unwrap();
        assert_eq!(resp.status(), 400);

        let resp = delete_user(&service, campus.teacher.id, &req).await.unwrap();
        assert_eq!(resp.status(), 200);

        let resp = delete_user(&service, campus.teacher.id, &req).await.unwrap();
        assert_eq!(resp.status(), 404);
    }
}
