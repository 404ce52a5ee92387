//! 用户导出

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::models::users::{
    entities::User,
    requests::{UserExportParams, UserListQuery},
};
use crate::services::error_response;
use crate::utils::{ExportFormat, ExportTable};

/// 单次导出上限
const MAX_EXPORT_ROWS: usize = 10_000;
const PAGE_SIZE: i64 = 100;

pub async fn export_users(
    service: &UserService,
    params: UserExportParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let mut users = Vec::new();
    let mut page = 1;
    loop {
        let query = UserListQuery {
            page: Some(page),
            size: Some(PAGE_SIZE),
            role: params.role.clone(),
            status: params.status.clone(),
            department_id: params.department_id,
            search: params.search.clone(),
        };
        let response = match storage.list_users_with_pagination(query).await {
            Ok(response) => response,
            Err(e) => return Ok(error_response(&e, "Failed to export users")),
        };
        users.extend(response.items);
        if page >= response.pagination.total_pages || users.len() >= MAX_EXPORT_ROWS {
            break;
        }
        page += 1;
    }
    users.truncate(MAX_EXPORT_ROWS);

    user_table(&users).into_response(ExportFormat::parse(params.format.as_deref()))
}

fn user_table(users: &[User]) -> ExportTable {
    ExportTable {
        file_stem: "users",
        headers: &[
            "id",
            "username",
            "email",
            "role",
            "status",
            "display_name",
            "created_at",
        ],
        rows: users
            .iter()
            .map(|user| {
                vec![
                    user.id.to_string(),
                    user.username.clone(),
                    user.email.clone(),
                    user.role.to_string(),
                    user.status.to_string(),
                    user.profile.display_name.clone(),
                    user.created_at.to_rfc3339(),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{campus, request_as};

    #[tokio::test]
    async fn test_export_csv_lists_every_user() {
        let campus = campus().await;
        let service = UserService::with_deps(campus.storage.clone(), None);
        let params = UserExportParams {
            format: Some("csv".to_string()),
            role: None,
            status: None,
            department_id: None,
            search: None,
        };

        let resp = export_users(&service, params, &request_as(&campus.admin))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("id,username,email"));
        assert!(text.contains("teacher1"));
        assert_eq!(text.lines().count(), 4);
    }
}
