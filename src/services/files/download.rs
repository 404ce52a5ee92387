use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};

use super::{FileService, read_uploaded};
use crate::errors::CampusError;
use crate::models::{ApiResponse, ErrorCode};

pub async fn handle_download(
    service: &FileService,
    request: &HttpRequest,
    file_token: String,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let (file, bytes) = match read_uploaded(&storage, &file_token).await {
        Ok(found) => found,
        Err(CampusError::NotFound(_)) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::FileNotFound,
                "File not found",
            )));
        }
        Err(CampusError::FileOperation(e)) => {
            tracing::error!("Stored file {} unreadable: {}", file_token, e);
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::FileNotFound,
                "File content is missing",
            )));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("File query failed: {e}"),
                )),
            );
        }
    };

    // 下载时使用原始文件名
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "application/octet-stream"))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        ))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{campus, request_as};

    #[tokio::test]
    async fn test_download_unknown_token_is_not_found() {
        let campus = campus().await;
        let service = FileService::with_deps(campus.storage.clone(), None);
        let resp = handle_download(&service, &request_as(&campus.teacher), "missing".to_string())
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_download_returns_original_name() {
        let campus = campus().await;
        let token = format!("test-{}", uuid::Uuid::new_v4());
        let path = crate::services::files::stored_path(&token);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"%PDF-1.4 notes").await.unwrap();
        campus
            .storage
            .upload_file(&token, "unit1.pdf", &14, "application/pdf", campus.teacher.id)
            .await
            .unwrap();

        let service = FileService::with_deps(campus.storage.clone(), None);
        let resp = handle_download(&service, &request_as(&campus.teacher), token)
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("unit1.pdf"));
        let _ = tokio::fs::remove_file(path).await;
    }
}
