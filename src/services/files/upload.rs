use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{FileService, stored_path};
use crate::config::AppConfig;
use crate::errors::CampusError;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, files::responses::FileUploadResponse};
use crate::services::{system::DynamicConfig, unauthorized};
use crate::utils::file_magic::{extension_of, validate_magic_bytes};

fn upload_failed(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError()
        .json(ApiResponse::error_empty(ErrorCode::FileUploadFailed, message))
}

fn rejected(code: ErrorCode, message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

pub async fn handle_upload(
    service: &FileService,
    req: &HttpRequest,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(req) else {
        return Ok(unauthorized());
    };

    // 目录来自静态配置，大小与类型白名单来自动态配置
    let upload_dir = &AppConfig::get().upload.dir;
    let max_size = DynamicConfig::upload_max_size().await;
    let allowed_types = DynamicConfig::upload_allowed_types().await;

    if let Err(e) = tokio::fs::create_dir_all(upload_dir).await {
        tracing::error!("{}", CampusError::file_operation(format!("{e}")));
        return Ok(upload_failed("Failed to prepare upload directory"));
    }

    let mut original_name = String::new();
    let mut file_size: i64 = 0;
    let mut file_uploaded = false;
    let mut file_type = String::new();
    let mut file_token = String::new();

    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        if name != "file" {
            continue;
        }

        if file_uploaded {
            return Ok(rejected(
                ErrorCode::MultifileUploadNotAllowed,
                "Only one file can be uploaded at a time",
            ));
        }
        file_uploaded = true;

        original_name = content_disposition
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let extension = extension_of(&original_name).unwrap_or_default();
        if !allowed_types.iter().any(|t| t.to_lowercase() == extension) {
            return Ok(rejected(ErrorCode::FileTypeNotAllowed, "File type not allowed"));
        }

        // MIME 类型只做记录
        file_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_default();

        file_token = format!("{}-{}", chrono::Utc::now().timestamp(), Uuid::new_v4());
        let file_path = stored_path(&file_token);
        let mut f = match tokio::fs::File::create(&file_path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::error!("{}", CampusError::file_operation(format!("{e}")));
                return Ok(upload_failed("Failed to create file"));
            }
        };

        let mut total_size: usize = 0;
        let mut first_chunk = true;
        while let Some(chunk) = field.next().await {
            let data = chunk?;

            if first_chunk {
                first_chunk = false;
                if !validate_magic_bytes(&data, &extension) {
                    let _ = tokio::fs::remove_file(&file_path).await;
                    return Ok(rejected(
                        ErrorCode::FileTypeNotAllowed,
                        "File content does not match its extension",
                    ));
                }
            }

            total_size += data.len();
            if total_size > max_size {
                let _ = tokio::fs::remove_file(&file_path).await;
                return Ok(rejected(
                    ErrorCode::FileSizeExceeded,
                    "File size exceeds the limit",
                ));
            }
            f.write_all(&data).await?;
        }
        f.flush().await?;
        file_size = total_size as i64;
    }

    if !file_uploaded {
        return Ok(rejected(
            ErrorCode::FileNotFound,
            "No file found in upload payload",
        ));
    }

    match service
        .get_storage(req)
        .upload_file(&file_token, &original_name, &file_size, &file_type, user_id)
        .await
    {
        Ok(file) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            FileUploadResponse {
                file_token: file.file_token,
                file_name: file.file_name,
                size: file.file_size,
                content_type: file.file_type,
                uploaded_at: file.uploaded_at,
            },
            "File uploaded successfully",
        ))),
        Err(e) => {
            let _ = tokio::fs::remove_file(stored_path(&file_token)).await;
            tracing::error!("Failed to record upload: {}", e);
            Ok(upload_failed(&format!("Failed to upload file: {e}")))
        }
    }
}
