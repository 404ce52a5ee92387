pub mod download;
pub mod upload;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::{CampusError, Result};
use crate::models::files::entities::File;
use crate::storage::Storage;

define_service!(FileService);

/// 上传文件在磁盘上的位置：`{upload.dir}/{token}.bin`
pub(crate) fn stored_path(file_token: &str) -> PathBuf {
    PathBuf::from(&AppConfig::get().upload.dir).join(format!("{file_token}.bin"))
}

/// 按 token 读取已上传文件的记录与内容
pub(crate) async fn read_uploaded(
    storage: &Arc<dyn Storage>,
    file_token: &str,
) -> Result<(File, Vec<u8>)> {
    let file = storage
        .get_file_by_token(file_token)
        .await?
        .ok_or_else(|| CampusError::not_found("File not found"))?;
    let bytes = tokio::fs::read(stored_path(&file.file_token)).await?;
    Ok((file, bytes))
}

impl FileService {
    pub async fn handle_upload(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        upload::handle_upload(self, request, payload).await
    }

    pub async fn handle_download(
        &self,
        request: &HttpRequest,
        file_token: String,
    ) -> ActixResult<HttpResponse> {
        download::handle_download(self, request, file_token).await
    }
}
