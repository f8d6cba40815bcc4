//! Media upload endpoint. Files are stored under the media directory and served at `/media`.

use std::path::Path;

use axum::extract::{Multipart, State};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{MediaType, MediaUpload};
use crate::AppState;

const FILE_FIELD: &str = "file";

/// POST /api/media - Upload an image or video as multipart field `file`.
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<MediaUpload> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match store_upload(&state, &mut multipart).await {
        Ok(upload) => success(upload, revision_id),
        Err(e) => error(e, revision_id),
    }
}

async fn store_upload(state: &AppState, multipart: &mut Multipart) -> Result<MediaUpload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Upload has no content type".to_string()))?;
        let media_type = MediaType::from_mime(&content_type).ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported media type {}; upload an image or a video",
                content_type
            ))
        })?;
        let extension = field.file_name().and_then(safe_extension);

        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let stem = uuid::Uuid::new_v4().to_string();
        let file_name = match extension {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem,
        };

        tokio::fs::create_dir_all(&state.config.media_dir).await?;
        tokio::fs::write(state.config.media_dir.join(&file_name), &bytes).await?;
        tracing::info!(
            "Stored {} upload {} ({} bytes)",
            media_type.as_str(),
            file_name,
            bytes.len()
        );

        return Ok(MediaUpload {
            url: format!("{}/media/{}", state.config.public_url, file_name),
            media_type,
            content_type,
            size: bytes.len() as u64,
        });
    }

    Err(AppError::Validation(format!(
        "Multipart field '{}' is required",
        FILE_FIELD
    )))
}

/// Lowercased extension of an uploaded file name, if it is short and alphanumeric.
fn safe_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
}
