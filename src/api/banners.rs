//! Banner API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    Banner, CreateBannerRequest, RevisionInfo, Rgb, ScheduleWindow, UpdateBannerRequest,
    UpdatePaletteRequest, MAX_STORED_PALETTE,
};
use crate::AppState;

/// GET /api/banners - List all banners, newest first.
pub async fn list_banners(State(state): State<AppState>) -> ApiResult<Vec<Banner>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_banners().await {
        Ok(banners) => success(banners, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/banners/active - Banners eligible for display right now.
pub async fn list_active_banners(State(state): State<AppState>) -> ApiResult<Vec<Banner>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_eligible_banners(Utc::now()).await {
        Ok(banners) => success(banners, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/banners/revision - Current revision, for cheap polling.
pub async fn get_banner_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    match state.repo.get_revision_info().await {
        Ok(info) => {
            let revision_id = info.revision_id;
            success(info, revision_id)
        }
        Err(e) => error(e, 0),
    }
}

/// GET /api/banners/:id - Get a single banner.
pub async fn get_banner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Banner> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_banner(&id).await {
        Ok(Some(banner)) => success(banner, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Banner {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/banners - Create a banner for already uploaded media.
pub async fn create_banner(
    State(state): State<AppState>,
    Json(request): Json<CreateBannerRequest>,
) -> ApiResult<Banner> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.media_url.trim().is_empty() {
        return error(
            AppError::Validation("Media URL is required; upload the media first".to_string()),
            revision_id,
        );
    }
    if request.title.trim().is_empty() {
        return error(
            AppError::Validation("Title is required".to_string()),
            revision_id,
        );
    }
    if let Err(e) = validate_window(request.schedule_window) {
        return error(e, revision_id);
    }

    match state.repo.create_banner(&request).await {
        Ok(banner) => {
            tracing::info!("Created banner {} ({})", banner.id, banner.media_type.as_str());
            refresh_slideshows(&state).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(banner, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/banners/:id - Update a banner's text, schedule or status.
pub async fn update_banner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBannerRequest>,
) -> ApiResult<Banner> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return error(
            AppError::Validation("Title cannot be empty".to_string()),
            revision_id,
        );
    }
    if let Err(e) = validate_window(request.schedule_window) {
        return error(e, revision_id);
    }

    match state.repo.update_banner(&id, &request).await {
        Ok(banner) => {
            refresh_slideshows(&state).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(banner, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/banners/:id - Delete a banner.
pub async fn delete_banner(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_banner(&id).await {
        Ok(banner) => {
            state.palettes.remove(&banner.media_url);
            state.media.forget(&banner.media_url);
            tracing::info!("Deleted banner {}", banner.id);
            refresh_slideshows(&state).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/banners/:id/palette - Store a palette extracted by a client.
pub async fn update_banner_palette(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePaletteRequest>,
) -> ApiResult<Banner> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = validate_palette(&request.palette) {
        return error(e, revision_id);
    }

    match state.repo.update_palette(&id, &request.palette).await {
        Ok(banner) => {
            state.palettes.insert(&banner.media_url, &request.palette);
            refresh_slideshows(&state).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(banner, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

fn validate_window(window: Option<ScheduleWindow>) -> Result<(), AppError> {
    match window {
        Some(window) if !window.is_ordered() => Err(AppError::Validation(
            "Schedule window must start before it ends".to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_palette(palette: &[Rgb]) -> Result<(), AppError> {
    if palette.len() > MAX_STORED_PALETTE {
        return Err(AppError::Validation(format!(
            "A palette holds at most {} colours, got {}",
            MAX_STORED_PALETTE,
            palette.len()
        )));
    }
    Ok(())
}

/// Reload both slideshows after a write. Failures only delay the update until the next refresh.
async fn refresh_slideshows(state: &AppState) {
    if let Err(e) = state.slideshows.refresh(&state.repo).await {
        tracing::warn!("Failed to refresh slideshows: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reversed_window_is_rejected() {
        let start = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let window = ScheduleWindow {
            start: Some(start),
            end: Some(end),
        };

        assert!(validate_window(Some(window)).is_err());
        assert!(validate_window(Some(ScheduleWindow {
            start: Some(end),
            end: Some(start),
        }))
        .is_ok());
        assert!(validate_window(None).is_ok());
    }

    #[test]
    fn test_palette_limit() {
        assert!(validate_palette(&[Rgb::BLACK; 9]).is_ok());
        assert!(validate_palette(&[]).is_ok());
        assert!(matches!(
            validate_palette(&[Rgb::BLACK; 10]),
            Err(AppError::Validation(_))
        ));
    }
}
