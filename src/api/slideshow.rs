//! Slideshow endpoints for the dashboard carousel and the mobile preview.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::palette::Frame;
use crate::slideshow::{Slideshow, SlideshowView, Variant};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct JumpRequest {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct HoverRequest {
    pub hovering: bool,
}

/// Largest frame a client may report, in pixels.
pub const MAX_REPORTED_PIXELS: u64 = 320 * 180;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedRequest {
    pub media_url: String,
}

/// A client's copy of the frame its video element is showing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub media_url: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Result of a navigation request. `changed` is false when the request was ignored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationOutcome {
    pub changed: bool,
    pub view: SlideshowView,
}

/// GET /api/slideshow/:variant - What the slideshow shows right now.
pub async fn get_slideshow(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> ApiResult<SlideshowView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match resolve(&state, &variant) {
        Ok(slideshow) => success(slideshow.view(), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/slideshow/:variant/next
pub async fn next_slide(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> ApiResult<NavigationOutcome> {
    navigate(&state, &variant, Slideshow::advance).await
}

/// POST /api/slideshow/:variant/prev
pub async fn previous_slide(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> ApiResult<NavigationOutcome> {
    navigate(&state, &variant, Slideshow::retreat).await
}

/// POST /api/slideshow/:variant/jump
pub async fn jump_to_slide(
    State(state): State<AppState>,
    Path(variant): Path<String>,
    Json(request): Json<JumpRequest>,
) -> ApiResult<NavigationOutcome> {
    navigate(&state, &variant, |slideshow| slideshow.jump_to(request.index)).await
}

/// POST /api/slideshow/:variant/toggle - Play or pause autoplay.
pub async fn toggle_slideshow(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> ApiResult<SlideshowView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match resolve(&state, &variant) {
        Ok(slideshow) => {
            let playing = slideshow.toggle_play();
            tracing::debug!("Slideshow {} playing: {}", variant, playing);
            success(slideshow.view(), revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/slideshow/:variant/hover - Pointer entered or left the slideshow.
pub async fn set_slideshow_hover(
    State(state): State<AppState>,
    Path(variant): Path<String>,
    Json(request): Json<HoverRequest>,
) -> ApiResult<SlideshowView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match resolve(&state, &variant) {
        Ok(slideshow) => {
            slideshow.set_hovering(request.hovering);
            success(slideshow.view(), revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/slideshow/:variant/decoded - A client decoded the first frame of a video.
pub async fn report_decoded(
    State(state): State<AppState>,
    Path(variant): Path<String>,
    Json(request): Json<DecodedRequest>,
) -> ApiResult<SlideshowView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match resolve_media(&state, &variant, &request.media_url) {
        Ok(slideshow) => {
            slideshow.notify_frame_decoded(&request.media_url);
            success(slideshow.view(), revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/slideshow/:variant/frame - Hand the sampler the frame a client is showing.
pub async fn report_frame(
    State(state): State<AppState>,
    Path(variant): Path<String>,
    Json(report): Json<FrameReport>,
) -> ApiResult<SlideshowView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let slideshow = match resolve_media(&state, &variant, &report.media_url) {
        Ok(slideshow) => slideshow,
        Err(e) => return error(e, revision_id),
    };

    if u64::from(report.width) * u64::from(report.height) > MAX_REPORTED_PIXELS {
        return error(
            AppError::Validation(format!(
                "frame {}x{} exceeds {} pixels",
                report.width, report.height, MAX_REPORTED_PIXELS
            )),
            revision_id,
        );
    }

    let frame = match Frame::new(report.width, report.height, report.rgba) {
        Ok(frame) => frame,
        Err(e) => return error(AppError::Validation(e.to_string()), revision_id),
    };

    state.media.report_frame(&report.media_url, frame);
    slideshow.notify_frame_decoded(&report.media_url);
    tracing::debug!("Frame reported for {} on {}", report.media_url, variant);

    success(slideshow.view(), revision_id)
}

async fn navigate(
    state: &AppState,
    variant: &str,
    step: impl FnOnce(&Slideshow) -> bool,
) -> ApiResult<NavigationOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match resolve(state, variant) {
        Ok(slideshow) => {
            let changed = step(slideshow);
            success(
                NavigationOutcome {
                    changed,
                    view: slideshow.view(),
                },
                revision_id,
            )
        }
        Err(e) => error(e, revision_id),
    }
}

fn resolve<'a>(state: &'a AppState, variant: &str) -> Result<&'a Slideshow, AppError> {
    Variant::from_str(variant)
        .map(|variant| state.slideshows.get(variant))
        .ok_or_else(|| AppError::NotFound(format!("Unknown slideshow variant {}", variant)))
}

/// Resolve the variant and check that it rotates `media_url`.
fn resolve_media<'a>(
    state: &'a AppState,
    variant: &str,
    media_url: &str,
) -> Result<&'a Slideshow, AppError> {
    if media_url.trim().is_empty() {
        return Err(AppError::Validation("mediaUrl is required".to_string()));
    }
    let slideshow = resolve(state, variant)?;
    if !slideshow.shows_media(media_url) {
        return Err(AppError::NotFound(format!(
            "Slideshow {} does not show {}",
            variant, media_url
        )));
    }
    Ok(slideshow)
}
