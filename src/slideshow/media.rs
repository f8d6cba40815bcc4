//! Host for the media elements a slideshow presents.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::errors::MediaError;
use crate::palette::Frame;

/// Playback and frame capture for media identified by URL.
///
/// Calls arrive from timer callbacks and must not block.
pub trait MediaBackend: Send + Sync {
    /// Start playback of a video. Hosts may reject it, for example under an autoplay policy.
    fn play(&self, media_url: &str) -> Result<(), MediaError>;

    /// Pause a video. Pausing something that is not playing is a no-op.
    fn pause(&self, media_url: &str);

    /// The frame currently displayed by the video element.
    fn capture_frame(&self, media_url: &str) -> Result<Frame, MediaError>;
}

/// Backend for a server that has no decoder of its own.
///
/// Clients showing the slideshow report the frame their video element displays, and the
/// sampler reads the most recent one back. Playback is tracked by the clients themselves.
#[derive(Default)]
pub struct ReportedMedia {
    frames: RwLock<HashMap<String, Frame>>,
}

impl ReportedMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the frame last reported for `media_url`.
    pub fn report_frame(&self, media_url: &str, frame: Frame) {
        self.frames.write().insert(media_url.to_string(), frame);
    }

    /// Drop the stored frame, e.g. when the banner using it is deleted.
    pub fn forget(&self, media_url: &str) {
        self.frames.write().remove(media_url);
    }
}

impl MediaBackend for ReportedMedia {
    fn play(&self, media_url: &str) -> Result<(), MediaError> {
        tracing::debug!("Clients asked to play {}", media_url);
        Ok(())
    }

    fn pause(&self, media_url: &str) {
        tracing::debug!("Clients asked to pause {}", media_url);
    }

    fn capture_frame(&self, media_url: &str) -> Result<Frame, MediaError> {
        self.frames
            .read()
            .get(media_url)
            .cloned()
            .ok_or_else(|| {
                MediaError::FrameUnavailable(format!("no frame reported for {}", media_url))
            })
    }
}
