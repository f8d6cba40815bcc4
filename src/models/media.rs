//! Uploaded media descriptor.

use serde::Serialize;

use super::MediaType;

/// Response body of a successful media upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpload {
    /// Publicly retrievable URL of the stored file
    pub url: String,
    pub media_type: MediaType,
    pub content_type: String,
    pub size: u64,
}
