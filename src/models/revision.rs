//! Revision information for change detection.

use serde::{Deserialize, Serialize};

/// Current revision of the banner collection; bumped on every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
