//! Write-back of freshly extracted palettes to the banner store.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::db::Repository;
use crate::models::Rgb;

/// Receives palettes that differ from a banner's stored one.
///
/// Called from timer callbacks, so implementations must return immediately.
pub trait PaletteSink: Send + Sync {
    fn publish(&self, banner_id: &str, palette: &[Rgb]);
}

/// Persists palettes through the repository on the tokio runtime.
pub struct RepositoryPaletteSink {
    repo: Arc<Repository>,
    runtime: Handle,
}

impl RepositoryPaletteSink {
    pub fn new(repo: Arc<Repository>, runtime: Handle) -> Self {
        Self { repo, runtime }
    }
}

impl PaletteSink for RepositoryPaletteSink {
    fn publish(&self, banner_id: &str, palette: &[Rgb]) {
        let repo = Arc::clone(&self.repo);
        let banner_id = banner_id.to_string();
        let palette = palette.to_vec();

        self.runtime.spawn(async move {
            match repo.update_palette(&banner_id, &palette).await {
                Ok(_) => tracing::debug!("Stored palette for banner {}", banner_id),
                Err(e) => tracing::warn!("Failed to store palette for banner {}: {}", banner_id, e),
            }
        });
    }
}
