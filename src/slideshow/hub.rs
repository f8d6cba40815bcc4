//! The two slideshow variants the dashboard shows side by side.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{MediaBackend, Slideshow, SlideshowConfig, TimerHost};
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::Banner;
use crate::palette::{PaletteCache, PaletteSink};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Dashboard carousel
    Full,
    /// Phone-sized preview
    Mobile,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Full => "full",
            Variant::Mobile => "mobile",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "full" => Some(Variant::Full),
            "mobile" => Some(Variant::Mobile),
            _ => None,
        }
    }
}

/// Full-size and mobile-preview slideshows fed from the same banner list.
pub struct SlideshowHub {
    full: Slideshow,
    mobile: Slideshow,
}

impl SlideshowHub {
    pub fn new(
        timers: Arc<dyn TimerHost>,
        cache: Arc<PaletteCache>,
        media: Option<Arc<dyn MediaBackend>>,
        sink: Option<Arc<dyn PaletteSink>>,
        poster_url: &str,
    ) -> Self {
        let full = Slideshow::new(
            SlideshowConfig::full_size(),
            Arc::clone(&timers),
            Arc::clone(&cache),
            media.clone(),
            sink.clone(),
            poster_url,
        );
        let mobile = Slideshow::new(
            SlideshowConfig::mobile_preview(),
            timers,
            cache,
            media,
            sink,
            poster_url,
        );
        Self { full, mobile }
    }

    pub fn get(&self, variant: Variant) -> &Slideshow {
        match variant {
            Variant::Full => &self.full,
            Variant::Mobile => &self.mobile,
        }
    }

    pub fn set_banners(&self, banners: Vec<Banner>) {
        self.full.set_banners(banners.clone());
        self.mobile.set_banners(banners);
    }

    /// Reload the banners eligible right now. Returns how many were loaded.
    pub async fn refresh(&self, repo: &Repository) -> Result<usize, AppError> {
        let banners = repo.list_eligible_banners(Utc::now()).await?;
        let count = banners.len();
        self.set_banners(banners);
        Ok(count)
    }

    pub fn dispose(&self) {
        self.full.dispose();
        self.mobile.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::{BannerStatus, CreateBannerRequest, MediaType, ScheduleWindow};
    use crate::slideshow::manual::ManualTimerHost;
    use crate::slideshow::SlideshowView;
    use tempfile::TempDir;

    fn request(title: &str, status: BannerStatus) -> CreateBannerRequest {
        CreateBannerRequest {
            media_type: MediaType::Image,
            media_url: format!("https://cdn.example.com/{}.png", title.to_lowercase()),
            title: title.to_string(),
            description: String::new(),
            tags: vec![],
            call_to_action_text: None,
            call_to_action_link: None,
            schedule_window: None,
            status,
        }
    }

    #[test]
    fn test_variant_names() {
        assert_eq!(Variant::from_str("mobile"), Some(Variant::Mobile));
        assert_eq!(Variant::Full.as_str(), "full");
        assert_eq!(Variant::from_str("tablet"), None);
    }

    #[tokio::test]
    async fn test_refresh_loads_only_eligible_banners() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        let repo = Repository::new(pool);

        repo.create_banner(&request("Sports", BannerStatus::Active))
            .await
            .unwrap();
        repo.create_banner(&request("Hidden", BannerStatus::Inactive))
            .await
            .unwrap();
        let mut expired = request("Expired", BannerStatus::Active);
        expired.schedule_window = Some(ScheduleWindow {
            start: None,
            end: Some(Utc::now() - chrono::Duration::days(1)),
        });
        repo.create_banner(&expired).await.unwrap();

        let host = ManualTimerHost::new();
        let hub = SlideshowHub::new(
            host.clone(),
            Arc::new(PaletteCache::in_memory()),
            None,
            None,
            "/poster.png",
        );
        assert_eq!(hub.refresh(&repo).await.unwrap(), 1);

        for variant in [Variant::Full, Variant::Mobile] {
            match hub.get(variant).view() {
                SlideshowView::Slide(slide) => {
                    assert_eq!(slide.title, "Sports");
                    assert_eq!(slide.total, 1);
                }
                SlideshowView::Empty { .. } => panic!("{} slideshow is empty", variant.as_str()),
            }
        }
        assert_eq!(
            hub.get(Variant::Mobile).view().slide().unwrap().viewport.width,
            320
        );
    }
}
