//! Banner model matching the dashboard's banner records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Rgb;

/// Kind of media a banner displays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaType::Image),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }

    /// Media type for an uploaded file's MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(MediaType::Image)
        } else if mime.starts_with("video/") {
            Some(MediaType::Video)
        } else {
            None
        }
    }
}

/// Publication status set by the operator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BannerStatus {
    #[default]
    Active,
    Inactive,
}

impl BannerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BannerStatus::Active => "active",
            BannerStatus::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(BannerStatus::Active),
            "inactive" => Some(BannerStatus::Inactive),
            _ => None,
        }
    }
}

/// Time window during which a banner may be shown. Missing bounds are open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl ScheduleWindow {
    /// Both bounds are inclusive.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| start <= now) && self.end.map_or(true, |end| now <= end)
    }

    pub fn is_ordered(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// A promotional or announcement media item rotated in the slideshow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: String,
    pub media_type: MediaType,
    pub media_url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_to_action_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_to_action_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_window: Option<ScheduleWindow>,
    pub status: BannerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_palette: Option<Vec<Rgb>>,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

impl Banner {
    /// Whether the banner may be handed to a slideshow at `now`.
    pub fn is_eligible_at(&self, now: DateTime<Utc>) -> bool {
        self.status == BannerStatus::Active
            && self.schedule_window.map_or(true, |window| window.contains(now))
    }

    /// Only the first tag is displayed on a slide.
    pub fn first_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// Stored palette, treating an empty list as absent.
    pub fn palette(&self) -> Option<&[Rgb]> {
        self.extracted_palette
            .as_deref()
            .filter(|palette| !palette.is_empty())
    }
}

/// Restrict a banner list to those eligible at `now`, keeping order.
pub fn filter_eligible(banners: Vec<Banner>, now: DateTime<Utc>) -> Vec<Banner> {
    banners
        .into_iter()
        .filter(|banner| banner.is_eligible_at(now))
        .collect()
}

/// Request body for creating a banner after its media was uploaded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBannerRequest {
    pub media_type: MediaType,
    pub media_url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub call_to_action_text: Option<String>,
    #[serde(default)]
    pub call_to_action_link: Option<String>,
    #[serde(default)]
    pub schedule_window: Option<ScheduleWindow>,
    #[serde(default)]
    pub status: BannerStatus,
}

/// Request body for editing a banner.
///
/// `mediaType` and `mediaUrl` are accepted only when they repeat the stored values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBannerRequest {
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub call_to_action_text: Option<String>,
    #[serde(default)]
    pub call_to_action_link: Option<String>,
    #[serde(default)]
    pub schedule_window: Option<ScheduleWindow>,
    #[serde(default)]
    pub status: Option<BannerStatus>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for the palette write-back.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaletteRequest {
    pub palette: Vec<Rgb>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn banner(status: BannerStatus, window: Option<ScheduleWindow>) -> Banner {
        Banner {
            id: "b1".to_string(),
            media_type: MediaType::Image,
            media_url: "https://cdn.example.com/open-day.jpg".to_string(),
            title: "Open Day".to_string(),
            description: String::new(),
            tags: vec!["Events".to_string(), "Admissions".to_string()],
            call_to_action_text: None,
            call_to_action_link: None,
            schedule_window: window,
            status,
            extracted_palette: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            version: 1,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_window_is_always_eligible() {
        assert!(banner(BannerStatus::Active, None).is_eligible_at(noon()));
        assert!(!banner(BannerStatus::Inactive, None).is_eligible_at(noon()));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = ScheduleWindow {
            start: Some(noon()),
            end: Some(noon() + Duration::hours(1)),
        };
        assert!(window.contains(noon()));
        assert!(window.contains(noon() + Duration::hours(1)));
        assert!(!window.contains(noon() - Duration::seconds(1)));
        assert!(!window.contains(noon() + Duration::minutes(61)));
    }

    #[test]
    fn test_open_ended_windows() {
        let from_noon = ScheduleWindow {
            start: Some(noon()),
            end: None,
        };
        assert!(from_noon.contains(noon() + Duration::days(365)));
        assert!(!from_noon.contains(noon() - Duration::days(1)));
        assert!(ScheduleWindow::default().contains(noon()));
    }

    #[test]
    fn test_filter_drops_expired_and_inactive_banners() {
        let expired = ScheduleWindow {
            start: Some(noon() - Duration::days(7)),
            end: Some(noon() - Duration::days(1)),
        };
        let mut current = banner(BannerStatus::Active, None);
        current.id = "current".to_string();
        let mut past = banner(BannerStatus::Active, Some(expired));
        past.id = "past".to_string();
        let mut hidden = banner(BannerStatus::Inactive, None);
        hidden.id = "hidden".to_string();

        let eligible = filter_eligible(vec![past, current, hidden], noon());
        let ids: Vec<&str> = eligible.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["current"]);
    }

    #[test]
    fn test_window_ordering() {
        let reversed = ScheduleWindow {
            start: Some(noon()),
            end: Some(noon() - Duration::hours(1)),
        };
        assert!(!reversed.is_ordered());
        assert!(ScheduleWindow::default().is_ordered());
    }

    #[test]
    fn test_first_tag_and_empty_palette() {
        let mut b = banner(BannerStatus::Active, None);
        assert_eq!(b.first_tag(), Some("Events"));
        b.extracted_palette = Some(vec![]);
        assert!(b.palette().is_none());
    }

    #[test]
    fn test_media_type_from_mime() {
        assert_eq!(MediaType::from_mime("image/png"), Some(MediaType::Image));
        assert_eq!(MediaType::from_mime("video/mp4"), Some(MediaType::Video));
        assert_eq!(MediaType::from_mime("application/pdf"), None);
    }

    #[test]
    fn test_banner_json_shape() {
        let json = serde_json::to_value(banner(BannerStatus::Active, None)).unwrap();
        assert_eq!(json["mediaType"], "image");
        assert_eq!(json["status"], "active");
        assert!(json.get("scheduleWindow").is_none());
    }
}
