//! Database repository for banner CRUD operations.
//!
//! Uses prepared statements and conditional updates for data integrity.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    filter_eligible, Banner, BannerStatus, CreateBannerRequest, MediaType, RevisionInfo, Rgb,
    ScheduleWindow, UpdateBannerRequest,
};

const BANNER_COLUMNS: &str = "id, media_type, media_url, title, description, tags, cta_text, \
     cta_link, schedule_start, schedule_end, status, extracted_palette, created_at, updated_at, \
     version";

/// Database repository for all banner operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(timestamp())
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    /// List all banners, newest first.
    pub async fn list_banners(&self) -> Result<Vec<Banner>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {BANNER_COLUMNS} FROM banners ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(banner_from_row).collect())
    }

    /// List the banners a slideshow may show at `now`, newest first.
    pub async fn list_eligible_banners(&self, now: DateTime<Utc>) -> Result<Vec<Banner>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {BANNER_COLUMNS} FROM banners WHERE status = ? ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(BannerStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;

        let active = rows.iter().map(banner_from_row).collect();
        Ok(filter_eligible(active, now))
    }

    /// Get a banner by ID.
    pub async fn get_banner(&self, id: &str) -> Result<Option<Banner>, AppError> {
        let row = sqlx::query(&format!("SELECT {BANNER_COLUMNS} FROM banners WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(banner_from_row))
    }

    /// Create a new banner.
    pub async fn create_banner(&self, request: &CreateBannerRequest) -> Result<Banner, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();
        let schedule_window = request.schedule_window.filter(|w| !w.is_unbounded());
        let tags_json = serde_json::to_string(&request.tags)?;

        sqlx::query(
            r#"INSERT INTO banners (
                id, media_type, media_url, title, description, tags, cta_text, cta_link,
                schedule_start, schedule_end, status, extracted_palette, created_at, updated_at,
                version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, 1)"#,
        )
        .bind(&id)
        .bind(request.media_type.as_str())
        .bind(request.media_url.trim())
        .bind(request.title.trim())
        .bind(&request.description)
        .bind(&tags_json)
        .bind(non_blank(request.call_to_action_text.clone()))
        .bind(non_blank(request.call_to_action_link.clone()))
        .bind(schedule_window.and_then(|w| w.start).map(format_instant))
        .bind(schedule_window.and_then(|w| w.end).map(format_instant))
        .bind(request.status.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Banner {
            id,
            media_type: request.media_type,
            media_url: request.media_url.trim().to_string(),
            title: request.title.trim().to_string(),
            description: request.description.clone(),
            tags: request.tags.clone(),
            call_to_action_text: non_blank(request.call_to_action_text.clone()),
            call_to_action_link: non_blank(request.call_to_action_link.clone()),
            schedule_window,
            status: request.status,
            extracted_palette: None,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        })
    }

    /// Update a banner with optimistic concurrency control.
    ///
    /// Media URL and media type are fixed for the life of a banner.
    pub async fn update_banner(
        &self,
        id: &str,
        request: &UpdateBannerRequest,
    ) -> Result<Banner, AppError> {
        let existing = self
            .get_banner(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Banner {} not found", id)))?;

        if request.media_type.is_some_and(|t| t != existing.media_type)
            || request
                .media_url
                .as_deref()
                .is_some_and(|url| url.trim() != existing.media_url)
        {
            return Err(AppError::Validation(
                "Banner media cannot be changed; create a new banner instead".to_string(),
            ));
        }

        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let now = timestamp();
        let new_version = existing.version + 1;

        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.title)
            .to_string();
        let description = request
            .description
            .clone()
            .unwrap_or_else(|| existing.description.clone());
        let tags = request.tags.clone().unwrap_or_else(|| existing.tags.clone());
        let call_to_action_text = match &request.call_to_action_text {
            Some(text) => non_blank(Some(text.clone())),
            None => existing.call_to_action_text.clone(),
        };
        let call_to_action_link = match &request.call_to_action_link {
            Some(link) => non_blank(Some(link.clone())),
            None => existing.call_to_action_link.clone(),
        };
        let schedule_window = match request.schedule_window {
            Some(window) if window.is_unbounded() => None,
            Some(window) => Some(window),
            None => existing.schedule_window,
        };
        let status = request.status.unwrap_or(existing.status);
        let tags_json = serde_json::to_string(&tags)?;

        let result = sqlx::query(
            r#"UPDATE banners SET
                title = ?, description = ?, tags = ?, cta_text = ?, cta_link = ?,
                schedule_start = ?, schedule_end = ?, status = ?, updated_at = ?, version = ?
            WHERE id = ? AND version = ?"#,
        )
        .bind(&title)
        .bind(&description)
        .bind(&tags_json)
        .bind(&call_to_action_text)
        .bind(&call_to_action_link)
        .bind(schedule_window.and_then(|w| w.start).map(format_instant))
        .bind(schedule_window.and_then(|w| w.end).map(format_instant))
        .bind(status.as_str())
        .bind(&now)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Version changed between read and write
            let current = self.get_banner(id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|b| b.version).unwrap_or(0),
            });
        }

        self.increment_revision().await?;

        Ok(Banner {
            title,
            description,
            tags,
            call_to_action_text,
            call_to_action_link,
            schedule_window,
            status,
            updated_at: now,
            version: new_version,
            ..existing
        })
    }

    /// Replace a banner's extracted palette. Last writer wins; the version is untouched.
    pub async fn update_palette(&self, id: &str, palette: &[Rgb]) -> Result<Banner, AppError> {
        let palette_json = serde_json::to_string(palette)?;
        let now = timestamp();

        let result =
            sqlx::query("UPDATE banners SET extracted_palette = ?, updated_at = ? WHERE id = ?")
                .bind(&palette_json)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Banner {} not found", id)));
        }

        self.increment_revision().await?;

        self.get_banner(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Banner {} not found", id)))
    }

    /// Delete a banner, returning the removed record.
    pub async fn delete_banner(&self, id: &str) -> Result<Banner, AppError> {
        let existing = self
            .get_banner(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Banner {} not found", id)))?;

        let result = sqlx::query("DELETE FROM banners WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Banner {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(existing)
    }
}

// Helper functions for row conversion

fn banner_from_row(row: &sqlx::sqlite::SqliteRow) -> Banner {
    let media_type: String = row.get("media_type");
    let status: String = row.get("status");
    let tags: String = row.get("tags");
    let palette: Option<String> = row.get("extracted_palette");
    let start: Option<String> = row.get("schedule_start");
    let end: Option<String> = row.get("schedule_end");

    let schedule_window = ScheduleWindow {
        start: start.as_deref().and_then(parse_instant),
        end: end.as_deref().and_then(parse_instant),
    };

    Banner {
        id: row.get("id"),
        media_type: MediaType::from_str(&media_type).unwrap_or(MediaType::Image),
        media_url: row.get("media_url"),
        title: row.get("title"),
        description: row.get("description"),
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        call_to_action_text: row.get("cta_text"),
        call_to_action_link: row.get("cta_link"),
        schedule_window: (!schedule_window.is_unbounded()).then_some(schedule_window),
        status: BannerStatus::from_str(&status).unwrap_or(BannerStatus::Inactive),
        extracted_palette: palette.and_then(|p| serde_json::from_str(&p).ok()),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
