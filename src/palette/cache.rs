//! Persisted palette cache keyed by media URL.
//!
//! Mirrors the browser's local storage: extracted palettes survive a reload, and
//! media that already decoded once is remembered so its poster can be skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::errors::AppError;
use crate::models::Rgb;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheFile {
    #[serde(default)]
    palettes: BTreeMap<String, Vec<Rgb>>,
    #[serde(default)]
    known_media: BTreeSet<String>,
}

/// Best-effort, last-writer-wins palette cache.
///
/// Inside a tokio runtime the file is written on the blocking pool; snapshots
/// carry a generation so an older one never overwrites a newer one.
pub struct PaletteCache {
    path: Option<PathBuf>,
    entries: RwLock<CacheFile>,
    generation: AtomicU64,
    written: Arc<Mutex<u64>>,
}

impl PaletteCache {
    /// Cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(CacheFile::default()),
            generation: AtomicU64::new(0),
            written: Arc::new(Mutex::new(0)),
        }
    }

    /// Open the cache file at `path`. A missing or unreadable file yields an empty cache.
    pub fn open(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Discarding corrupt palette cache {:?}: {}", path, e);
                CacheFile::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CacheFile::default(),
            Err(e) => {
                tracing::warn!("Failed to read palette cache {:?}: {}", path, e);
                CacheFile::default()
            }
        };

        tracing::debug!(
            "Palette cache loaded with {} palettes",
            entries.palettes.len()
        );

        Self {
            path: Some(path.to_path_buf()),
            entries: RwLock::new(entries),
            generation: AtomicU64::new(0),
            written: Arc::new(Mutex::new(0)),
        }
    }

    pub fn get(&self, media_url: &str) -> Option<Vec<Rgb>> {
        self.entries.read().palettes.get(media_url).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a palette. Returns true when the cached value changed.
    pub fn insert(&self, media_url: &str, palette: &[Rgb]) -> bool {
        let snapshot = {
            let mut entries = self.entries.write();
            if entries.palettes.get(media_url).map(Vec::as_slice) == Some(palette) {
                return false;
            }
            entries
                .palettes
                .insert(media_url.to_string(), palette.to_vec());
            self.snapshot(&entries)
        };
        self.persist(snapshot);
        true
    }

    /// Forget everything cached for a media URL.
    pub fn remove(&self, media_url: &str) {
        let snapshot = {
            let mut entries = self.entries.write();
            let had_palette = entries.palettes.remove(media_url).is_some();
            let was_known = entries.known_media.remove(media_url);
            if !had_palette && !was_known {
                return;
            }
            self.snapshot(&entries)
        };
        self.persist(snapshot);
    }

    /// Record that a media URL decoded its first frame.
    pub fn mark_known(&self, media_url: &str) {
        let snapshot = {
            let mut entries = self.entries.write();
            if !entries.known_media.insert(media_url.to_string()) {
                return;
            }
            self.snapshot(&entries)
        };
        self.persist(snapshot);
    }

    pub fn is_known(&self, media_url: &str) -> bool {
        self.entries.read().known_media.contains(media_url)
    }

    /// Copy the entries under the write lock, tagged with the next generation.
    fn snapshot(&self, entries: &CacheFile) -> (u64, CacheFile) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        (generation, entries.clone())
    }

    fn persist(&self, (generation, snapshot): (u64, CacheFile)) {
        let Some(path) = self.path.clone() else {
            return;
        };
        let written = Arc::clone(&self.written);

        let write = move || {
            let mut last = written.lock();
            if generation <= *last {
                return;
            }
            match write_atomically(&path, &snapshot) {
                Ok(()) => *last = generation,
                Err(e) => tracing::warn!("Failed to persist palette cache {:?}: {}", path, e),
            }
        };

        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(write);
            }
            Err(_) => write(),
        }
    }
}

fn write_atomically(path: &Path, snapshot: &CacheFile) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_vec(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
