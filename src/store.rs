//! Durable storage for the checklist and the last captured photo.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config;
use crate::models::checklist::ChecklistItem;
use crate::pipeline::extraction::{Photo, JPEG_QUALITY};

/// Current on-disk checklist format.
pub const STORE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checklist data is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Checklist file version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Image error: {0}")]
    Image(String),
}

/// Versioned wrapper written to the checklist file.
#[derive(Debug, Serialize, Deserialize)]
struct StoredChecklist {
    version: u32,
    saved_at: DateTime<Utc>,
    items: Vec<ChecklistItem>,
}

/// Filesystem-backed store: one JSON file for items, one JPEG for the photo.
#[derive(Debug, Clone)]
pub struct ChecklistStore {
    checklist_path: PathBuf,
    image_path: PathBuf,
}

impl ChecklistStore {
    /// Store rooted at `dir` using the standard file names.
    pub fn new(dir: &Path) -> Self {
        Self {
            checklist_path: dir.join(config::CHECKLIST_FILE),
            image_path: dir.join(config::IMAGE_FILE),
        }
    }

    /// Store in the application data directory.
    pub fn open_default() -> Self {
        Self::new(&config::app_data_dir())
    }

    pub fn checklist_path(&self) -> &Path {
        &self.checklist_path
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    // ── Checklist ──

    /// Items in stored order. A missing file is an empty list.
    ///
    /// A bare JSON array (no version wrapper) is accepted as the legacy format.
    pub fn load_items(&self) -> Result<Vec<ChecklistItem>, StoreError> {
        if !self.checklist_path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.checklist_path)?;

        match serde_json::from_str::<StoredChecklist>(&json) {
            Ok(stored) if stored.version > STORE_VERSION => Err(StoreError::UnsupportedVersion {
                found: stored.version,
                supported: STORE_VERSION,
            }),
            Ok(stored) => {
                debug!(items = stored.items.len(), saved_at = %stored.saved_at, "Checklist loaded");
                Ok(stored.items)
            }
            Err(_) => {
                let items: Vec<ChecklistItem> = serde_json::from_str(&json)?;
                info!(items = items.len(), "Loaded unversioned checklist");
                Ok(items)
            }
        }
    }

    pub fn save_items(&self, items: &[ChecklistItem]) -> Result<(), StoreError> {
        let stored = StoredChecklist {
            version: STORE_VERSION,
            saved_at: Utc::now(),
            items: items.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&stored)?;
        atomic_write(&self.checklist_path, &json)?;
        debug!(items = items.len(), "Checklist saved");
        Ok(())
    }

    /// Move an unreadable checklist file aside as `checklist.json.bak-<timestamp>`
    /// so the next save cannot overwrite it. Returns the new path, or `None`
    /// when there is no file.
    pub fn quarantine_checklist(&self) -> Result<Option<PathBuf>, StoreError> {
        if !self.checklist_path.exists() {
            return Ok(None);
        }
        let mut name = self.checklist_path.as_os_str().to_owned();
        name.push(format!(".bak-{}", Utc::now().format("%Y%m%d%H%M%S%3f")));
        let backup = PathBuf::from(name);

        fs::rename(&self.checklist_path, &backup)?;
        warn!(backup = %backup.display(), "Unreadable checklist moved aside");
        Ok(Some(backup))
    }

    // ── Photo ──

    /// Write the photo as JPEG, replacing any previous one.
    pub fn save_image(&self, photo: &Photo) -> Result<(), StoreError> {
        let jpeg = photo
            .encode_jpeg(JPEG_QUALITY)
            .map_err(|e| StoreError::Image(e.to_string()))?;
        atomic_write(&self.image_path, &jpeg)?;
        debug!(bytes = jpeg.len(), "Photo saved");
        Ok(())
    }

    /// The stored photo, if any.
    pub fn load_image(&self) -> Result<Option<Photo>, StoreError> {
        if !self.image_path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.image_path)?;
        Photo::decode(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Image(e.to_string()))
    }

    /// Remove the stored photo. Missing is fine.
    pub fn delete_image(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.image_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write via a sibling temp file and rename, so readers never see a partial file.
fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}
