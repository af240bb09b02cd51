//! Application state: the checklist, the current photo, and the
//! extraction pipeline, with persistence after every change.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockWriteGuard};

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::checklist::ChecklistModel;
use crate::models::checklist::ChecklistItem;
use crate::pipeline::extraction::{
    build_recognizer, checklist_items, ExtractionCoordinator, Photo, ProgressFn,
};
use crate::pipeline_config::ExtractionConfig;
use crate::store::ChecklistStore;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("An extraction is already in progress")]
    ExtractionInProgress,

    #[error("{0}")]
    Extraction(String),

    #[error("Internal lock poisoned")]
    LockPoisoned,
}

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Single owner of the checklist and photo.
///
/// Checklist mutations are synchronous and persisted best-effort right
/// after they apply. One extraction may run at a time.
pub struct CoreState {
    checklist: RwLock<ChecklistModel>,
    photo: RwLock<Option<Photo>>,
    store: ChecklistStore,
    coordinator: ExtractionCoordinator,
    extracting: AtomicBool,
}

impl CoreState {
    /// Build state over `store`, loading whatever it holds.
    ///
    /// An unreadable checklist is moved aside before starting empty, so the
    /// first save never overwrites data a newer build could still read.
    pub fn new(store: ChecklistStore, coordinator: ExtractionCoordinator) -> Self {
        let items = store.load_items().unwrap_or_else(|e| {
            warn!(error = %e, path = %store.checklist_path().display(), "Could not load checklist");
            if let Err(e) = store.quarantine_checklist() {
                warn!(error = %e, "Failed to move unreadable checklist aside");
            }
            Vec::new()
        });
        let photo = store.load_image().unwrap_or_else(|e| {
            warn!(error = %e, path = %store.image_path().display(), "Could not load saved photo");
            None
        });
        info!(items = items.len(), has_photo = photo.is_some(), "State restored");

        Self {
            checklist: RwLock::new(ChecklistModel::from_items(items)),
            photo: RwLock::new(photo),
            store,
            coordinator,
            extracting: AtomicBool::new(false),
        }
    }

    /// State in the application data directory with the build's recognizer.
    pub fn open_default() -> Self {
        Self::new(
            ChecklistStore::open_default(),
            ExtractionCoordinator::new(build_recognizer()),
        )
    }

    // ── Reads ───────────────────────────────────────────────

    /// Snapshot of the items in display order.
    pub fn items(&self) -> Result<Vec<ChecklistItem>, SessionError> {
        let guard = self.checklist.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(guard.items().to_vec())
    }

    pub fn photo(&self) -> Result<Option<Photo>, SessionError> {
        let guard = self.photo.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(guard.clone())
    }

    pub fn is_extracting(&self) -> bool {
        self.extracting.load(Ordering::Acquire)
    }

    // ── Checklist mutations ─────────────────────────────────

    pub fn add(&self, text: &str) -> Result<Option<Uuid>, SessionError> {
        self.mutate(|model| model.add(text))
    }

    /// Flip the check state and re-sort.
    pub fn toggle(&self, id: Uuid) -> Result<bool, SessionError> {
        self.mutate(|model| {
            let found = model.toggle(id);
            model.sort();
            found
        })
    }

    pub fn edit(&self, id: Uuid, new_text: &str) -> Result<bool, SessionError> {
        self.mutate(|model| model.edit(id, new_text))
    }

    pub fn delete(&self, id: Uuid) -> Result<bool, SessionError> {
        self.mutate(|model| model.delete(id))
    }

    pub fn reorder(&self, from: usize, to: usize) -> Result<bool, SessionError> {
        self.mutate(|model| model.reorder(from, to))
    }

    pub fn move_item(&self, dragged: Uuid, target: Uuid) -> Result<bool, SessionError> {
        self.mutate(|model| model.move_item(dragged, target))
    }

    /// Drop the photo and every item.
    pub fn clear(&self) -> Result<(), SessionError> {
        {
            let mut photo = self.photo.write().map_err(|_| SessionError::LockPoisoned)?;
            *photo = None;
        }
        if let Err(e) = self.store.delete_image() {
            warn!(error = %e, "Failed to delete saved photo");
        }
        self.mutate(ChecklistModel::clear)
    }

    // ── Extraction ──────────────────────────────────────────

    /// Keep `photo`, extract items from it, and on success replace the
    /// checklist with them. On failure the checklist is untouched.
    pub async fn process_photo(
        &self,
        config: &ExtractionConfig,
        photo: Photo,
        progress: ProgressFn<'_>,
    ) -> Result<Vec<ChecklistItem>, SessionError> {
        let _busy = ExtractionGuard::acquire(&self.extracting)?;

        // JPEG encoding and fsync stay off the async workers.
        let store = self.store.clone();
        let to_save = photo.clone();
        match tokio::task::spawn_blocking(move || store.save_image(&to_save)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to persist photo"),
            Err(e) => warn!(error = %e, "Photo save task failed"),
        }
        {
            let mut current = self.photo.write().map_err(|_| SessionError::LockPoisoned)?;
            *current = Some(photo.clone());
        }

        let result = self.coordinator.run(config, &photo, progress).await;
        let items = checklist_items(result).map_err(SessionError::Extraction)?;

        self.mutate(|model| model.replace_with_extracted(items.clone()))?;
        Ok(items)
    }

    // ── Internals ───────────────────────────────────────────

    fn write_checklist(&self) -> Result<RwLockWriteGuard<'_, ChecklistModel>, SessionError> {
        self.checklist.write().map_err(|_| SessionError::LockPoisoned)
    }

    /// Apply `f`, then persist the result. Save failures are logged only.
    fn mutate<R>(&self, f: impl FnOnce(&mut ChecklistModel) -> R) -> Result<R, SessionError> {
        let mut model = self.write_checklist()?;
        let out = f(&mut model);
        if let Err(e) = self.store.save_items(model.items()) {
            warn!(error = %e, "Failed to persist checklist");
        }
        Ok(out)
    }
}

/// Holds the single extraction slot; released on drop.
struct ExtractionGuard<'a>(&'a AtomicBool);

impl<'a> ExtractionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SessionError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::ExtractionInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for ExtractionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
