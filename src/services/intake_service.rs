use crate::error::IntakeError;
use crate::models::intake_types::{BatchOutcome, ImageId, ImageSnapshot, ImageSource};
use crate::models::status_types::UploadStatus;
use crate::services::status_service::StatusHandle;
use crate::services::thumbnail_service::{self, Preview};
use crate::services::upload_service::Uploader;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::watch;

/// An accepted image. The preview is decoded once at intake and never again.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub id: ImageId,
    pub source: ImageSource,
    pub preview: Arc<Preview>,
}

struct Entry {
    record: ImageRecord,
    status: StatusHandle,
}

/// The bounded, ordered set of accepted images and their upload statuses.
///
/// Membership changes go through a single mutex. Upload tasks never touch the
/// set: each one owns only the status handle of its own image, so removing an
/// image while it uploads just detaches that status.
#[derive(Clone)]
pub struct Intake {
    entries: Arc<Mutex<Vec<Entry>>>,
    next_id: Arc<AtomicU64>,
    capacity: usize,
    uploader: Uploader,
    runtime: Handle,
}

impl Intake {
    /// Captures the current tokio runtime, on which uploads will be spawned.
    pub fn new(uploader: Uploader, capacity: usize) -> Result<Self, IntakeError> {
        let runtime = Handle::try_current().map_err(|_| IntakeError::NoRuntime)?;
        Ok(Self::with_runtime(uploader, capacity, runtime))
    }

    pub fn with_runtime(uploader: Uploader, capacity: usize, runtime: Handle) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            capacity,
            uploader,
            runtime,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Decode and register one image, then start its upload in the
    /// background. Returns before the upload finishes.
    pub fn accept(&self, source: ImageSource) -> Result<ImageId, IntakeError> {
        let name = source.display_name();
        if self.is_full() {
            return Err(IntakeError::CapacityExceeded { max: self.capacity });
        }

        let bytes = read_source(&source, &name)?;
        let preview =
            thumbnail_service::decode_preview(&bytes, &name).map_err(|e| IntakeError::Decode {
                name: name.clone(),
                reason: e.message,
            })?;

        let status = StatusHandle::new();
        let id = {
            let mut entries = self.lock();
            // Re-check: another caller may have filled the last slot while we decoded.
            if entries.len() >= self.capacity {
                return Err(IntakeError::CapacityExceeded { max: self.capacity });
            }
            let id = ImageId(self.next_id.fetch_add(1, Ordering::Relaxed));
            entries.push(Entry {
                record: ImageRecord {
                    id,
                    source: source.clone(),
                    preview: Arc::new(preview),
                },
                status: status.clone(),
            });
            id
        };

        log::info!("[intake] accepted {} as {}", name, id);
        let uploader = self.uploader.clone();
        self.runtime.spawn(async move {
            uploader.run(&source, &status).await;
        });

        Ok(id)
    }

    /// Accept sources one at a time. Once the set is full, every remaining
    /// source is rejected on its own, so a large drop is truncated rather
    /// than refused as a whole.
    pub fn accept_batch<I>(&self, sources: I) -> BatchOutcome
    where
        I: IntoIterator<Item = ImageSource>,
    {
        let mut outcome = BatchOutcome::default();
        for source in sources {
            let name = source.display_name();
            match self.accept(source) {
                Ok(id) => outcome.accepted.push(id),
                Err(e) => {
                    log::warn!("[intake] rejected {}: {}", name, e);
                    outcome.rejected.push((name, e));
                }
            }
        }
        outcome
    }

    /// Drop an image from the set. An upload still running for it finishes
    /// unobserved.
    pub fn remove(&self, id: ImageId) -> bool {
        let mut entries = self.lock();
        match entries.iter().position(|e| e.record.id == id) {
            Some(index) => {
                let entry = entries.remove(index);
                log::info!(
                    "[intake] removed {} while {:?}",
                    id,
                    entry.status.snapshot().phase
                );
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ImageId) -> Option<ImageRecord> {
        self.lock()
            .iter()
            .find(|e| e.record.id == id)
            .map(|e| e.record.clone())
    }

    /// Accepted records in arrival order.
    pub fn records(&self) -> Vec<ImageRecord> {
        self.lock().iter().map(|e| e.record.clone()).collect()
    }

    pub fn status(&self, id: ImageId) -> Option<UploadStatus> {
        self.lock()
            .iter()
            .find(|e| e.record.id == id)
            .map(|e| e.status.snapshot())
    }

    pub fn subscribe(&self, id: ImageId) -> Option<watch::Receiver<UploadStatus>> {
        self.lock()
            .iter()
            .find(|e| e.record.id == id)
            .map(|e| e.status.subscribe())
    }

    pub fn snapshot(&self) -> Vec<ImageSnapshot> {
        self.lock()
            .iter()
            .map(|e| ImageSnapshot {
                id: e.record.id,
                name: e.record.source.display_name(),
                width: e.record.preview.width,
                height: e.record.preview.height,
                status: e.status.snapshot(),
            })
            .collect()
    }

    /// Wait until every image currently in the set has a terminal status.
    pub async fn wait_for_uploads(&self) {
        let pending: Vec<StatusHandle> = self.lock().iter().map(|e| e.status.clone()).collect();
        for status in pending {
            status.wait_settled().await;
        }
    }
}

fn read_source(source: &ImageSource, name: &str) -> Result<Arc<[u8]>, IntakeError> {
    match source {
        ImageSource::Path(path) => std::fs::read(path)
            .map(Arc::from)
            .map_err(|e| IntakeError::Unreadable {
                name: name.to_string(),
                reason: format!("{}: {}", path.display(), e),
            }),
        ImageSource::Bytes { data, .. } => Ok(data.clone()),
    }
}
