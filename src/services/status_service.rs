use crate::models::status_types::{UploadPhase, UploadStatus};
use std::sync::Arc;
use tokio::sync::watch;

/// Highest progress an upload can show before the host confirms it.
pub const MAX_IN_FLIGHT_PERCENT: f64 = 99.0;

/// Writable side of one image's status. The upload pipeline is the only
/// writer; any number of observers can subscribe or poll.
///
/// Every mutation publishes a fresh snapshot, so observers never see a
/// half-applied transition. Mutations after the record was removed from the
/// intake set are accepted and simply go unobserved.
#[derive(Clone)]
pub struct StatusHandle {
    tx: Arc<watch::Sender<UploadStatus>>,
}

impl Default for StatusHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(UploadStatus::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadStatus> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> UploadStatus {
        self.tx.borrow().clone()
    }

    /// Resolves with the terminal status once the upload has finished.
    pub async fn wait_settled(&self) -> UploadStatus {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|s| s.phase.is_terminal()).await.map(|s| s.clone());
        // The sender lives in `self`, so the channel cannot close here.
        settled.unwrap_or_else(|_| self.snapshot())
    }

    pub fn begin_upload(&self) {
        self.tx.send_modify(|s| {
            if s.phase == UploadPhase::Pending {
                s.phase = UploadPhase::Uploading;
                s.progress_percent = 0.0;
                s.progress_visible = true;
            }
        });
    }

    /// Record upload progress. Values are clamped below 100, which only a
    /// confirmed success may reach, and never move backwards.
    pub fn set_progress(&self, percent: f64) {
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, MAX_IN_FLIGHT_PERCENT)
        };
        self.tx.send_if_modified(|s| {
            if s.phase != UploadPhase::Uploading || percent <= s.progress_percent {
                return false;
            }
            s.progress_percent = percent;
            true
        });
    }

    pub fn succeed(&self, remote_url: String) {
        self.finish(|s| {
            s.phase = UploadPhase::Succeeded;
            s.progress_percent = 100.0;
            s.remote_url = Some(remote_url);
        });
    }

    pub fn fall_back(&self) {
        self.finish(|s| {
            s.phase = UploadPhase::Fallback;
            s.remote_url = None;
        });
    }

    fn finish(&self, apply: impl FnOnce(&mut UploadStatus)) {
        self.tx.send_if_modified(|s| {
            if s.phase.is_terminal() {
                return false;
            }
            apply(s);
            s.progress_visible = false;
            true
        });
    }
}
