use crate::error::AppError;
use crate::models::intake_types::{Notice, NoticeLevel};
use crate::services::image_host::KeySource;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState {
    Resolving,
    Present(String),
    /// Fetch failed or was skipped. Permanent for the process lifetime.
    Absent,
}

/// Holds the upload API key fetched once at startup. Cheap to clone; all
/// clones observe the same fetch.
#[derive(Clone)]
pub struct CredentialProvider {
    state: watch::Receiver<CredentialState>,
    notice: Arc<Mutex<Option<Notice>>>,
}

impl CredentialProvider {
    /// Start the one-shot key fetch in the background. Must be called from
    /// within a tokio runtime.
    pub fn spawn(source: Arc<dyn KeySource>, timeout: Duration) -> Self {
        let (tx, rx) = watch::channel(CredentialState::Resolving);
        let notice = Arc::new(Mutex::new(None));
        let notice_slot = notice.clone();

        tokio::spawn(async move {
            let resolved = match fetch(source.as_ref(), timeout).await {
                Ok(key) => {
                    log::info!("Upload key fetched ({} chars)", key.len());
                    CredentialState::Present(key)
                }
                Err(e) => {
                    log::warn!("Could not fetch upload key, uploads will fall back: {}", e);
                    let mut slot = notice_slot.lock().unwrap_or_else(|p| p.into_inner());
                    *slot = Some(Notice {
                        level: NoticeLevel::Warning,
                        title: "ImgBB Key".to_string(),
                        message: format!(
                            "Could not fetch ImgBB API key. Will use in-memory fallback.\n{}",
                            e
                        ),
                    });
                    CredentialState::Absent
                }
            };
            let _ = tx.send(resolved);
        });

        Self { state: rx, notice }
    }

    /// An already-resolved provider; `None` means fallback mode.
    pub fn fixed(key: Option<String>) -> Self {
        let state = match key.as_deref().and_then(normalize_key) {
            Some(k) => CredentialState::Present(k),
            None => CredentialState::Absent,
        };
        let (_tx, rx) = watch::channel(state);
        Self {
            state: rx,
            notice: Arc::new(Mutex::new(None)),
        }
    }

    pub fn state(&self) -> CredentialState {
        self.state.borrow().clone()
    }

    /// The key once the startup fetch has resolved.
    pub async fn current(&self) -> Option<String> {
        let mut rx = self.state.clone();
        let resolved = rx
            .wait_for(|s| *s != CredentialState::Resolving)
            .await
            .map(|s| s.clone())
            .unwrap_or(CredentialState::Absent);
        match resolved {
            CredentialState::Present(key) => Some(key),
            _ => None,
        }
    }

    /// The fetch-failure notice, handed out at most once.
    pub fn take_notice(&self) -> Option<Notice> {
        self.notice.lock().unwrap_or_else(|p| p.into_inner()).take()
    }
}

/// One bounded read of the key source. Timeouts, transport errors, non-2xx
/// answers and blank bodies are all errors.
pub async fn fetch(source: &dyn KeySource, timeout: Duration) -> Result<String, AppError> {
    let raw = tokio::time::timeout(timeout, source.fetch_key())
        .await
        .map_err(|_| AppError {
            message: format!("Key fetch timed out after {}s", timeout.as_secs_f64()),
        })??;
    normalize_key(&raw).ok_or_else(|| "Key source returned an empty body".into())
}

pub fn normalize_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        None
    } else {
        Some(trimmed.to_string())
    }
}
