use crate::error::IntakeError;
use crate::models::status_types::UploadStatus;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an accepted image's bytes come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes { name: String, data: Arc<[u8]> },
}

impl ImageSource {
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        ImageSource::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            ImageSource::Path(path) => path
                .file_name()
                .unwrap_or(path.as_os_str())
                .to_string_lossy()
                .to_string(),
            ImageSource::Bytes { name, .. } => name.clone(),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ImageSnapshot {
    pub id: ImageId,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub status: UploadStatus,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub accepted: Vec<ImageId>,
    pub rejected: Vec<(String, IntakeError)>,
}

impl BatchOutcome {
    pub fn notices(&self) -> Vec<Notice> {
        self.rejected.iter().map(|(_, err)| Notice::from(err)).collect()
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message the presentation layer shows once, e.g. in a dialog.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl From<&IntakeError> for Notice {
    fn from(err: &IntakeError) -> Self {
        let (level, title) = match err {
            IntakeError::CapacityExceeded { .. } => (NoticeLevel::Info, "Limit reached"),
            IntakeError::Decode { .. }
            | IntakeError::Unreadable { .. }
            | IntakeError::NoRuntime => (NoticeLevel::Error, "Error"),
        };
        Notice {
            level,
            title: title.to_string(),
            message: err.to_string(),
        }
    }
}
