use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Pending,
    Uploading,
    Succeeded,
    Fallback,
}

impl UploadPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadPhase::Succeeded | UploadPhase::Fallback)
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Gray,
    Green,
    Orange,
}

/// Snapshot of one image's upload lifecycle, as seen by a presentation layer.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct UploadStatus {
    pub phase: UploadPhase,
    pub progress_percent: f64,
    pub remote_url: Option<String>,
    pub progress_visible: bool,
}

impl Default for UploadStatus {
    fn default() -> Self {
        Self {
            phase: UploadPhase::Pending,
            progress_percent: 0.0,
            remote_url: None,
            progress_visible: false,
        }
    }
}

impl UploadStatus {
    pub fn icon(&self) -> &'static str {
        match self.phase {
            UploadPhase::Pending | UploadPhase::Uploading => "⏳",
            UploadPhase::Succeeded => "✔",
            UploadPhase::Fallback => "⚠",
        }
    }

    pub fn color(&self) -> StatusColor {
        match self.phase {
            UploadPhase::Pending | UploadPhase::Uploading => StatusColor::Gray,
            UploadPhase::Succeeded => StatusColor::Green,
            UploadPhase::Fallback => StatusColor::Orange,
        }
    }
}
