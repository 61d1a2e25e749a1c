use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct AppError {
    pub message: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError {
            message: format!("Malformed response: {}", err),
        }
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError { message: msg }
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError {
            message: msg.to_string(),
        }
    }
}

/// Reasons an image is refused at intake. These are the only failures that
/// reach the user as an explicit notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("You can upload up to {max} images.")]
    CapacityExceeded { max: usize },
    #[error("Failed to load image: {reason}")]
    Decode { name: String, reason: String },
    #[error("Failed to load image: {reason}")]
    Unreadable { name: String, reason: String },
    #[error("Intake needs a running tokio runtime to schedule uploads")]
    NoRuntime,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AskError {
    #[error("Please enter a question.")]
    MissingQuestion,
    #[error("Please upload at least one image.")]
    NoImages,
}
