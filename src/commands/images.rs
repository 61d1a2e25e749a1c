use crate::error::AppError;
use crate::models::intake_types::{BatchOutcome, ImageId, ImageSnapshot, ImageSource};
use crate::services::fs_service;
use crate::services::intake_service::Intake;
use crate::services::thumbnail_service;
use std::path::PathBuf;

/// Files and folders from the picker or a drop. Folders contribute their
/// image files in name order.
pub fn add_images(intake: &Intake, paths: &[PathBuf]) -> BatchOutcome {
    let files = fs_service::expand_inputs(paths);
    intake.accept_batch(files.into_iter().map(ImageSource::Path))
}

pub fn add_image_bytes(intake: &Intake, name: String, bytes: Vec<u8>) -> BatchOutcome {
    intake.accept_batch(std::iter::once(ImageSource::from_bytes(name, bytes)))
}

pub fn remove_image(intake: &Intake, id: ImageId) -> bool {
    intake.remove(id)
}

pub fn list_images(intake: &Intake) -> Vec<ImageSnapshot> {
    intake.snapshot()
}

/// Whether a drop should be offered a copy cursor at all.
pub fn can_accept_more(intake: &Intake) -> bool {
    !intake.is_full()
}

pub fn get_preview(intake: &Intake, id: ImageId) -> Result<String, AppError> {
    let record = intake
        .get(id)
        .ok_or_else(|| AppError::from(format!("No image {}", id)))?;
    thumbnail_service::preview_data_uri(&record.preview)
}
