use crate::error::AppError;
use std::path::{Path, PathBuf};

/// Formats offered by the file picker and picked up from dropped folders.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// List image files directly inside `path`, sorted case-insensitively by name.
/// Hidden files and subdirectories are skipped.
pub fn list_image_files(path: &Path) -> Result<Vec<PathBuf>, AppError> {
    if !path.is_dir() {
        return Err(format!("Not a directory: {}", path.display()).into());
    }

    let read_dir = std::fs::read_dir(path).map_err(|e| AppError {
        message: format!("Cannot read directory {}: {}", path.display(), e),
    })?;

    let mut images = Vec::new();
    for entry in read_dir {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let ft = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };
        if !ft.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }

        let entry_path = entry.path();
        if is_image_file(&entry_path) {
            images.push(entry_path);
        }
    }

    images.sort_by_key(|p| {
        p.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_lowercase()
    });

    Ok(images)
}

/// Flatten a mix of files and folders into the files to offer to intake.
/// Files are passed through untouched so that intake reports decode errors
/// for them; folders contribute only their image files.
pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            match list_image_files(input) {
                Ok(found) => {
                    log::debug!("Found {} image files in {}", found.len(), input.display());
                    files.extend(found);
                }
                Err(e) => log::warn!("Skipping folder {}: {}", input.display(), e),
            }
        } else {
            files.push(input.clone());
        }
    }
    files
}
