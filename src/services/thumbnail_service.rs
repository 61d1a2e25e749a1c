use crate::error::AppError;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbaImage};
use std::io::Cursor;
use std::time::Instant;

const PREVIEW_SIZE: u32 = 200;
const PREVIEW_QUALITY: u8 = 60;
const EXIF_HEADER_LIMIT: usize = 128 * 1024;

/// Decoded, display-ready preview of an accepted image.
#[derive(Debug, Clone)]
pub struct Preview {
    pub bitmap: RgbaImage,
    /// Dimensions of the source image after orientation is applied.
    pub width: u32,
    pub height: u32,
}

/// Decode raw bytes into a preview bitmap. The format is sniffed from the
/// content, not from the file name. Respects EXIF orientation.
pub fn decode_preview(bytes: &[u8], name: &str) -> Result<Preview, AppError> {
    let start = Instant::now();

    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError {
            message: format!("Failed to open image {}: {}", name, e),
        })?
        .decode()
        .map_err(|e| AppError {
            message: format!("Failed to decode image {}: {}", name, e),
        })?;

    let orientation = read_orientation(bytes);
    let img = apply_orientation(img, orientation);
    let (width, height) = (img.width(), img.height());

    // Very large inputs go through a cheap nearest-neighbor pass first.
    let intermediate_size = PREVIEW_SIZE * 4;
    let img = if width > intermediate_size * 2 || height > intermediate_size * 2 {
        img.resize(intermediate_size, intermediate_size, FilterType::Nearest)
    } else {
        img
    };
    let bitmap = if img.width() > PREVIEW_SIZE || img.height() > PREVIEW_SIZE {
        img.resize(PREVIEW_SIZE, PREVIEW_SIZE, FilterType::Triangle)
            .into_rgba8()
    } else {
        img.into_rgba8()
    };

    log::debug!(
        "[preview] {} {}x{} decoded in {:.1}ms",
        name,
        width,
        height,
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(Preview {
        bitmap,
        width,
        height,
    })
}

/// Render a preview as a base64 JPEG data URI.
pub fn preview_data_uri(preview: &Preview) -> Result<String, AppError> {
    let rgb = DynamicImage::ImageRgba8(preview.bitmap.clone()).to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, PREVIEW_QUALITY);
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|e| AppError {
            message: format!("Failed to encode preview: {}", e),
        })?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(buffer.into_inner());
    Ok(format!("data:image/jpeg;base64,{}", b64))
}

/// Orientation from the EXIF header, 1 when absent or unreadable.
fn read_orientation(bytes: &[u8]) -> u32 {
    let header = &bytes[..bytes.len().min(EXIF_HEADER_LIMIT)];
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(header)) {
        Ok(e) => e,
        Err(_) => return 1,
    };

    match exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        Some(field) => match field.value {
            exif::Value::Short(ref v) => v.first().copied().map(u32::from).unwrap_or(1),
            exif::Value::Long(ref v) => v.first().copied().unwrap_or(1),
            _ => 1,
        },
        None => 1,
    }
}

fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.fliph().rotate90(),
        6 => img.rotate90(),
        7 => img.fliph().rotate270(),
        8 => img.rotate270(),
        _ => img,
    }
}
