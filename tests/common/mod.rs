//! Shared fixtures for integration tests.

#![allow(dead_code)]

use futures::future::BoxFuture;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use picture_verifier_lib::error::AppError;
use picture_verifier_lib::models::intake_types::ImageSource;
use picture_verifier_lib::services::credential_service::CredentialProvider;
use picture_verifier_lib::services::image_host::{HostResponse, ImageHost, KeySource};
use picture_verifier_lib::services::intake_service::Intake;
use picture_verifier_lib::services::upload_service::Uploader;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const IMGBB_OK: &str =
    r#"{"data":{"id":"2ndCYJK","url":"https://i.ibb.co/w04Prt6/c1f64245afb2.png"},"success":true,"status":200}"#;

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 30, 30])))
        .write_to(&mut out, ImageFormat::Png)
        .expect("png encode should work");
    out.into_inner()
}

pub fn png_source(name: &str) -> ImageSource {
    ImageSource::from_bytes(name, png_bytes(64, 48))
}

/// Image host double that counts calls and can hold replies until released.
pub struct FakeHost {
    pub status: u16,
    pub body: String,
    pub calls: AtomicUsize,
    pub gate: Option<Arc<Notify>>,
}

impl FakeHost {
    pub fn replying(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn gated(status: u16, body: &str, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::replying(status, body)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageHost for FakeHost {
    fn upload<'a>(
        &'a self,
        _key: &'a str,
        _image_base64: String,
    ) -> BoxFuture<'a, Result<HostResponse, AppError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(HostResponse {
                status: self.status,
                body: self.body.clone(),
            })
        })
    }
}

/// Key source that never answers in time.
pub struct HangingKeySource;

impl KeySource for HangingKeySource {
    fn fetch_key(&self) -> BoxFuture<'_, Result<String, AppError>> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too-late".to_string())
        })
    }
}

/// Key source that answers correctly, but only after `delay`.
pub struct DelayedKeySource {
    pub delay: Duration,
}

impl KeySource for DelayedKeySource {
    fn fetch_key(&self) -> BoxFuture<'_, Result<String, AppError>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Ok("late-key".to_string())
        })
    }
}

pub fn intake_with(host: Arc<FakeHost>, credentials: CredentialProvider) -> Intake {
    let uploader = Uploader::new(host, credentials, 8 * 1024, Duration::from_secs(5));
    Intake::new(uploader, 4).expect("runtime is available in tokio tests")
}
