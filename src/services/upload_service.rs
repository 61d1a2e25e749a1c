use crate::error::AppError;
use crate::models::intake_types::ImageSource;
use crate::services::credential_service::{CredentialProvider, CredentialState};
use crate::services::image_host::{HostResponse, ImageHost};
use crate::services::status_service::StatusHandle;
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Runs the upload for one image and drives its status to a terminal phase.
/// Shared by all upload tasks; holds no per-image state.
#[derive(Clone)]
pub struct Uploader {
    host: Arc<dyn ImageHost>,
    credentials: CredentialProvider,
    chunk_size: usize,
    timeout: Duration,
}

impl Uploader {
    pub fn new(
        host: Arc<dyn ImageHost>,
        credentials: CredentialProvider,
        chunk_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            host,
            credentials,
            chunk_size: chunk_size.max(1),
            timeout,
        }
    }

    /// Never fails: every error ends in the fallback phase and is only logged.
    pub async fn run(&self, source: &ImageSource, status: &StatusHandle) {
        let name = source.display_name();
        status.begin_upload();

        // The key is read once, now. A fetch still in flight counts as no key.
        let key = match self.credentials.state() {
            CredentialState::Present(key) => key,
            CredentialState::Resolving | CredentialState::Absent => {
                log::info!("[upload] {} kept in memory, no upload key", name);
                status.fall_back();
                return;
            }
        };

        match self.try_upload(source, status, &key).await {
            Ok(url) => {
                log::info!("[upload] {} uploaded to {}", name, url);
                status.succeed(url);
            }
            Err(e) => {
                log::warn!("[upload] {} failed, keeping in memory: {}", name, e);
                status.fall_back();
            }
        }
    }

    async fn try_upload(
        &self,
        source: &ImageSource,
        status: &StatusHandle,
        key: &str,
    ) -> Result<String, AppError> {
        let payload = read_with_progress(source, status, self.chunk_size).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&payload);

        let response = tokio::time::timeout(self.timeout, self.host.upload(key, encoded))
            .await
            .map_err(|_| AppError {
                message: format!("Upload timed out after {}s", self.timeout.as_secs_f64()),
            })??;

        parse_upload_response(&response)
    }
}

/// Read the whole source in `chunk_size` pieces, reporting the running
/// percentage after each one.
pub async fn read_with_progress(
    source: &ImageSource,
    status: &StatusHandle,
    chunk_size: usize,
) -> Result<Vec<u8>, AppError> {
    let (mut reader, total) = open_source(source).await?;

    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut payload = Vec::with_capacity(total as usize);
    loop {
        let read = reader.read(&mut buffer).await.map_err(|e| AppError {
            message: format!("Failed to read {}: {}", source.display_name(), e),
        })?;
        if read == 0 {
            break;
        }
        payload.extend_from_slice(&buffer[..read]);
        if total > 0 {
            status.set_progress(payload.len() as f64 / total as f64 * 100.0);
        }
    }

    if payload.is_empty() {
        return Err(format!("{} is empty", source.display_name()).into());
    }
    Ok(payload)
}

type SourceReader<'a> = Box<dyn AsyncRead + Unpin + Send + 'a>;

async fn open_source(source: &ImageSource) -> Result<(SourceReader<'_>, u64), AppError> {
    match source {
        ImageSource::Path(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| AppError {
                message: format!("Failed to open {}: {}", path.display(), e),
            })?;
            let total = file.metadata().await?.len();
            Ok((Box::new(file), total))
        }
        ImageSource::Bytes { data, .. } => Ok((Box::new(&data[..]), data.len() as u64)),
    }
}

/// Accept a response only when it is 2xx and carries the hosted image URL
/// (`data.url`, or a top-level `url`).
pub fn parse_upload_response(response: &HostResponse) -> Result<String, AppError> {
    if !response.is_success() {
        return Err(format!("Upload rejected: HTTP {}", response.status).into());
    }

    let value: serde_json::Value = serde_json::from_str(&response.body)?;
    value
        .pointer("/data/url")
        .or_else(|| value.get("url"))
        .and_then(serde_json::Value::as_str)
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| "Upload response has no url field".into())
}
