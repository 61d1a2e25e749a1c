//! HTTP seams for the two remote services: the plain-text key source and the
//! image host's upload endpoint.

use crate::error::AppError;
use futures::future::BoxFuture;
use reqwest::multipart::Form;
use std::time::Duration;

/// Raw outcome of an upload call. Interpreting it is the pipeline's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResponse {
    pub status: u16,
    pub body: String,
}

impl HostResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait ImageHost: Send + Sync {
    /// Post one base64-encoded image. Errors cover transport failures only;
    /// a non-2xx answer is still `Ok`.
    fn upload<'a>(
        &'a self,
        key: &'a str,
        image_base64: String,
    ) -> BoxFuture<'a, Result<HostResponse, AppError>>;
}

pub trait KeySource: Send + Sync {
    fn fetch_key(&self) -> BoxFuture<'_, Result<String, AppError>>;
}

#[derive(Clone)]
pub struct ImgbbHost {
    client: reqwest::Client,
    upload_url: String,
}

impl ImgbbHost {
    pub fn new(upload_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, upload_url))
    }

    pub fn with_client(client: reqwest::Client, upload_url: impl Into<String>) -> Self {
        Self {
            client,
            upload_url: upload_url.into(),
        }
    }
}

impl ImageHost for ImgbbHost {
    fn upload<'a>(
        &'a self,
        key: &'a str,
        image_base64: String,
    ) -> BoxFuture<'a, Result<HostResponse, AppError>> {
        Box::pin(async move {
            let form = Form::new()
                .text("key", key.to_string())
                .text("image", image_base64);

            let response = self.client.post(&self.upload_url).multipart(form).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HostResponse { status, body })
        })
    }
}

#[derive(Clone)]
pub struct HttpKeySource {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl KeySource for HttpKeySource {
    fn fetch_key(&self) -> BoxFuture<'_, Result<String, AppError>> {
        Box::pin(async move {
            let response = self.client.get(&self.url).send().await?;
            if !response.status().is_success() {
                let status = response.status();
                let message = format!("Failed to fetch key from {}: HTTP {}", self.url, status);
                return Err(message.into());
            }
            Ok(response.text().await?)
        })
    }
}
