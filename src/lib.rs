pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

use config::AppConfig;
use error::AppError;
use services::credential_service::CredentialProvider;
use services::image_host::{HttpKeySource, ImgbbHost};
use services::intake_service::Intake;
use services::upload_service::Uploader;
use std::sync::Arc;

/// Everything a front end needs, wired from one config.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub credentials: CredentialProvider,
    pub intake: Intake,
}

/// Start the key fetch and build the intake. Must be called from within a
/// tokio runtime; the fetch runs in the background and does not block.
pub fn setup(config: AppConfig) -> Result<AppState, AppError> {
    let credentials = start_credentials(&config);

    let host = ImgbbHost::new(config.upload_url.clone(), config.upload_timeout)?;
    let uploader = Uploader::new(
        Arc::new(host),
        credentials.clone(),
        config.chunk_size,
        config.upload_timeout,
    );
    let intake = Intake::new(uploader, config.max_images).map_err(|e| AppError {
        message: e.to_string(),
    })?;

    Ok(AppState {
        config,
        credentials,
        intake,
    })
}

/// Key problems never stop startup; they only put uploads in fallback mode.
fn start_credentials(config: &AppConfig) -> CredentialProvider {
    if config.offline {
        log::info!("Offline mode, all images stay in memory");
        return CredentialProvider::fixed(None);
    }
    match HttpKeySource::new(config.key_url.clone(), config.key_timeout) {
        Ok(source) => CredentialProvider::spawn(Arc::new(source), config.key_timeout),
        Err(e) => {
            log::warn!("Could not build key client, uploads will fall back: {}", e);
            CredentialProvider::fixed(None)
        }
    }
}
