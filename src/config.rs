//! Runtime settings. Everything has a compiled-in default; a handful of
//! environment variables can override the endpoints and timeouts.

use std::time::Duration;

pub const KEY_SOURCE_URL: &str =
    "https://gist.githubusercontent.com/armahnii2000/0eff5ce1b5f2b981198edf126b5ef485/raw";
pub const UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";

pub const MAX_IMAGES: usize = 4;
pub const CHUNK_SIZE: usize = 8 * 1024;

const UPLOAD_TIMEOUT_SECS: u64 = 30;
const KEY_TIMEOUT_SECS: u64 = 10;

const ENV_KEY_URL: &str = "PICTURE_VERIFIER_KEY_URL";
const ENV_UPLOAD_URL: &str = "PICTURE_VERIFIER_UPLOAD_URL";
const ENV_TIMEOUT_SECS: &str = "PICTURE_VERIFIER_TIMEOUT_SECS";
const ENV_OFFLINE: &str = "PICTURE_VERIFIER_OFFLINE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub key_url: String,
    pub upload_url: String,
    pub max_images: usize,
    pub chunk_size: usize,
    pub upload_timeout: Duration,
    pub key_timeout: Duration,
    /// Skip the key fetch entirely and run every upload in fallback mode.
    pub offline: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            key_url: KEY_SOURCE_URL.to_string(),
            upload_url: UPLOAD_URL.to_string(),
            max_images: MAX_IMAGES,
            chunk_size: CHUNK_SIZE,
            upload_timeout: Duration::from_secs(UPLOAD_TIMEOUT_SECS),
            key_timeout: Duration::from_secs(KEY_TIMEOUT_SECS),
            offline: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Unparseable or
    /// empty values are ignored and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = read(ENV_KEY_URL) {
            config.key_url = url;
        }
        if let Some(url) = read(ENV_UPLOAD_URL) {
            config.upload_url = url;
        }
        if let Some(secs) = read(ENV_TIMEOUT_SECS).and_then(|v| v.parse::<u64>().ok()) {
            if secs > 0 {
                config.upload_timeout = Duration::from_secs(secs);
                config.key_timeout = Duration::from_secs(secs);
            } else {
                log::warn!("Ignoring {}=0, keeping default timeouts", ENV_TIMEOUT_SECS);
            }
        }
        if let Some(flag) = read(ENV_OFFLINE) {
            let normalized = flag.to_ascii_lowercase();
            config.offline = !(normalized == "0" || normalized == "false" || normalized == "off");
        }

        config
    }
}
