pub mod chat_service;
pub mod credential_service;
pub mod fs_service;
pub mod image_host;
pub mod intake_service;
pub mod status_service;
pub mod thumbnail_service;
pub mod upload_service;
