use crate::models::intake_types::ImageId;
use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ChatExchange {
    pub image_id: ImageId,
    pub question: String,
    pub response: String,
}
