use crate::error::AskError;
use crate::models::chat_types::ChatExchange;
use crate::services::chat_service;
use crate::services::intake_service::Intake;

pub fn ask(intake: &Intake, query: &str) -> Result<Vec<ChatExchange>, AskError> {
    chat_service::ask(&intake.records(), query)
}
