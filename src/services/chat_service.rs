use crate::error::AskError;
use crate::models::chat_types::ChatExchange;
use crate::services::intake_service::ImageRecord;

/// Placeholder answers until a real reasoning backend is wired in. A backend
/// would take the question plus the image bytes and return text.
const MOCK_RESPONSES: &[&str] = &[
    "No visible defects detected.",
    "Image appears consistent with guidelines.",
    "Possible issue: background not uniform.",
    "Product looks new and unused.",
    "Unable to determine, please retake the photo.",
];

pub fn mock_response(query: &str, index: usize) -> String {
    format!("Q: {}\nA: {}", query, MOCK_RESPONSES[index % MOCK_RESPONSES.len()])
}

/// One exchange per image, in display order.
pub fn ask(records: &[ImageRecord], query: &str) -> Result<Vec<ChatExchange>, AskError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AskError::MissingQuestion);
    }
    if records.is_empty() {
        return Err(AskError::NoImages);
    }

    Ok(records
        .iter()
        .enumerate()
        .map(|(i, record)| ChatExchange {
            image_id: record.id,
            question: query.to_string(),
            response: mock_response(query, i),
        })
        .collect())
}
