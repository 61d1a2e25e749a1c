pub mod chat_types;
pub mod intake_types;
pub mod status_types;
