pub mod chat;
pub mod images;
