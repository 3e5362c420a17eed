pub mod chat;
pub mod executor;
