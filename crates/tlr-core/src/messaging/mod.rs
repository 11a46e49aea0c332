//! Messenger abstractions; Telegram implements them in `tlr-telegram`.

pub mod port;
pub mod types;
