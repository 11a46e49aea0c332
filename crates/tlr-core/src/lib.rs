//! Core logic for the TikTok link remover bot.
//!
//! This crate is framework-agnostic. Telegram lives behind the messaging port
//! (trait) implemented in the adapter crate.

pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod intake;
pub mod logging;
pub mod matcher;
pub mod messaging;
pub mod policy;
pub mod replies;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{Error, Result};
