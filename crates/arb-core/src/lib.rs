//! Core domain + application logic for the admin relay bot.
//!
//! This crate is framework-agnostic. Telegram lives behind the messaging port
//! implemented in `arb-telegram`.

pub mod album;
pub mod batch;
pub mod config;
pub mod dialogue;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod menu;
pub mod messaging;
pub mod relay;
pub mod store;
pub mod texts;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
