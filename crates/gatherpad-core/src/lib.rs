//! Core of the gathering-code notepad bot.
//!
//! A bounded, per-group text log of short gathering codes with duplicate
//! detection and numbered deletion. This crate is framework-agnostic: the chat
//! platform lives behind [`messaging::port::MessagingPort`] in adapter crates.

pub mod audit;
pub mod codec;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handler;
pub mod logging;
pub mod messaging;
pub mod store;

pub use errors::{Error, NoteError, Result};
