//! Job Beacon: search job sites from a chat and page through the results.
//!
//! The pieces, bottom up:
//!
//! - [`sources`]: job sources and the registry that dispatches fetches.
//! - [`format`]: rendering a listing and splitting it into message fragments.
//! - [`session`]: per-user search state with per-user serialization.
//! - [`navigation`]: the engine turning intents into fetches and displays.
//! - [`selector`]: paging through the available sources.
//! - [`channels`]: the chat transport seam and its Telegram implementation.
//! - [`bot`]: commands, callbacks and replies on top of the engine.

pub mod bot;
pub mod channels;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod navigation;
pub mod observability;
pub mod selector;
pub mod session;
pub mod sources;

pub use config::Config;
pub use error::{Error, Result};
