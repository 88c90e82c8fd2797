//! Shared foundation for the analyst service: configuration loading and the
//! chat/message domain entities persisted by `analyst-db`.
//!
//! Everything here is pure data and parsing. Network and storage side effects
//! live in the `analyst-agent`, `analyst-db`, and `analyst-server` crates.

pub mod config;
pub mod domain;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::chat::{Chat, ChatId, Message, MessageId, MessageRole};
