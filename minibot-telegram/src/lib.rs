//! # minibot-telegram
//!
//! Telegram transport for the minibot core: the HTTPS Bot API client, the
//! webhook endpoint server, and environment-based configuration. Everything
//! behavioral lives in minibot-core behind the [`minibot_core::TelegramApi`]
//! trait; this crate only moves bytes.

pub mod config;
pub mod http_api;
pub mod webhook;

pub use config::{BotConfig, DEFAULT_API_BASE_URL};
pub use http_api::HttpTelegramApi;
pub use webhook::{probe_webhook, register_webhook, WebhookServer};
