//! Minimal bot configuration: token, admin chat, webhook wiring, log path.
//! Interacts with the outside world through environment variables only.

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8443";

/// Runtime configuration for one bot process.
pub struct BotConfig {
    pub bot_token: String,
    /// Chat that receives operational alerts.
    pub admin_chat_id: i64,
    /// Public HTTPS URL the platform delivers updates to. Without it the
    /// process serves the webhook endpoint but does not (re)register it.
    pub webhook_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub api_base_url: String,
    pub log_file: Option<String>,
}

impl BotConfig {
    /// Loads from environment variables: BOT_TOKEN and ADMIN_CHAT_ID are
    /// required; WEBHOOK_URL, BIND_ADDR, API_BASE_URL and LOG_FILE are
    /// optional.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").context("BOT_TOKEN not set")?;
        let admin_chat_id = env::var("ADMIN_CHAT_ID")
            .context("ADMIN_CHAT_ID not set")?
            .parse::<i64>()
            .context("ADMIN_CHAT_ID is not a chat id")?;
        let webhook_url = env::var("WEBHOOK_URL").ok();
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR is not a socket address")?;
        let api_base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let log_file = env::var("LOG_FILE").ok();
        Ok(Self {
            bot_token,
            admin_chat_id,
            webhook_url,
            bind_addr,
            api_base_url,
            log_file,
        })
    }

    /// Constructs with the given token and admin chat; everything else takes
    /// its default.
    pub fn with_token(bot_token: String, admin_chat_id: i64) -> Self {
        Self {
            bot_token,
            admin_chat_id,
            webhook_url: None,
            bind_addr: DEFAULT_BIND_ADDR.parse().unwrap_or_else(|_| {
                SocketAddr::from(([0, 0, 0, 0], 8443))
            }),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            log_file: None,
        }
    }
}
