//! Minimal echo bot on the minibot framework.
//!
//! Serves the webhook endpoint, registers the public URL when WEBHOOK_URL is
//! set, and echoes any non-command message back as a deletable reply. The
//! built-in commands (/ping, /help, del, ...) come with the framework.
//!
//! Environment: BOT_TOKEN, ADMIN_CHAT_ID required; WEBHOOK_URL, BIND_ADDR,
//! API_BASE_URL, LOG_FILE optional (see `minibot_telegram::BotConfig`).

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use minibot_core::{
    init_tracing, Bot, BotSettings, EventHooks, Message, Messenger, OutgoingMessage, SendTarget,
    TelegramApi,
};
use minibot_telegram::{register_webhook, BotConfig, HttpTelegramApi, WebhookServer};

/// Echoes non-command messages back into the chat.
struct EchoHooks {
    messenger: Arc<Messenger>,
}

#[async_trait]
impl EventHooks for EchoHooks {
    async fn handle_message(&self, message: &Message, is_update: bool) -> minibot_core::Result<()> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let prefix = if is_update { "edited: " } else { "" };
        self.messenger
            .send_deletable(
                SendTarget::Chat(message.chat.id),
                OutgoingMessage::text(format!("{}{}", prefix, text)),
            )
            .await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = BotConfig::from_env()?;
    init_tracing(config.log_file.as_deref())?;

    let api: Arc<dyn TelegramApi> = Arc::new(HttpTelegramApi::new(
        config.bot_token.clone(),
        config.api_base_url.clone(),
    ));
    let messenger = Arc::new(Messenger::new(api.clone(), config.admin_chat_id));
    let hooks = Arc::new(EchoHooks {
        messenger: messenger.clone(),
    });

    let bot = Arc::new(Bot::new(
        BotSettings {
            list_default_commands: true,
            ..Default::default()
        },
        api.clone(),
        messenger.clone(),
        hooks,
    ));
    bot.connect().await;
    bot.upload_commands().await;

    let server = WebhookServer::bind(config.bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.bind_addr))?;

    if let Some(url) = config.webhook_url.as_deref() {
        register_webhook(&api, &messenger, url).await?;
    } else {
        info!("WEBHOOK_URL not set; serving the endpoint without registering");
    }

    server.serve(bot).await?;
    Ok(())
}
