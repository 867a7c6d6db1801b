//! Update classification and dispatch.
//!
//! One [`Bot`] instance receives normalized [`Update`] envelopes, classifies
//! them (message / edited message / callback query / channel post), resolves
//! commands, and routes to either a registered command handler or the
//! embedding application's [`EventHooks`]. Every inbound update is handled
//! independently; failures are caught per update and reported through the
//! admin alert channel, never back to the webhook caller.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::api::TelegramApi;
use crate::command::{Command, CommandTable};
use crate::entity::{message_command, AnnotatedEntity};
use crate::error::Result;
use crate::outgoing::{Messenger, OutgoingMessage, SendTarget, DELETE_COMMAND};
use crate::types::{CallbackQuery, Message, ParseMode, Update, User};

/// Entity-language prefix that marks a force-reply question; the identifier
/// follows the prefix and round-trips through [`Messenger::ask_question`].
const QUESTION_MARKER: &str = "-questionID";

/// Hooks the embedding application provides. Each receives already-classified
/// data; a returned error is caught by the dispatcher and alerted to the
/// admin. All hooks default to no-ops.
#[async_trait]
pub trait EventHooks: Send + Sync {
    /// A message (or message edit) that is not a registered command.
    async fn handle_message(&self, _message: &Message, _is_update: bool) -> Result<()> {
        Ok(())
    }

    /// Called after a recognized command's own handler ran successfully.
    async fn handle_bot_command(
        &self,
        _entity: &AnnotatedEntity,
        _message: &Message,
        _is_update: bool,
    ) -> Result<()> {
        Ok(())
    }

    /// A callback query whose data does not name a registered command.
    async fn handle_callback_query(&self, _query: &CallbackQuery) -> Result<()> {
        Ok(())
    }

    async fn handle_channel_post(&self, _post: &Message) -> Result<()> {
        Ok(())
    }

    /// An answer to a question previously sent via
    /// [`Messenger::ask_question`]; the reply context is already stripped.
    async fn handle_question_answer(&self, _identifier: &str, _message: &Message) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BotSettings {
    /// Skip registering the built-in commands (/ping, /help, del, ...).
    pub skip_default_commands: bool,
    /// List the built-in commands in the platform command menu.
    pub list_default_commands: bool,
}

/// One bot instance: command table, hooks, and the messaging engine. The
/// table is written during setup and only read while dispatching; instances
/// are independent, so several bots can coexist in one process.
pub struct Bot {
    api: Arc<dyn TelegramApi>,
    messenger: Arc<Messenger>,
    hooks: Arc<dyn EventHooks>,
    commands: Arc<RwLock<CommandTable>>,
    online_username: tokio::sync::RwLock<Option<String>>,
}

impl Bot {
    pub fn new(
        settings: BotSettings,
        api: Arc<dyn TelegramApi>,
        messenger: Arc<Messenger>,
        hooks: Arc<dyn EventHooks>,
    ) -> Self {
        let commands = Arc::new(RwLock::new(CommandTable::new()));
        if !settings.skip_default_commands {
            register_default_commands(&commands, &messenger, settings.list_default_commands);
        }
        Self {
            api,
            messenger,
            hooks,
            commands,
            online_username: tokio::sync::RwLock::new(None),
        }
    }

    pub fn messenger(&self) -> &Arc<Messenger> {
        &self.messenger
    }

    /// Registers a command, overwriting any previous one under the token.
    pub fn set_command(&self, token: impl Into<String>, command: Command) {
        self.commands.write().set(token, command);
    }

    pub fn set_commands(&self, commands: impl IntoIterator<Item = (String, Command)>) {
        let mut table = self.commands.write();
        for (token, command) in commands {
            table.set(token, command);
        }
    }

    /// Renders the textual command listing (described, non-hidden commands).
    pub fn command_listing(&self) -> String {
        self.commands.read().to_string()
    }

    /// Best-effort identity check: caches the bot's online username for
    /// later use. Failure is logged only.
    pub async fn connect(&self) {
        match self.api.get_me().await {
            Ok(resp) if resp.ok => {
                if let Some(me) = resp.result_as::<User>() {
                    info!(username = ?me.username, "connected to platform API");
                    *self.online_username.write().await = me.username;
                }
            }
            Ok(resp) => warn!(description = ?resp.description, "get_me rejected"),
            Err(e) => warn!(error = %e, "platform API connection test failed"),
        }
    }

    pub async fn online_username(&self) -> Option<String> {
        self.online_username.read().await.clone()
    }

    /// Uploads the menu-visible commands to the platform. Fire-and-forget:
    /// failures are logged.
    pub async fn upload_commands(&self) {
        let commands = self.commands.read().visible_for_menu();
        match self.api.set_my_commands(commands).await {
            Ok(resp) if !resp.ok => {
                warn!(description = ?resp.description, "set_my_commands rejected")
            }
            Err(e) => warn!(error = %e, "set_my_commands failed"),
            Ok(_) => {}
        }
    }

    /// Entry point for one inbound update. Never fails toward the caller:
    /// any error ends up in the admin alert channel.
    pub async fn dispatch(&self, update: Update) {
        let update_id = update.update_id;
        debug!(update_id, "dispatching update");
        if let Err(e) = self.process_update(&update).await {
            error!(update_id, error = %e, "update dispatch failed");
            self.messenger
                .alert_admin(&format!("update {} dispatch failed: {}", update_id, e))
                .await;
        }
    }

    /// Handles every populated variant independently; malformed envelopes
    /// with several variants set are not assumed away.
    async fn process_update(&self, update: &Update) -> Result<()> {
        let is_update = update.edited_message.is_some();
        if let Some(msg) = update.message.as_ref().or(update.edited_message.as_ref()) {
            self.handle_message_event(msg, is_update).await?;
        }
        if let Some(query) = update.callback_query.as_ref() {
            self.handle_callback_event(query).await?;
        }
        if let Some(post) = update
            .channel_post
            .as_ref()
            .or(update.edited_channel_post.as_ref())
        {
            self.hooks.handle_channel_post(post).await?;
        }
        Ok(())
    }

    /// Runs the registered command for `token`, or returns `None` when the
    /// token is unknown.
    async fn run_registered(
        &self,
        token: &str,
        target: SendTarget,
        rest: String,
    ) -> Option<Result<()>> {
        let command = self.commands.read().get(token).cloned();
        match command {
            Some(cmd) => Some(cmd.run(target, rest).await),
            None => None,
        }
    }

    async fn handle_message_event(&self, msg: &Message, is_update: bool) -> Result<()> {
        if let Some(entity) = message_command(msg) {
            let token = entity.string.trim().to_string();
            let outcome = self
                .run_registered(
                    &token,
                    SendTarget::Message(Box::new(msg.clone())),
                    entity.rest_string.clone(),
                )
                .await;
            match outcome {
                Some(Ok(())) => {
                    info!(command = %token, chat_id = msg.chat.id, "command handled");
                    return self.hooks.handle_bot_command(&entity, msg, is_update).await;
                }
                Some(Err(e)) => {
                    warn!(command = %token, error = %e, "command handler failed");
                    self.messenger
                        .send_deletable(
                            SendTarget::Message(Box::new(msg.clone())),
                            OutgoingMessage::text(format!("Cant execute {}: {}", token, e)),
                        )
                        .await?;
                    return Ok(());
                }
                // Unknown token: not a command for this bot, fall through.
                None => {}
            }
        }

        if let Some(identifier) = question_identifier(msg) {
            // The answer supersedes the question prompt; drop it and hand the
            // bare message to the hook.
            self.messenger.delete_superseded(msg).await;
            let mut stripped = msg.clone();
            stripped.reply_to_message = None;
            return self.hooks.handle_question_answer(&identifier, &stripped).await;
        }

        self.hooks.handle_message(msg, is_update).await
    }

    async fn handle_callback_event(&self, query: &CallbackQuery) -> Result<()> {
        let Some(data) = query.data.as_deref() else {
            return Ok(());
        };
        let (token, rest) = split_callback_data(data);
        let command = self.commands.read().get(&token).cloned();

        let branch = match (query.message.as_ref(), command) {
            (Some(msg), Some(cmd)) => {
                if let Err(e) = cmd
                    .run(SendTarget::Message(Box::new(msg.clone())), rest)
                    .await
                {
                    self.messenger
                        .alert_admin(&format!(
                            "callback command {} failed: {}; message id {}",
                            token, e, msg.message_id
                        ))
                        .await;
                }
                Ok(())
            }
            _ => self.hooks.handle_callback_query(query).await,
        };

        // The platform needs the acknowledgment to stop the client-side
        // loading indicator, whichever branch ran.
        match self.api.answer_callback_query(&query.id).await {
            Ok(resp) if !resp.ok => {
                warn!(description = ?resp.description, "answer_callback_query rejected")
            }
            Err(e) => warn!(error = %e, "answer_callback_query failed"),
            Ok(_) => {}
        }
        branch
    }
}

/// Splits callback data into a command token and the argument tail: the split
/// point is one past the first word→non-word character transition, or the
/// full length when there is none. The token portion is trimmed.
fn split_callback_data(data: &str) -> (String, String) {
    fn is_word(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }
    let mut split = data.len();
    let mut prev: Option<char> = None;
    for (i, c) in data.char_indices() {
        if let Some(p) = prev {
            if is_word(p) && !is_word(c) {
                split = i;
                break;
            }
        }
        prev = Some(c);
    }
    (data[..split].trim().to_string(), data[split..].to_string())
}

/// Identifier of the question this message answers, when its reply context
/// carries the question marker.
fn question_identifier(message: &Message) -> Option<String> {
    let reply = message.reply_to_message.as_deref()?;
    let language = reply.entities.as_deref()?.first()?.language.as_deref()?;
    language.strip_prefix(QUESTION_MARKER).map(str::to_string)
}

fn register_default_commands(
    commands: &Arc<RwLock<CommandTable>>,
    messenger: &Arc<Messenger>,
    list: bool,
) {
    let mut table = commands.write();

    table.set(
        "/nothing",
        Command::new(|_, _| {
            async {
                debug!("/nothing invoked");
                Ok(())
            }
            .boxed()
        })
        .describe("nothing")
        .visible(false),
    );

    {
        let messenger = messenger.clone();
        table.set(
            DELETE_COMMAND,
            Command::new(move |target, _| {
                let messenger = messenger.clone();
                async move {
                    let SendTarget::Message(msg) = target else {
                        return Ok(());
                    };
                    let failure = match messenger
                        .api()
                        .delete_message(msg.chat.id, msg.message_id)
                        .await
                    {
                        Ok(resp) if !resp.ok => {
                            resp.description.unwrap_or_else(|| "no description".to_string())
                        }
                        Err(e) => e.to_string(),
                        Ok(_) => return Ok(()),
                    };
                    let failure: String = failure.chars().take(200).collect();
                    messenger
                        .alert_admin(&format!("del command failed: {}", failure))
                        .await;
                    Ok(())
                }
                .boxed()
            })
            .visible(false),
        );
    }

    {
        let messenger = messenger.clone();
        // Weak: the table owns this command; a strong handle would cycle.
        let commands = Arc::downgrade(commands);
        table.set(
            "/help",
            Command::new(move |target, _| {
                let messenger = messenger.clone();
                let listing = commands
                    .upgrade()
                    .map(|c| c.read().to_string())
                    .unwrap_or_default();
                async move {
                    messenger
                        .send_deletable(target, OutgoingMessage::text(listing))
                        .await?;
                    Ok(())
                }
                .boxed()
            })
            .describe("list commands")
            .visible(list),
        );
    }

    {
        let messenger = messenger.clone();
        table.set(
            "/ping2",
            Command::new(move |target, _| {
                let messenger = messenger.clone();
                async move {
                    let text = match &target {
                        SendTarget::Message(msg) => format!("{:#?}", msg),
                        SendTarget::Chat(id) => format!("chat {}", id),
                    };
                    messenger
                        .send_deletable(target, OutgoingMessage::text(text))
                        .await?;
                    Ok(())
                }
                .boxed()
            })
            .describe("reply with message object")
            .visible(list),
        );
    }

    {
        let messenger = messenger.clone();
        table.set(
            "/ping",
            Command::new(move |target, rest| {
                let messenger = messenger.clone();
                async move {
                    let text = if rest.is_empty() {
                        "/pong".to_string()
                    } else {
                        rest
                    };
                    messenger
                        .send_deletable(target, OutgoingMessage::text(text))
                        .await?;
                    Ok(())
                }
                .boxed()
            })
            .describe("reply with same message")
            .visible(list),
        );
    }

    {
        let messenger = messenger.clone();
        table.set(
            "/pong",
            Command::new(move |target, rest| {
                let messenger = messenger.clone();
                async move {
                    let text = if rest.is_empty() {
                        "/ping".to_string()
                    } else {
                        rest
                    };
                    messenger
                        .send_deletable(target, OutgoingMessage::text(text))
                        .await?;
                    Ok(())
                }
                .boxed()
            })
            .describe("reply with /ping")
            .visible(list),
        );
    }

    {
        let messenger = messenger.clone();
        table.set(
            "/id",
            Command::new(move |target, _| {
                let messenger = messenger.clone();
                async move {
                    let chat_id = target.chat_id();
                    messenger
                        .send_deletable(
                            SendTarget::Chat(chat_id),
                            OutgoingMessage {
                                text: format!("`{}`", chat_id),
                                parse_mode: Some(ParseMode::MarkdownV2),
                                ..Default::default()
                            },
                        )
                        .await?;
                    Ok(())
                }
                .boxed()
            })
            .describe("reply with id")
            .visible(list),
        );
    }
}
