//! Outgoing messages: deletable/permanent sends, edit-with-fallback, media
//! kind probing, admin alerts.
//!
//! A "deletable" message carries an appended ❌ button wired to the built-in
//! `del` command, so the recipient can remove it. Targeting an existing
//! message edits it in place and falls back to a fresh send (deleting the
//! superseded message, best-effort) when the edit cannot land.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, error, warn};

use crate::api::{
    ApiResponse, EditMessageMediaParams, EditMessageTextParams, InputMedia, MediaKind,
    SendFileParams, SendMessageParams, TelegramApi,
};
use crate::error::{BotError, Result};
use crate::probe::probe;
use crate::types::{
    ForceReply, InlineKeyboardButton, InlineKeyboardMarkup, Message, ParseMode, ReplyMarkup,
};

/// Token of the built-in deletion command the ❌ button invokes.
pub const DELETE_COMMAND: &str = "del";

/// Platform failure markers that drive the fallback branches.
const WRONG_FILE_IDENTIFIER: &str = "wrong file identifier";
const MESSAGE_TO_EDIT_NOT_FOUND: &str = "message to edit not found";
const EXACTLY_THE_SAME: &str = "exactly the same";

/// Maximum characters forwarded to the admin alert channel.
const ALERT_LIMIT: usize = 3000;

pub fn delete_button() -> InlineKeyboardButton {
    InlineKeyboardButton::callback("❌", DELETE_COMMAND)
}

/// Where an outgoing message goes: superseding an existing message, or a
/// bare chat/user id with nothing to supersede.
#[derive(Debug, Clone)]
pub enum SendTarget {
    Message(Box<Message>),
    Chat(i64),
}

impl SendTarget {
    pub fn chat_id(&self) -> i64 {
        match self {
            SendTarget::Message(msg) => msg.chat.id,
            SendTarget::Chat(id) => *id,
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match self {
            SendTarget::Message(msg) => Some(msg),
            SendTarget::Chat(_) => None,
        }
    }
}

impl From<Message> for SendTarget {
    fn from(msg: Message) -> Self {
        SendTarget::Message(Box::new(msg))
    }
}

impl From<i64> for SendTarget {
    fn from(chat_id: i64) -> Self {
        SendTarget::Chat(chat_id)
    }
}

/// Content of an outgoing message. `file` is a file id or URL of unknown
/// media kind; its presence routes the send through kind probing.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub text: String,
    pub file: Option<String>,
    pub buttons: Vec<Vec<InlineKeyboardButton>>,
    pub reply_markup: Option<ReplyMarkup>,
    pub parse_mode: Option<ParseMode>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

fn buttons_markup(buttons: &[Vec<InlineKeyboardButton>]) -> Option<ReplyMarkup> {
    (!buttons.is_empty()).then(|| {
        ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup {
            inline_keyboard: buttons.to_vec(),
        })
    })
}

fn failure_summary(results: &[Result<ApiResponse>]) -> String {
    results
        .iter()
        .map(|r| match r {
            Ok(resp) => resp
                .description
                .clone()
                .unwrap_or_else(|| "no description".to_string()),
            Err(e) => e.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Sends and edits messages through the platform API on behalf of one bot
/// instance. Owns no state besides the API handle and the admin chat id.
pub struct Messenger {
    api: Arc<dyn TelegramApi>,
    admin_chat_id: i64,
}

impl Messenger {
    pub fn new(api: Arc<dyn TelegramApi>, admin_chat_id: i64) -> Self {
        Self { api, admin_chat_id }
    }

    pub fn api(&self) -> &Arc<dyn TelegramApi> {
        &self.api
    }

    pub fn admin_chat_id(&self) -> i64 {
        self.admin_chat_id
    }

    /// Sends `out` with an appended delete button. A message target is edited
    /// in place (falling back to a fresh send); a chat target always gets a
    /// new message.
    pub async fn send_deletable(
        &self,
        target: SendTarget,
        mut out: OutgoingMessage,
    ) -> Result<ApiResponse> {
        out.buttons.push(vec![delete_button()]);
        match target {
            SendTarget::Message(msg) => self.update_message(&msg, out, true).await,
            chat @ SendTarget::Chat(_) => self.new_message(chat, out).await,
        }
    }

    /// Edits `msg` in place without adding a delete button, sending fresh if
    /// the edit cannot land.
    pub async fn send_permanent(&self, msg: &Message, out: OutgoingMessage) -> Result<ApiResponse> {
        self.update_message(msg, out, true).await
    }

    /// Asks a question that arrives as a deletable force-reply message; the
    /// identifier is hidden in a code-language marker so the answer can be
    /// routed back (see the dispatcher's question-answer path).
    pub async fn ask_question(
        &self,
        chat_id: i64,
        question: &str,
        identifier: &str,
    ) -> Result<ApiResponse> {
        let text = format!(
            "<pre><code class=\"language--questionID{}\">Question:</code></pre>{}",
            identifier, question
        );
        self.send_deletable(
            SendTarget::Chat(chat_id),
            OutgoingMessage {
                text,
                parse_mode: Some(ParseMode::Html),
                reply_markup: Some(ReplyMarkup::ForceReply(ForceReply { force_reply: true })),
                ..Default::default()
            },
        )
        .await
    }

    /// Reports to the admin chat as a deletable message. Failures are logged,
    /// never propagated; this is the side channel of last resort.
    pub async fn alert_admin(&self, message: &str) {
        let truncated: String = message.chars().take(ALERT_LIMIT).collect();
        let text = format!("Alert: {}", truncated);
        match self
            .send_plain_deletable(self.admin_chat_id, &text, None)
            .await
        {
            Ok(resp) if !resp.ok => {
                error!(description = ?resp.description, "admin alert rejected by platform");
            }
            Err(e) => error!(error = %e, "failed to deliver admin alert"),
            Ok(_) => {}
        }
    }

    /// Single direct send with a delete button. Kept free of fallback logic
    /// so the failure paths of [`new_message`](Self::new_message) can use it
    /// without recursing.
    async fn send_plain_deletable(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<ApiResponse> {
        self.api
            .send_message(SendMessageParams {
                chat_id,
                text: text.to_string(),
                reply_markup: buttons_markup(&[vec![delete_button()]]),
                parse_mode,
            })
            .await
    }

    /// Best-effort removal of a message something else has superseded.
    pub(crate) async fn delete_superseded(&self, msg: &Message) {
        match self.api.delete_message(msg.chat.id, msg.message_id).await {
            Ok(resp) if !resp.ok => {
                debug!(
                    chat_id = msg.chat.id,
                    message_id = msg.message_id,
                    description = ?resp.description,
                    "superseded message not deleted"
                );
            }
            Err(e) => debug!(error = %e, "superseded message delete failed"),
            Ok(_) => {}
        }
    }

    /// Sends a new message. An attachment of unknown kind is probed through
    /// every type-specific send until one is accepted; a plain text goes out
    /// directly. When the target supersedes an existing message, that message
    /// is deleted afterwards (best-effort).
    pub(crate) async fn new_message(
        &self,
        target: SendTarget,
        out: OutgoingMessage,
    ) -> Result<ApiResponse> {
        let chat_id = target.chat_id();
        let reply_markup = out
            .reply_markup
            .clone()
            .or_else(|| buttons_markup(&out.buttons));

        let Some(file) = out.file.clone() else {
            let response = self
                .api
                .send_message(SendMessageParams {
                    chat_id,
                    text: out.text.clone(),
                    reply_markup,
                    parse_mode: out.parse_mode,
                })
                .await?;
            if let Some(msg) = target.message() {
                self.delete_superseded(msg).await;
            }
            return Ok(response);
        };

        let params = || SendFileParams {
            chat_id,
            file: file.clone(),
            caption: Some(out.text.clone()),
            reply_markup: reply_markup.clone(),
        };
        let attempts: Vec<BoxFuture<'_, Result<ApiResponse>>> = vec![
            self.api.send_photo(params()),
            self.api.send_audio(params()),
            self.api.send_video(params()),
            self.api.send_animation(params()),
            self.api.send_voice(params()),
            self.api.send_video_note(params()),
            self.api.send_document(params()),
        ];
        let mut outcome = probe(
            |r: &Result<ApiResponse>| matches!(r, Ok(resp) if resp.ok),
            |r: &Result<ApiResponse>| match r {
                Ok(resp) => resp.description_contains(WRONG_FILE_IDENTIFIER),
                Err(_) => true,
            },
            attempts,
        )
        .await;

        if let Some(i) = outcome.winner {
            if let Some(msg) = target.message() {
                self.delete_superseded(msg).await;
            }
            return outcome.results.swap_remove(i);
        }

        let summary = failure_summary(&outcome.results);
        match outcome.results.pop() {
            // Transport failure aborted the probe.
            Some(Err(e)) => Err(e),
            Some(Ok(last)) if last.description_contains(WRONG_FILE_IDENTIFIER) => {
                warn!(file = %file, "platform rejected the file identifier");
                if let Err(e) = self
                    .send_plain_deletable(chat_id, &format!("Corrupted file: {}", file), None)
                    .await
                {
                    error!(error = %e, "failed to send corrupted-file notice");
                }
                Err(BotError::Api(format!("corrupted file: {}", file)))
            }
            _ => {
                self.alert_admin(&format!(
                    "every send variant was rejected for {}: {}",
                    file, summary
                ))
                .await;
                Err(BotError::Api(format!(
                    "every send variant rejected: {}",
                    summary
                )))
            }
        }
    }

    /// Edits `msg` in place. Media edits are probed across declared kinds; a
    /// "not modified because identical" rejection counts as success. When the
    /// edit cannot land and `else_new` is set, the content goes out as a new
    /// message instead.
    pub(crate) async fn update_message(
        &self,
        msg: &Message,
        out: OutgoingMessage,
        else_new: bool,
    ) -> Result<ApiResponse> {
        let reply_markup = buttons_markup(&out.buttons);

        let Some(file) = out.file.clone() else {
            let response = self
                .api
                .edit_message_text(EditMessageTextParams {
                    chat_id: msg.chat.id,
                    message_id: msg.message_id,
                    text: out.text.clone(),
                    reply_markup,
                })
                .await?;
            if response.ok {
                return Ok(response);
            }
            if else_new {
                return self.new_message(SendTarget::Message(Box::new(msg.clone())), out).await;
            }
            return Ok(response);
        };

        let params = |kind: MediaKind| EditMessageMediaParams {
            chat_id: msg.chat.id,
            message_id: msg.message_id,
            media: InputMedia {
                kind,
                media: file.clone(),
                caption: Some(out.text.clone()),
            },
            reply_markup: reply_markup.clone(),
        };
        let attempts: Vec<BoxFuture<'_, Result<ApiResponse>>> = vec![
            self.api.edit_message_media(params(MediaKind::Photo)),
            self.api.edit_message_media(params(MediaKind::Animation)),
            self.api.edit_message_media(params(MediaKind::Audio)),
            self.api.edit_message_media(params(MediaKind::Video)),
            self.api.edit_message_media(params(MediaKind::Document)),
        ];
        let mut outcome = probe(
            |r: &Result<ApiResponse>| {
                matches!(r, Ok(resp) if resp.ok || resp.description_contains(EXACTLY_THE_SAME))
            },
            |r: &Result<ApiResponse>| match r {
                Ok(resp) => resp.description_contains(MESSAGE_TO_EDIT_NOT_FOUND),
                Err(_) => true,
            },
            attempts,
        )
        .await;

        if let Some(i) = outcome.winner {
            return outcome.results.swap_remove(i);
        }
        // A transport failure aborts the edit instead of falling back.
        if outcome.results.last().is_some_and(|r| r.is_err()) {
            if let Some(Err(e)) = outcome.results.pop() {
                return Err(e);
            }
        }
        if else_new {
            return self.new_message(SendTarget::Message(Box::new(msg.clone())), out).await;
        }
        match outcome.results.into_iter().next() {
            Some(first) => first,
            None => Err(BotError::Api("no edit attempt produced a result".to_string())),
        }
    }
}
