//! # minibot-core
//!
//! Transport-agnostic core of a webhook Telegram bot framework: wire types,
//! entity annotation and command resolution, the insertion-ordered command
//! table, sequential send/edit probing, the [`TelegramApi`] capability trait,
//! the outgoing-message engine, and the update dispatcher with its
//! [`EventHooks`] seam. Transports (HTTP client, webhook server) live in
//! minibot-telegram.

pub mod api;
pub mod command;
pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod logger;
pub mod outgoing;
pub mod probe;
pub mod types;

pub use api::{
    ApiResponse, EditMessageMediaParams, EditMessageTextParams, InputMedia, MediaKind,
    SendFileParams, SendMessageParams, TelegramApi,
};
pub use command::{Command, CommandFn, CommandFuture, CommandTable};
pub use dispatcher::{Bot, BotSettings, EventHooks};
pub use entity::{annotate, message_command, resolve_command, AnnotatedEntity};
pub use error::{BotError, Result};
pub use logger::init_tracing;
pub use outgoing::{delete_button, Messenger, OutgoingMessage, SendTarget, DELETE_COMMAND};
pub use probe::{probe, ProbeOutcome};
pub use types::{
    BotCommand, CallbackQuery, Chat, ForceReply, InlineKeyboardButton, InlineKeyboardMarkup,
    Message, MessageEntity, ParseMode, ReplyMarkup, Update, User,
};
