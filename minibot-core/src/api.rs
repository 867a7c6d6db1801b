//! Platform API capability trait and its raw result envelope.
//!
//! The core drives its fallback branches off the platform's own result shape:
//! a success flag plus an error description string. Implementations therefore
//! return [`ApiResponse`] for platform-reported rejections and reserve `Err`
//! for transport-level failures.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::types::{BotCommand, ParseMode, ReplyMarkup};

/// Raw platform result envelope: `ok`, an error `description` on failure,
/// and a method-specific `result` payload on success.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

impl ApiResponse {
    /// True when the failure description contains `needle`.
    pub fn description_contains(&self, needle: &str) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| d.contains(needle))
    }

    /// Deserializes the `result` payload, if present and well-formed.
    pub fn result_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.result
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

/// Shared parameters for every type-specific file send. `file` is a file id
/// or URL; the declared media kind is implied by the method called.
#[derive(Debug, Clone)]
pub struct SendFileParams {
    pub chat_id: i64,
    pub file: String,
    pub caption: Option<String>,
    pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageTextParams {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

/// Declared media kind for editMessageMedia and the probing order of edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Animation,
    Audio,
    Video,
    Document,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputMedia {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub media: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageMediaParams {
    pub chat_id: i64,
    pub message_id: i64,
    pub media: InputMedia,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

/// Capability surface the core needs from the platform.
///
/// One method per type-specific send so the dispatcher can probe them in
/// order (see [`crate::probe`]). All methods return the raw envelope;
/// implementations must not turn a platform rejection into `Err`.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    async fn send_message(&self, params: SendMessageParams) -> Result<ApiResponse>;

    async fn send_photo(&self, params: SendFileParams) -> Result<ApiResponse>;
    async fn send_audio(&self, params: SendFileParams) -> Result<ApiResponse>;
    async fn send_video(&self, params: SendFileParams) -> Result<ApiResponse>;
    async fn send_animation(&self, params: SendFileParams) -> Result<ApiResponse>;
    async fn send_voice(&self, params: SendFileParams) -> Result<ApiResponse>;
    async fn send_video_note(&self, params: SendFileParams) -> Result<ApiResponse>;
    async fn send_document(&self, params: SendFileParams) -> Result<ApiResponse>;

    async fn edit_message_text(&self, params: EditMessageTextParams) -> Result<ApiResponse>;
    async fn edit_message_media(&self, params: EditMessageMediaParams) -> Result<ApiResponse>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<ApiResponse>;
    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<ApiResponse>;
    async fn set_my_commands(&self, commands: Vec<BotCommand>) -> Result<ApiResponse>;
    async fn get_me(&self) -> Result<ApiResponse>;
    async fn set_webhook(&self, url: &str) -> Result<ApiResponse>;
    async fn get_webhook_info(&self) -> Result<ApiResponse>;
}
