//! Test doubles for dispatcher integration tests: a recording
//! [`TelegramApi`] mock with programmable per-method responses, and
//! [`EventHooks`] that record every invocation.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use minibot_core::{
    AnnotatedEntity, ApiResponse, BotCommand, CallbackQuery, EditMessageMediaParams,
    EditMessageTextParams, EventHooks, MediaKind, Message, Result, SendFileParams,
    SendMessageParams, TelegramApi,
};

pub const ADMIN_CHAT: i64 = 99;

/// One recorded API call with the fields tests assert on.
#[derive(Debug, Clone)]
#[allow(dead_code)] // not every test asserts every field
pub enum ApiCall {
    SendMessage {
        chat_id: i64,
        text: String,
        has_delete_button: bool,
    },
    SendFile {
        method: &'static str,
        chat_id: i64,
        file: String,
    },
    EditMessageText {
        chat_id: i64,
        message_id: i64,
        text: String,
    },
    EditMessageMedia {
        kind: MediaKind,
        chat_id: i64,
        message_id: i64,
    },
    DeleteMessage {
        chat_id: i64,
        message_id: i64,
    },
    AnswerCallbackQuery {
        id: String,
    },
    SetMyCommands {
        commands: Vec<BotCommand>,
    },
    GetMe,
    SetWebhook {
        url: String,
    },
    GetWebhookInfo,
}

/// Recording mock. Responses are queued per method name; a method with an
/// empty queue answers `ok`.
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<ApiCall>>,
    responses: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
}

pub fn ok_response() -> ApiResponse {
    ApiResponse {
        ok: true,
        ..Default::default()
    }
}

pub fn rejected(description: &str) -> ApiResponse {
    ApiResponse {
        ok: false,
        description: Some(description.to_string()),
        ..Default::default()
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next response for `method` (wire name, e.g. "sendPhoto").
    pub fn push_response(&self, method: &str, response: ApiResponse) {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn take(&self, method: &str) -> ApiResponse {
        self.responses
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(ok_response)
    }

    fn send_file(&self, method: &'static str, params: SendFileParams) -> Result<ApiResponse> {
        self.record(ApiCall::SendFile {
            method,
            chat_id: params.chat_id,
            file: params.file,
        });
        Ok(self.take(method))
    }
}

fn markup_has_delete_button(markup: &Option<minibot_core::ReplyMarkup>) -> bool {
    match markup {
        Some(minibot_core::ReplyMarkup::InlineKeyboard(kb)) => kb
            .inline_keyboard
            .iter()
            .flatten()
            .any(|b| b.callback_data.as_deref() == Some(minibot_core::DELETE_COMMAND)),
        _ => false,
    }
}

#[async_trait]
impl TelegramApi for MockApi {
    async fn send_message(&self, params: SendMessageParams) -> Result<ApiResponse> {
        self.record(ApiCall::SendMessage {
            chat_id: params.chat_id,
            text: params.text,
            has_delete_button: markup_has_delete_button(&params.reply_markup),
        });
        Ok(self.take("sendMessage"))
    }

    async fn send_photo(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendPhoto", params)
    }
    async fn send_audio(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendAudio", params)
    }
    async fn send_video(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendVideo", params)
    }
    async fn send_animation(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendAnimation", params)
    }
    async fn send_voice(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendVoice", params)
    }
    async fn send_video_note(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendVideoNote", params)
    }
    async fn send_document(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendDocument", params)
    }

    async fn edit_message_text(&self, params: EditMessageTextParams) -> Result<ApiResponse> {
        self.record(ApiCall::EditMessageText {
            chat_id: params.chat_id,
            message_id: params.message_id,
            text: params.text,
        });
        Ok(self.take("editMessageText"))
    }

    async fn edit_message_media(&self, params: EditMessageMediaParams) -> Result<ApiResponse> {
        self.record(ApiCall::EditMessageMedia {
            kind: params.media.kind,
            chat_id: params.chat_id,
            message_id: params.message_id,
        });
        Ok(self.take("editMessageMedia"))
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<ApiResponse> {
        self.record(ApiCall::DeleteMessage {
            chat_id,
            message_id,
        });
        Ok(self.take("deleteMessage"))
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<ApiResponse> {
        self.record(ApiCall::AnswerCallbackQuery {
            id: callback_query_id.to_string(),
        });
        Ok(self.take("answerCallbackQuery"))
    }

    async fn set_my_commands(&self, commands: Vec<BotCommand>) -> Result<ApiResponse> {
        self.record(ApiCall::SetMyCommands { commands });
        Ok(self.take("setMyCommands"))
    }

    async fn get_me(&self) -> Result<ApiResponse> {
        self.record(ApiCall::GetMe);
        Ok(self.take("getMe"))
    }

    async fn set_webhook(&self, url: &str) -> Result<ApiResponse> {
        self.record(ApiCall::SetWebhook {
            url: url.to_string(),
        });
        Ok(self.take("setWebhook"))
    }

    async fn get_webhook_info(&self) -> Result<ApiResponse> {
        self.record(ApiCall::GetWebhookInfo);
        Ok(self.take("getWebhookInfo"))
    }
}

/// One recorded hook invocation.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum HookEvent {
    Message {
        text: Option<String>,
        is_update: bool,
    },
    BotCommand {
        token: String,
        is_update: bool,
    },
    CallbackQuery {
        data: Option<String>,
    },
    ChannelPost {
        text: Option<String>,
    },
    QuestionAnswer {
        identifier: String,
        reply_stripped: bool,
    },
}

/// Hooks that record every invocation. `fail_message_hook` makes
/// `handle_message` return an error, for the top-level catch tests.
#[derive(Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<HookEvent>>,
    pub fail_message_hook: bool,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: HookEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl EventHooks for RecordingHooks {
    async fn handle_message(&self, message: &Message, is_update: bool) -> Result<()> {
        self.record(HookEvent::Message {
            text: message.text.clone(),
            is_update,
        });
        if self.fail_message_hook {
            return Err(minibot_core::BotError::Handler(
                "message hook exploded".to_string(),
            ));
        }
        Ok(())
    }

    async fn handle_bot_command(
        &self,
        entity: &AnnotatedEntity,
        _message: &Message,
        is_update: bool,
    ) -> Result<()> {
        self.record(HookEvent::BotCommand {
            token: entity.string.clone(),
            is_update,
        });
        Ok(())
    }

    async fn handle_callback_query(&self, query: &CallbackQuery) -> Result<()> {
        self.record(HookEvent::CallbackQuery {
            data: query.data.clone(),
        });
        Ok(())
    }

    async fn handle_channel_post(&self, post: &Message) -> Result<()> {
        self.record(HookEvent::ChannelPost {
            text: post.text.clone(),
        });
        Ok(())
    }

    async fn handle_question_answer(&self, identifier: &str, message: &Message) -> Result<()> {
        self.record(HookEvent::QuestionAnswer {
            identifier: identifier.to_string(),
            reply_stripped: message.reply_to_message.is_none(),
        });
        Ok(())
    }
}
