//! Bot API client over HTTPS.
//!
//! Every method is a POST of a JSON payload to `{base}/bot{token}/{method}`.
//! The platform reports rejections inside the response envelope (with a
//! non-2xx status), so the body is decoded regardless of status and `Err` is
//! reserved for transport and decoding failures, as the core's fallback
//! probing requires.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use minibot_core::{
    ApiResponse, BotCommand, BotError, EditMessageMediaParams, EditMessageTextParams, Result,
    SendFileParams, SendMessageParams, TelegramApi,
};

pub struct HttpTelegramApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTelegramApi {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    #[instrument(skip(self, payload))]
    async fn call(&self, method: &str, payload: Value) -> Result<ApiResponse> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&payload)
            .send()
            .await
            .map_err(|e| BotError::Transport(format!("{}: {}", method, e)))?;
        let status = response.status();
        let envelope: ApiResponse = response
            .json()
            .await
            .map_err(|e| BotError::Transport(format!("{}: undecodable body: {}", method, e)))?;
        debug!(method, %status, ok = envelope.ok, "platform call completed");
        Ok(envelope)
    }

    async fn call_params<P: Serialize>(&self, method: &str, params: &P) -> Result<ApiResponse> {
        let payload = serde_json::to_value(params)
            .map_err(|e| BotError::Api(format!("{}: unserializable params: {}", method, e)))?;
        self.call(method, payload).await
    }

    /// Payload for a type-specific file send; `field` carries the file id or
    /// URL under the name the method expects.
    fn file_payload(&self, field: &str, params: &SendFileParams) -> Result<Value> {
        let mut payload = json!({
            "chat_id": params.chat_id,
            field: params.file,
        });
        if let Some(caption) = &params.caption {
            payload["caption"] = Value::String(caption.clone());
        }
        if let Some(markup) = &params.reply_markup {
            payload["reply_markup"] = serde_json::to_value(markup)
                .map_err(|e| BotError::Api(format!("unserializable reply markup: {}", e)))?;
        }
        Ok(payload)
    }

    async fn send_file(
        &self,
        method: &str,
        field: &str,
        params: SendFileParams,
    ) -> Result<ApiResponse> {
        let payload = self.file_payload(field, &params)?;
        self.call(method, payload).await
    }
}

#[async_trait]
impl TelegramApi for HttpTelegramApi {
    async fn send_message(&self, params: SendMessageParams) -> Result<ApiResponse> {
        self.call_params("sendMessage", &params).await
    }

    async fn send_photo(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendPhoto", "photo", params).await
    }

    async fn send_audio(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendAudio", "audio", params).await
    }

    async fn send_video(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendVideo", "video", params).await
    }

    async fn send_animation(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendAnimation", "animation", params).await
    }

    async fn send_voice(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendVoice", "voice", params).await
    }

    async fn send_video_note(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendVideoNote", "video_note", params).await
    }

    async fn send_document(&self, params: SendFileParams) -> Result<ApiResponse> {
        self.send_file("sendDocument", "document", params).await
    }

    async fn edit_message_text(&self, params: EditMessageTextParams) -> Result<ApiResponse> {
        self.call_params("editMessageText", &params).await
    }

    async fn edit_message_media(&self, params: EditMessageMediaParams) -> Result<ApiResponse> {
        self.call_params("editMessageMedia", &params).await
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<ApiResponse> {
        self.call(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<ApiResponse> {
        self.call(
            "answerCallbackQuery",
            json!({ "callback_query_id": callback_query_id }),
        )
        .await
    }

    async fn set_my_commands(&self, commands: Vec<BotCommand>) -> Result<ApiResponse> {
        self.call("setMyCommands", json!({ "commands": commands })).await
    }

    async fn get_me(&self) -> Result<ApiResponse> {
        self.call("getMe", json!({})).await
    }

    async fn set_webhook(&self, url: &str) -> Result<ApiResponse> {
        self.call("setWebhook", json!({ "url": url })).await
    }

    async fn get_webhook_info(&self) -> Result<ApiResponse> {
        self.call("getWebhookInfo", json!({})).await
    }
}
