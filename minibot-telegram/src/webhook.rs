//! Webhook endpoint: a minimal HTTP/1 server that decodes update envelopes
//! and hands them to the dispatcher.
//!
//! The platform retries any delivery that does not get a 2xx back, so the
//! endpoint acknowledges every request, valid or not; failures surface
//! through logs and the admin alert channel instead.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use minibot_core::{Bot, BotError, Messenger, Result, TelegramApi, Update};

/// Bound webhook endpoint, not yet serving.
pub struct WebhookServer {
    listener: TcpListener,
}

impl WebhookServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// The actual bound address; differs from the requested one when binding
    /// port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop. Each connection is served on its own task; each decoded
    /// update is dispatched on its own task so a slow handler never backs up
    /// the endpoint.
    pub async fn serve(self, bot: Arc<Bot>) -> Result<()> {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "webhook endpoint listening");
        }
        loop {
            let (stream, peer) = self.listener.accept().await?;
            debug!(%peer, "webhook connection accepted");
            let io = TokioIo::new(stream);
            let bot = bot.clone();
            tokio::spawn(async move {
                let service =
                    service_fn(move |req: Request<Incoming>| handle_request(bot.clone(), req));
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!(error = %err, "webhook connection ended with error");
                }
            });
        }
    }
}

async fn handle_request(
    bot: Arc<Bot>,
    req: Request<Incoming>,
) -> std::result::Result<Response<String>, Infallible> {
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "webhook body could not be read");
            return Ok(acknowledge());
        }
    };
    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            tokio::spawn(async move { bot.dispatch(update).await });
        }
        Err(e) => {
            warn!(error = %e, "webhook body is not an update envelope");
            tokio::spawn(async move {
                bot.messenger()
                    .alert_admin(&format!("webhook delivered an undecodable body: {}", e))
                    .await;
            });
        }
    }
    Ok(acknowledge())
}

fn acknowledge() -> Response<String> {
    Response::new("ok".to_string())
}

/// Points the platform at `public_url` unless it is already registered, and
/// reports the change to the admin chat.
pub async fn register_webhook(
    api: &Arc<dyn TelegramApi>,
    messenger: &Messenger,
    public_url: &str,
) -> Result<()> {
    let info = api.get_webhook_info().await?;
    let current = info
        .result
        .as_ref()
        .and_then(|v| v["url"].as_str())
        .unwrap_or("");
    if current == public_url {
        info!(url = public_url, "webhook already registered");
        return Ok(());
    }

    let resp = api.set_webhook(public_url).await?;
    if !resp.ok {
        return Err(BotError::Api(format!(
            "setWebhook rejected: {}",
            resp.description.unwrap_or_else(|| "no description".to_string())
        )));
    }
    info!(url = public_url, previous = current, "webhook registered");
    messenger
        .alert_admin(&format!("webhook registered at {}", public_url))
        .await;
    Ok(())
}

/// Deploy-time smoke check: posts a synthetic /ping update at the public URL
/// and verifies the endpoint acknowledges it.
pub async fn probe_webhook(public_url: &str, chat_id: i64) -> Result<()> {
    let update = json!({
        "update_id": 0,
        "message": {
            "message_id": 0,
            "date": 0,
            "chat": { "id": chat_id, "type": "private" },
            "text": "/ping webhook self-test",
            "entities": [{ "type": "bot_command", "offset": 0, "length": 5 }]
        }
    });
    let response = reqwest::Client::new()
        .post(public_url)
        .json(&update)
        .send()
        .await
        .map_err(|e| BotError::Transport(format!("webhook probe: {}", e)))?;
    if !response.status().is_success() {
        return Err(BotError::Api(format!(
            "webhook probe got status {}",
            response.status()
        )));
    }
    Ok(())
}
