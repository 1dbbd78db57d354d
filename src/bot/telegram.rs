//! Telegram Bot API client.
//!
//! Long-polls `getUpdates` and answers with `sendMessage`.
//!
//! API docs: https://core.telegram.org/bots/api
//! Auth: bot token embedded in the method URL (`/bot<token>/<method>`).
//! Errors are stripped of their URL before being returned so the token
//! never reaches the logs.

use anyhow::{Context, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://api.telegram.org";

/// Extra time on top of the long-poll timeout before the HTTP request gives up.
const HTTP_GRACE_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// API response types (Telegram JSON → Rust)
// ---------------------------------------------------------------------------

/// Envelope around every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => anyhow::bail!(
                "Telegram {method} failed: {}",
                self.description.unwrap_or_else(|| "no description".to_string())
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct TelegramClient {
    http: Client,
    token: SecretString,
}

impl TelegramClient {
    /// Create a client whose HTTP timeout outlasts `poll_timeout_secs`.
    pub fn new(token: SecretString, poll_timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + HTTP_GRACE_SECS))
            .build()
            .context("Failed to build HTTP client for Telegram")?;

        Ok(Self { http, token })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{BASE_URL}/bot{}/{method}", self.token.expose_secret())
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let resp = self
            .http
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Telegram {method} request failed"))?;

        let envelope: ApiResponse<T> = resp
            .json()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Failed to parse Telegram {method} response"))?;

        envelope.into_result(method)
    }

    /// The bot's own account; a cheap token check at startup.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", json!({})).await
    }

    /// Long-poll for updates newer than `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                json!({
                    "offset": offset,
                    "timeout": timeout_secs,
                    "allowed_updates": ["message"],
                }),
            )
            .await?;
        debug!(count = updates.len(), offset, "Telegram updates received");
        Ok(updates)
    }

    /// Send `text` to `chat_id`, optionally with a parse mode (`Markdown`).
    pub async fn send_message(&self, chat_id: i64, text: &str, parse_mode: Option<&str>) -> Result<()> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode);
        }
        let _: Message = self.call("sendMessage", body).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
