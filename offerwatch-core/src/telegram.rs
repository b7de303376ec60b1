use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::NotifyError;
use crate::notifier::MessageSink;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Minimal Telegram Bot API client: outgoing messages and update polling.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chat {
    pub id: i64,
}

impl TelegramClient {
    pub fn new(client: Client, api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), NotifyError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(message_id) = reply_to {
            body["reply_to_message_id"] = json!(message_id);
        }
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let parsed = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text).ok();
        match parsed {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) => Err(NotifyError::Rejected {
                status,
                description: api.description.unwrap_or_default(),
            }),
            None => Err(NotifyError::Rejected {
                status,
                description: text,
            }),
        }
    }

    /// Long-polls for updates newer than `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, NotifyError> {
        let mut query = vec![("timeout", timeout_secs.to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&query)
            .timeout(std::time::Duration::from_secs(timeout_secs + 10))
            .send()
            .await?;
        let status = response.status();
        let api: ApiResponse<Vec<Update>> = response.json().await?;
        if !status.is_success() || !api.ok {
            return Err(NotifyError::Rejected {
                status,
                description: api.description.unwrap_or_default(),
            });
        }
        Ok(api.result.unwrap_or_default())
    }
}

/// Sends every notification to one preconfigured chat.
#[derive(Debug, Clone)]
pub struct TelegramSink {
    client: TelegramClient,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(client: TelegramClient, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.client.send_message(&self.chat_id, text, None).await
    }
}
