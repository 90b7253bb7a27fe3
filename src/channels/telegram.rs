//! Telegram channel — long-polls the Bot API for updates and carries all
//! outbound traffic (messages, edits, documents, callback acks).

use super::traits::{Channel, ChannelError, ChannelEvent, EventKind, MessageId};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

pub struct TelegramChannel {
    bot_token: String,
    allowed_users: Vec<String>,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    fn is_user_allowed(&self, username: &str) -> bool {
        self.allowed_users.iter().any(|u| u == "*" || u == username)
    }

    fn is_any_user_allowed<'a, I>(&self, identities: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        identities.into_iter().any(|id| self.is_user_allowed(id))
    }

    /// Classify inbound text: `/command args` vs plain message.
    fn classify(text: &str) -> EventKind {
        if let Some(rest) = text.strip_prefix('/') {
            let name = rest.split_whitespace().next().unwrap_or("");
            // "/cmd@BotName" form used in group chats
            let name = name.split('@').next().unwrap_or(name);
            if !name.is_empty() {
                return EventKind::Command(name.to_string());
            }
        }
        EventKind::Text(text.to_string())
    }

    /// Turn a Bot API response into the caller's result, distinguishing a
    /// formatter rejection from everything else.
    async fn check_api_response(
        response: reqwest::Response,
        markdown: bool,
    ) -> Result<Value, ChannelError> {
        let status = response.status();
        let body: Value = response.json().await?;

        if body.get("ok").and_then(Value::as_bool) == Some(true) {
            return Ok(body);
        }

        let description = body
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();

        // A 400 on a formatted send is the parser refusing the markup
        if markdown && status.as_u16() == 400 {
            return Err(ChannelError::Rendering(description));
        }
        Err(ChannelError::Api(format!("{status}: {description}")))
    }

    fn event_from_message(&self, message: &Value) -> Option<ChannelEvent> {
        let text = message.get("text").and_then(Value::as_str)?;

        let username = message
            .get("from")
            .and_then(|f| f.get("username"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let user_id = message
            .get("from")
            .and_then(|f| f.get("id"))
            .and_then(Value::as_i64)
            .map(|id| id.to_string());

        let mut identities = vec![username];
        if let Some(ref id) = user_id {
            identities.push(id.as_str());
        }
        if !self.is_any_user_allowed(identities.iter().copied()) {
            tracing::warn!(
                username,
                user_id = user_id.as_deref().unwrap_or("unknown"),
                "Telegram: ignoring message from unauthorized user"
            );
            return None;
        }

        let chat_id = message
            .get("chat")
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64)
            .map(|id| id.to_string())
            .unwrap_or_default();

        Some(ChannelEvent {
            id: Uuid::new_v4().to_string(),
            chat_id,
            sender: username.to_string(),
            kind: Self::classify(text),
            timestamp: now_unix(),
        })
    }

    fn event_from_callback(&self, callback: &Value) -> Option<ChannelEvent> {
        let callback_id = callback.get("id").and_then(Value::as_str)?.to_string();
        let data = callback
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let chat_id = callback
            .get("message")
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64)
            .map(|id| id.to_string())?;
        let sender = callback
            .get("from")
            .and_then(|f| f.get("username"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        Some(ChannelEvent {
            id: Uuid::new_v4().to_string(),
            chat_id,
            sender,
            kind: EventKind::Callback { callback_id, data },
            timestamp: now_unix(),
        })
    }
}

fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(
        &self,
        chat_id: &str,
        text: &str,
        markdown: bool,
    ) -> Result<MessageId, ChannelError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        if markdown {
            body["parse_mode"] = Value::from("Markdown");
        }

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        let body = Self::check_api_response(response, markdown).await?;
        let message_id = body
            .get("result")
            .and_then(|r| r.get("message_id"))
            .and_then(Value::as_i64)
            .ok_or_else(|| ChannelError::Api("sendMessage response missing message_id".into()))?;
        Ok(MessageId(message_id))
    }

    async fn edit(
        &self,
        chat_id: &str,
        message: &MessageId,
        text: &str,
        markdown: bool,
    ) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message.0,
            "text": text,
            "disable_web_page_preview": true,
        });
        if markdown {
            body["parse_mode"] = Value::from("Markdown");
        }

        let response = self
            .client
            .post(self.api_url("editMessageText"))
            .json(&body)
            .send()
            .await?;

        Self::check_api_response(response, markdown).await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: &str,
        path: &Path,
        filename: &str,
        caption: &str,
    ) -> Result<(), ChannelError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ChannelError::Api(format!("cannot read export artifact: {e}")))?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.api_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;

        Self::check_api_response(response, false).await?;
        Ok(())
    }

    async fn ack_callback(&self, callback_id: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({ "callback_query_id": callback_id });
        let response = self
            .client
            .post(self.api_url("answerCallbackQuery"))
            .json(&body)
            .send()
            .await?;
        Self::check_api_response(response, false).await?;
        Ok(())
    }

    async fn listen(&self, tx: tokio::sync::mpsc::Sender<ChannelEvent>) -> anyhow::Result<()> {
        let mut offset: i64 = 0;

        tracing::info!("Telegram channel listening for messages...");

        loop {
            let url = self.api_url("getUpdates");
            let body = serde_json::json!({
                "offset": offset,
                "timeout": 30,
                "allowed_updates": ["message", "callback_query"]
            });

            let resp = match self.client.post(&url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    crate::health::mark_error("telegram", &e);
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            let data: Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            crate::health::mark_ok("telegram");

            if let Some(results) = data.get("result").and_then(Value::as_array) {
                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                        offset = uid + 1;
                    }

                    let event = if let Some(message) = update.get("message") {
                        self.event_from_message(message)
                    } else if let Some(callback) = update.get("callback_query") {
                        self.event_from_callback(callback)
                    } else {
                        None
                    };

                    if let Some(event) = event {
                        if tx.send(event).await.is_err() {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_embeds_token_and_method() {
        let ch = TelegramChannel::new("123:ABC".into(), vec![]);
        assert_eq!(
            ch.api_url("getMe"),
            "https://api.telegram.org/bot123:ABC/getMe"
        );
    }

    #[test]
    fn classify_splits_commands_from_text() {
        assert_eq!(
            TelegramChannel::classify("/start"),
            EventKind::Command("start".into())
        );
        assert_eq!(
            TelegramChannel::classify("/download now"),
            EventKind::Command("download".into())
        );
        assert_eq!(
            TelegramChannel::classify("/help@readmegen_bot"),
            EventKind::Command("help".into())
        );
        assert_eq!(
            TelegramChannel::classify("https://github.com/acme/widget"),
            EventKind::Text("https://github.com/acme/widget".into())
        );
        assert_eq!(TelegramChannel::classify("/"), EventKind::Text("/".into()));
    }

    #[test]
    fn user_allowed_wildcard() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        assert!(ch.is_user_allowed("anyone"));
    }

    #[test]
    fn user_allowed_specific_exact_match_only() {
        let ch = TelegramChannel::new("t".into(), vec!["alice".into()]);
        assert!(ch.is_user_allowed("alice"));
        assert!(!ch.is_user_allowed("alice_bot"));
        assert!(!ch.is_user_allowed("malice"));
        assert!(!ch.is_user_allowed(""));
    }

    #[test]
    fn user_allowed_by_numeric_id_identity() {
        let ch = TelegramChannel::new("t".into(), vec!["123456789".into()]);
        assert!(ch.is_any_user_allowed(["unknown", "123456789"]));
        assert!(!ch.is_any_user_allowed(["unknown", "987"]));
    }

    #[test]
    fn message_update_becomes_text_event() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        let message = serde_json::json!({
            "text": "github.com/acme/widget",
            "from": {"username": "alice", "id": 7},
            "chat": {"id": 100}
        });
        let event = ch.event_from_message(&message).unwrap();
        assert_eq!(event.chat_id, "100");
        assert_eq!(event.sender, "alice");
        assert_eq!(event.kind, EventKind::Text("github.com/acme/widget".into()));
    }

    #[test]
    fn unauthorized_message_dropped() {
        let ch = TelegramChannel::new("t".into(), vec!["bob".into()]);
        let message = serde_json::json!({
            "text": "hi",
            "from": {"username": "alice", "id": 7},
            "chat": {"id": 100}
        });
        assert!(ch.event_from_message(&message).is_none());
    }

    #[test]
    fn callback_update_becomes_callback_event() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        let callback = serde_json::json!({
            "id": "cb-1",
            "data": "download",
            "from": {"username": "alice"},
            "message": {"chat": {"id": 100}}
        });
        let event = ch.event_from_callback(&callback).unwrap();
        assert_eq!(event.chat_id, "100");
        assert_eq!(
            event.kind,
            EventKind::Callback {
                callback_id: "cb-1".into(),
                data: "download".into()
            }
        );
    }

    #[test]
    fn non_text_message_ignored() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        let message = serde_json::json!({
            "photo": [],
            "from": {"username": "alice"},
            "chat": {"id": 100}
        });
        assert!(ch.event_from_message(&message).is_none());
    }
}
