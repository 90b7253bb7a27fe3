use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Handle to a previously sent message, usable for later edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageId(pub i64);

/// Outbound failures the session layer needs to tell apart.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The platform's markup parser rejected a formatted message. The
    /// caller retries once with formatting disabled.
    #[error("message rejected by the platform formatter: {0}")]
    Rendering(String),
    #[error("channel API error: {0}")]
    Api(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// What arrived on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Plain text message.
    Text(String),
    /// A `/command`, with the leading slash stripped.
    Command(String),
    /// A button press to acknowledge and dispatch.
    Callback { callback_id: String, data: String },
}

/// An inbound event delivered by a channel.
#[derive(Debug, Clone)]
pub struct ChannelEvent {
    pub id: String,
    pub chat_id: String,
    pub sender: String,
    pub kind: EventKind,
    pub timestamp: u64,
}

/// Core channel trait — implement for any messaging platform.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name
    fn name(&self) -> &str;

    /// Send a text message, optionally asking the platform to render markup.
    async fn send(
        &self,
        chat_id: &str,
        text: &str,
        markdown: bool,
    ) -> Result<MessageId, ChannelError>;

    /// Edit a previously sent message in place.
    async fn edit(
        &self,
        chat_id: &str,
        message: &MessageId,
        text: &str,
        markdown: bool,
    ) -> Result<(), ChannelError>;

    /// Deliver a file attachment with a caption.
    async fn send_document(
        &self,
        chat_id: &str,
        path: &Path,
        filename: &str,
        caption: &str,
    ) -> Result<(), ChannelError>;

    /// Acknowledge a button press so the client stops its spinner.
    async fn ack_callback(&self, callback_id: &str) -> Result<(), ChannelError>;

    /// Start listening for incoming events (long-running).
    async fn listen(&self, tx: tokio::sync::mpsc::Sender<ChannelEvent>) -> anyhow::Result<()>;

    /// Check if channel is healthy
    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_clone_preserves_fields() {
        let event = ChannelEvent {
            id: "42".into(),
            chat_id: "100".into(),
            sender: "alice".into(),
            kind: EventKind::Command("start".into()),
            timestamp: 999,
        };

        let cloned = event.clone();
        assert_eq!(cloned.id, "42");
        assert_eq!(cloned.chat_id, "100");
        assert_eq!(cloned.sender, "alice");
        assert_eq!(cloned.kind, EventKind::Command("start".into()));
        assert_eq!(cloned.timestamp, 999);
    }

    #[test]
    fn rendering_error_displays_description() {
        let err = ChannelError::Rendering("can't parse entities".into());
        assert!(err.to_string().contains("can't parse entities"));
    }
}
