//! Conversation flow: await link → fetch metadata → generate README →
//! offer download.
//!
//! One session per chat, held in process memory and passed into the engine
//! by the event loop. Errors from the collaborators never reach the user
//! raw; each kind maps to one explanatory message. There are no automatic
//! retries anywhere in this flow — the user resubmitting is the retry loop.

use crate::channels::{Channel, ChannelError, ChannelEvent, EventKind, MessageId};
use crate::export::Exporter;
use crate::generator::ReadmeGenerator;
use crate::github::{FetchError, RepoHost, RepoMetadata};
use crate::sanitize::{escape_markdown, safe_preview};
use std::collections::HashMap;
use std::sync::Arc;

const PREVIEW_LINES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingReference,
    Fetching,
    Generating,
    Ready,
}

/// Per-chat conversational state. Lives only in process memory; a restart
/// loses every session.
#[derive(Debug)]
pub struct Session {
    pub state: SessionState,
    pub repo: Option<RepoMetadata>,
    pub readme: Option<String>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            repo: None,
            readme: None,
        }
    }
}

/// Explicit session storage keyed by chat identity, created lazily on
/// first interaction.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_mut(&mut self, chat_id: &str) -> &mut Session {
        self.sessions
            .entry(chat_id.to_string())
            .or_insert_with(Session::new)
    }

    pub fn get(&self, chat_id: &str) -> Option<&Session> {
        self.sessions.get(chat_id)
    }
}

pub struct SessionEngine {
    channel: Arc<dyn Channel>,
    repo_host: Arc<dyn RepoHost>,
    generator: ReadmeGenerator,
    exporter: Exporter,
}

impl SessionEngine {
    pub fn new(
        channel: Arc<dyn Channel>,
        repo_host: Arc<dyn RepoHost>,
        generator: ReadmeGenerator,
        exporter: Exporter,
    ) -> Self {
        Self {
            channel,
            repo_host,
            generator,
            exporter,
        }
    }

    /// Dispatch one inbound event against its session. Never returns an
    /// error: every path ends in some response to the user.
    pub async fn handle_event(&self, store: &mut SessionStore, event: ChannelEvent) {
        let chat_id = event.chat_id.clone();
        match event.kind {
            EventKind::Command(ref cmd) => match cmd.as_str() {
                "start" => {
                    self.handle_start(store.session_mut(&chat_id), &chat_id)
                        .await;
                }
                "help" => {
                    // Informational side channel, no state change
                    self.say(&chat_id, HELP_TEXT).await;
                }
                "download" => {
                    self.handle_download(store.session_mut(&chat_id), &chat_id)
                        .await;
                }
                other => {
                    tracing::debug!(command = other, "unknown command");
                    self.say(&chat_id, "Unknown command. Try /start, /help or /download.")
                        .await;
                }
            },
            EventKind::Callback { callback_id, data } => {
                if let Err(e) = self.channel.ack_callback(&callback_id).await {
                    tracing::warn!(error = %e, "callback ack failed");
                }
                if data == "download" {
                    self.handle_download(store.session_mut(&chat_id), &chat_id)
                        .await;
                }
            }
            EventKind::Text(ref text) => {
                let session = store.session_mut(&chat_id);
                if session.state == SessionState::AwaitingReference {
                    self.handle_reference(session, &chat_id, text).await;
                } else {
                    self.say(&chat_id, "Send /start to begin generating a README.")
                        .await;
                }
            }
        }
    }

    async fn handle_start(&self, session: &mut Session, chat_id: &str) {
        // Restarting supersedes any held document
        session.state = SessionState::AwaitingReference;
        session.repo = None;
        session.readme = None;
        self.say(chat_id, WELCOME_TEXT).await;
    }

    async fn handle_reference(&self, session: &mut Session, chat_id: &str, text: &str) {
        let reference = text.trim();

        // Coarse shape check before spending a network call
        if !(reference.contains("github.com") && reference.contains('/')) {
            self.say(
                chat_id,
                "⚠️ *Invalid GitHub URL*\n\nPlease provide a valid GitHub repository link.\n\
                 📝 Format: https://github.com/username/repository",
            )
            .await;
            return;
        }

        session.state = SessionState::Fetching;
        let progress = self.say(chat_id, "🔍 *Analyzing repository...*").await;
        let progress = self
            .amend(chat_id, progress, "📊 *Fetching repository data...*")
            .await;

        let repo = match self.repo_host.fetch(reference).await {
            Ok(repo) => {
                crate::health::mark_ok("github");
                repo
            }
            Err(e) => {
                tracing::warn!(reference, error = %e, "repository fetch failed");
                crate::health::mark_error("github", &e);
                session.state = SessionState::AwaitingReference;
                self.amend(chat_id, progress, fetch_error_text(&e)).await;
                return;
            }
        };

        self.amend(chat_id, progress, &summary_text(&repo)).await;
        session.repo = Some(repo.clone());
        session.state = SessionState::Generating;

        let generating = self
            .say(chat_id, "🤖 *Generating README with Gemini AI...*")
            .await;
        let generating = self
            .amend(chat_id, generating, "⚡ *Processing repository structure...*")
            .await;
        let generating = self
            .amend(
                chat_id,
                generating,
                "📝 *Crafting professional documentation...*",
            )
            .await;

        match self.generator.generate(&repo).await {
            Ok(readme) => {
                crate::health::mark_ok("gemini");
                let preview = preview_of(&readme);
                session.readme = Some(readme);
                session.state = SessionState::Ready;
                self.amend(
                    chat_id,
                    generating,
                    &format!(
                        "✅ *README Generated Successfully!*\n\n📄 Preview:\n{preview}\n\n\
                         Use /download to get your README file."
                    ),
                )
                .await;
            }
            Err(e) => {
                crate::health::mark_error("gemini", &e);
                session.readme = None;
                session.state = SessionState::Idle;
                self.amend(
                    chat_id,
                    generating,
                    "❌ *README Generation Failed*\n\nThe AI service is temporarily \
                     unavailable. Please try again in a few moments with /start.",
                )
                .await;
            }
        }
    }

    async fn handle_download(&self, session: &mut Session, chat_id: &str) {
        let Some(readme) = session.readme.clone() else {
            self.say(
                chat_id,
                "⚠️ *No README Found*\n\nPlease generate a README first by sending a \
                 GitHub repository link. Use /start to begin.",
            )
            .await;
            return;
        };

        let name_hint = session.repo.as_ref().map_or("project", |r| r.name.as_str());

        let path = match self.exporter.export(&readme, name_hint).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                self.say(chat_id, &format!("❌ Download failed: {e}. Please try again."))
                    .await;
                return;
            }
        };

        let filename = Exporter::artifact_name(name_hint);
        let delivery = self
            .channel
            .send_document(chat_id, &path, &filename, DOCUMENT_CAPTION)
            .await;

        // The artifact never outlives one delivery attempt
        self.exporter.cleanup(&path).await;

        if let Err(e) = delivery {
            tracing::warn!(error = %e, "document delivery failed");
            self.say(chat_id, &format!("❌ Download failed: {e}. Please try again."))
                .await;
        }
    }

    /// Send with markdown, retrying once unformatted if the platform's
    /// parser rejects the markup. Other send failures are logged; silence
    /// toward the user only ever means the transport is fully down.
    async fn say(&self, chat_id: &str, text: &str) -> Option<MessageId> {
        match self.channel.send(chat_id, text, true).await {
            Ok(id) => Some(id),
            Err(ChannelError::Rendering(desc)) => {
                tracing::debug!(reason = %desc, "markdown send rejected, retrying plain");
                match self.channel.send(chat_id, text, false).await {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::warn!(error = %e, "plain-text fallback send failed");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "send failed");
                None
            }
        }
    }

    /// Edit a progress message in place, falling back to a fresh send when
    /// the edit fails. Cosmetic only: flow outcome never depends on it.
    async fn amend(
        &self,
        chat_id: &str,
        message: Option<MessageId>,
        text: &str,
    ) -> Option<MessageId> {
        if let Some(ref id) = message {
            match self.channel.edit(chat_id, id, text, true).await {
                Ok(()) => return message,
                Err(ChannelError::Rendering(desc)) => {
                    tracing::debug!(reason = %desc, "markdown edit rejected, retrying plain");
                    if self.channel.edit(chat_id, id, text, false).await.is_ok() {
                        return message;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "edit failed");
                }
            }
        }
        self.say(chat_id, text).await
    }
}

fn fetch_error_text(error: &FetchError) -> &'static str {
    match error {
        FetchError::InvalidReferenceFormat => {
            "⚠️ *Invalid GitHub URL*\n\nI could not extract an owner/repository pair \
             from that link. Format: https://github.com/username/repository"
        }
        FetchError::RepositoryNotFound => {
            "❌ *Repository Not Found*\n\nPlease check the link and try again."
        }
        FetchError::AccessDenied => {
            "❌ *Access Denied*\n\nThe repository may be private, or the API rate \
             limit was hit. Please try again later."
        }
        FetchError::UpstreamError { .. } => {
            "❌ *GitHub Error*\n\nGitHub returned an unexpected response. Please try \
             again shortly."
        }
        FetchError::Timeout => {
            "❌ *Request Timed Out*\n\nGitHub took too long to answer. Please try \
             again."
        }
        FetchError::NetworkUnavailable => {
            "❌ *Network Error*\n\nCould not reach GitHub. Please try again."
        }
    }
}

fn summary_text(repo: &RepoMetadata) -> String {
    let description = repo
        .description
        .as_deref()
        .unwrap_or("No description available");
    let language = repo.language.as_deref().unwrap_or("Not specified");
    let topics = if repo.topics.is_empty() {
        "None".to_string()
    } else {
        repo.topics.join(", ")
    };
    let license = repo.license.as_deref().unwrap_or("None");

    format!(
        "📦 *Repository Analysis Complete!*\n\n\
         🏷️ Name: {name}\n\
         👤 Owner: {owner}\n\
         📝 Description: {description}\n\
         🌟 Stars: {stars}\n\
         💻 Language: {language}\n\
         🏷️ Topics: {topics}\n\
         📄 License: {license}",
        name = escape_markdown(&repo.name),
        owner = escape_markdown(&repo.owner),
        description = escape_markdown(description),
        stars = repo.stars,
        language = escape_markdown(language),
        topics = escape_markdown(&topics),
        license = escape_markdown(license),
    )
}

fn preview_of(readme: &str) -> String {
    let head: Vec<&str> = readme.lines().take(PREVIEW_LINES).collect();
    safe_preview(&head.join("\n"))
}

const WELCOME_TEXT: &str = "🚀 *Welcome to ReadMe Generator Bot* 🚀\n\n\
✨ Your AI-Powered README Creation Assistant ✨\n\n\
🎯 What I do:\n\
• Analyze your GitHub repository\n\
• Generate a professional README with Gemini AI\n\
• Hand you the file, ready to commit\n\n\
🔗 Send me your GitHub repository link now!\n\
Example: https://github.com/username/repository";

const HELP_TEXT: &str = "🆘 *ReadMe Generator Bot - Help*\n\n\
🚀 Commands:\n\
• /start - Start the README generation flow\n\
• /download - Download your generated README\n\
• /help - Show this message\n\n\
📝 How to use:\n\
1. Send /start\n\
2. Share a public GitHub repository link\n\
3. Wait for analysis and generation\n\
4. Download your README";

const DOCUMENT_CAPTION: &str = "📄 README file generated successfully!\n\n\
Includes project overview, installation, usage and documentation sections.\n\
Thanks for using ReadMe Generator Bot! 🚀";
