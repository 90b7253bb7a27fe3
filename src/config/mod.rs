//! Process configuration, read once from the environment at startup.

use anyhow::{Context, Result};

pub const DEFAULT_PROBE_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot credential. The process refuses to start without it.
    pub bot_token: String,
    /// Optional GitHub credential, forwarded verbatim as a `token` header.
    pub github_token: Option<String>,
    /// Optional Gemini credential; generation fails at call time without one.
    pub gemini_api_key: Option<String>,
    /// Gemini model name.
    pub gemini_model: Option<String>,
    /// Liveness probe listen port.
    pub probe_port: u16,
    /// Telegram usernames / numeric ids allowed to talk to the bot.
    pub allowed_users: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bot_token = std::env::var("BOT_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .context("BOT_TOKEN environment variable is not set")?;

        let probe_port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port number: {raw}"))?,
            Err(_) => DEFAULT_PROBE_PORT,
        };

        Ok(Self {
            bot_token,
            github_token: non_empty_env("GITHUB_TOKEN"),
            gemini_api_key: non_empty_env("GEMINI_API_KEY"),
            gemini_model: non_empty_env("GEMINI_MODEL"),
            probe_port,
            allowed_users: parse_allowed_users(
                std::env::var("TELEGRAM_ALLOWED_USERS").ok().as_deref(),
            ),
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Comma-separated allowlist; absent or empty means everyone.
fn parse_allowed_users(raw: Option<&str>) -> Vec<String> {
    let users: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if users.is_empty() {
        vec!["*".to_string()]
    } else {
        users
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_users_default_to_wildcard() {
        assert_eq!(parse_allowed_users(None), vec!["*"]);
        assert_eq!(parse_allowed_users(Some("")), vec!["*"]);
        assert_eq!(parse_allowed_users(Some(" , ")), vec!["*"]);
    }

    #[test]
    fn allowed_users_split_and_trimmed() {
        assert_eq!(
            parse_allowed_users(Some("alice, 12345 ,bob")),
            vec!["alice", "12345", "bob"]
        );
    }
}
