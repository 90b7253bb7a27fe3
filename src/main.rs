use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

use readmegen::channels::{Channel, TelegramChannel};
use readmegen::config::Config;
use readmegen::export::Exporter;
use readmegen::generator::ReadmeGenerator;
use readmegen::github::GithubClient;
use readmegen::providers::{GeminiProvider, Provider};
use readmegen::session::{SessionEngine, SessionStore};

/// README Generator Bot — turn a GitHub link into a generated README.
#[derive(Parser, Debug)]
#[command(name = "readmegen")]
#[command(version)]
#[command(about = "Telegram bot that generates READMEs for GitHub repositories", long_about = None)]
struct Cli {
    /// Liveness probe port (overrides the PORT environment variable)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respects RUST_LOG, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::from_env()?;
    let probe_port = cli.port.unwrap_or(config.probe_port);

    let provider: Arc<dyn Provider> = Arc::new(GeminiProvider::new(
        config.gemini_api_key.as_deref(),
        config.gemini_model.as_deref(),
    ));
    if !provider.is_configured() {
        tracing::warn!("no Gemini API key configured; generation will fail until one is set");
    }

    let channel = Arc::new(TelegramChannel::new(
        config.bot_token.clone(),
        config.allowed_users.clone(),
    ));

    let engine = SessionEngine::new(
        channel.clone(),
        Arc::new(GithubClient::new(config.github_token.clone())),
        ReadmeGenerator::new(provider),
        Exporter::new(),
    );

    // Liveness probe runs on its own task; it shares nothing with the
    // session loop except the health registry.
    tokio::spawn(async move {
        if let Err(e) = readmegen::health::run_probe_server(probe_port).await {
            tracing::error!(error = %e, "liveness probe listener failed");
            readmegen::health::mark_error("probe", &e);
        }
    });

    tracing::info!("🚀 ReadMe Generator Bot is running");
    tracing::info!("🤖 AI Engine: Google Gemini");
    tracing::info!("📝 Ready to generate professional READMEs");

    // One inbound event at a time: the pipeline awaits inline, so two
    // events for the same chat can never interleave.
    let (tx, mut rx) = tokio::sync::mpsc::channel(32);
    let listener = channel.clone();
    let listen_handle = tokio::spawn(async move {
        if let Err(e) = listener.listen(tx).await {
            tracing::error!(error = %e, "Telegram listener stopped");
            readmegen::health::mark_error("telegram", &e);
        }
    });

    let mut sessions = SessionStore::new();
    while let Some(event) = rx.recv().await {
        engine.handle_event(&mut sessions, event).await;
    }

    listen_handle.abort();
    Ok(())
}
