use std::sync::Arc;

use futures::StreamExt;
use secrecy::ExposeSecret;

use recruit_intake::channels::{Channel, OutgoingReply, TelegramChannel};
use recruit_intake::config::{Config, IntakeMode};
use recruit_intake::intake::{messages, IntakeEngine, MemorySessionStore};
use recruit_intake::store::LibSqlBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export TELEGRAM_BOT_TOKEN=123456:ABC-...");
        std::process::exit(1);
    });

    eprintln!("🤖 Recruit Intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Mode: {}",
        match config.mode {
            IntakeMode::Guided => "guided dialogue",
            IntakeMode::Quick => "quick form",
        }
    );
    eprintln!("   Manager: {}", config.manager_handle);
    eprintln!("   Database: {}", config.db_path.display());

    // ── Store ────────────────────────────────────────────────────────────
    let leads = Arc::new(LibSqlBackend::new_local(&config.db_path).await.unwrap_or_else(|e| {
        eprintln!("Error: Failed to open database at {}: {e}", config.db_path.display());
        std::process::exit(1);
    }));

    // ── Engine ───────────────────────────────────────────────────────────
    let sessions = Arc::new(MemorySessionStore::new());
    let engine = Arc::new(IntakeEngine::new(
        leads,
        sessions,
        config.mode,
        config.restart_policy,
        config.manager_handle.clone(),
    ));

    // ── Channel ──────────────────────────────────────────────────────────
    let channel = Arc::new(TelegramChannel::new(
        config.bot_token.expose_secret().to_string(),
    ));
    channel.health_check().await?;

    let mut stream = channel.start().await?;
    tracing::info!("Bot is up and listening");

    // Each inbound message is handled independently; per-user ordering is
    // the transport's responsibility.
    while let Some(msg) = stream.next().await {
        let engine = Arc::clone(&engine);
        let channel = Arc::clone(&channel);

        tokio::spawn(async move {
            let replies = match engine.handle_message(&msg).await {
                Ok(replies) => replies,
                Err(e) => {
                    tracing::error!(user_id = msg.user_id, error = %e, "Message handling failed");
                    vec![OutgoingReply::text(messages::generic_error())]
                }
            };

            for reply in replies {
                if let Err(e) = channel.respond(&msg, reply).await {
                    tracing::error!(user_id = msg.user_id, error = %e, "Failed to send reply");
                }
            }
        });
    }

    channel.shutdown().await?;
    Ok(())
}
