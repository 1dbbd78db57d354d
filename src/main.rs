//! potsettle: poker session settlement bot
//!
//! Entry point. Loads configuration, initialises structured logging,
//! and long-polls Telegram for commands until Ctrl+C.

use anyhow::Result;
use secrecy::SecretString;
use std::time::Duration;
use tracing::{error, info, warn};

use potsettle::bot::telegram::{Message, TelegramClient};
use potsettle::bot::Dispatcher;
use potsettle::config::{self, AppConfig};
use potsettle::ledger::pokernow::PokerNowClient;

/// Pause after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load("config.toml")?;
    init_logging();

    let directory_path = cfg.directory_path();
    info!(
        bot = %cfg.bot.name,
        directory = %directory_path.display(),
        currency = %cfg.report.currency,
        "potsettle starting up"
    );

    // -- Initialise components -------------------------------------------

    let token = SecretString::new(AppConfig::resolve_env(&cfg.bot.token_env)?);
    let telegram = TelegramClient::new(token, cfg.bot.poll_timeout_secs)?;

    let ledger = PokerNowClient::new(
        Some(cfg.ledger.request_timeout_secs),
        cfg.ledger.user_agent.as_deref(),
    )?;
    let dispatcher = Dispatcher::new(Box::new(ledger), directory_path, cfg.report.clone());

    match telegram.get_me().await {
        Ok(me) => info!(username = ?me.username, "Connected to Telegram"),
        Err(e) => warn!(error = %e, "Telegram getMe failed, polling anyway"),
    }

    // -- Main loop -------------------------------------------------------

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut offset: i64 = 0;

    info!("Listening for updates. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            polled = telegram.get_updates(offset, cfg.bot.poll_timeout_secs) => {
                match polled {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            if let Some(message) = update.message {
                                handle_message(&telegram, &dispatcher, message).await;
                            }
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Polling failed, retrying");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("potsettle shut down cleanly.");
    Ok(())
}

/// Answer a single chat message, if it is a command.
async fn handle_message(telegram: &TelegramClient, dispatcher: &Dispatcher, message: Message) {
    let Some(text) = message.text.as_deref() else {
        return;
    };
    let chat_id = message.chat.id;
    let sender = message
        .from
        .as_ref()
        .map(|u| u.first_name.as_str())
        .unwrap_or("unknown");
    info!(chat_id, sender, text, "Message received");

    let Some(reply) = dispatcher.handle_text(text).await else {
        return;
    };

    let parse_mode = reply.markdown.then_some("Markdown");
    if let Err(e) = telegram.send_message(chat_id, &reply.text, parse_mode).await {
        if parse_mode.is_none() {
            error!(chat_id, error = %e, "Failed to send reply");
            return;
        }
        // Markdown rejects unbalanced `_` or `*` in nicknames; retry as plain text.
        warn!(chat_id, error = %e, "Markdown reply rejected, resending as plain text");
        if let Err(e) = telegram.send_message(chat_id, &reply.text, None).await {
            error!(chat_id, error = %e, "Failed to send reply");
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("potsettle=info"));

    let json_logging = std::env::var("POTSETTLE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
