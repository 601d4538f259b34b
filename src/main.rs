mod config;
mod logging;
mod relay;

use std::sync::Arc;
use std::time::Duration;

use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tracing::{error, info, warn};

use config::Config;
use relay::{BotIdentity, InboundEvent, Relay, TelegramClient};

/// Exit status when the bot lacks channel permissions at startup.
const EXIT_MISSING_PERMISSIONS: i32 = 3;

/// Long-polling timeout for `getUpdates`.
const POLLING_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            // Logging needs the configured log path, so this goes to stderr only.
            eprintln!("❌ Missing or invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let guard = match logging::init(&config.log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ Failed to set up logging at {}: {e}", config.log_file.display());
            std::process::exit(1);
        }
    };

    info!("🚀 Starting bot for {} (ID: {})", config.channel_title, config.channel_id);

    let bot = Bot::new(&config.telegram_bot_token);

    let identity = match bot.get_me().await {
        Ok(me) => {
            info!("Bot user ID: {}, username: @{}", me.id, me.username());
            BotIdentity {
                id: me.id,
                username: me.username().to_string(),
            }
        }
        Err(e) => {
            error!("Failed to get bot info: {e}");
            drop(guard);
            std::process::exit(1);
        }
    };

    let relay = Arc::new(Relay::new(config, identity, TelegramClient::new(bot.clone())));

    if !relay.check_permissions().await.is_ready() {
        if relay.config().exit_on_missing_permissions {
            error!("Insufficient permissions! Shutting down.");
            drop(guard);
            std::process::exit(EXIT_MISSING_PERMISSIONS);
        }
        warn!("Insufficient permissions, starting anyway; voice messages will be refused until fixed");
    }

    if let Err(e) = bot.delete_webhook().await {
        warn!("Failed to delete webhook: {e}");
    }

    let handler = Update::filter_message().endpoint(handle_message);
    let listener = Polling::builder(bot.clone()).timeout(POLLING_TIMEOUT).build();

    info!("Bot started successfully");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay])
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    info!("Bot stopped");
}

async fn handle_message(msg: Message, relay: Arc<Relay<TelegramClient>>) -> ResponseResult<()> {
    let event = InboundEvent::from_message(&msg);
    relay.handle(&event).await;
    Ok(())
}
