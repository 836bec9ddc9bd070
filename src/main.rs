use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use textfile_bot::bot::{schema, Command, ConversionFlow, TelegramTransport};
use textfile_bot::config::{BotConfig, LogFormat};
use textfile_bot::dialogue::SessionStore;
use textfile_bot::file_generator::DocumentGenerator;
use textfile_bot::localization::{get_localization_manager, init_localization_with_default};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("textfile_bot=info,teloxide=warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet
            eprintln!("❌ {e}");
            return Err(e.into());
        }
    };

    init_tracing(config.log_format);
    info!("Starting Text ➜ Any File Bot");

    init_localization_with_default(&config.default_language)?;
    info!(
        default_language = get_localization_manager().default_language(),
        "Localization ready"
    );

    let bot = Bot::new(&config.bot_token);

    // Register the command menu; some hosts reject this, which is harmless
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    let flow = Arc::new(
        ConversionFlow::new(
            SessionStore::new(),
            Arc::new(TelegramTransport::new(bot.clone())),
            Arc::new(DocumentGenerator::new(config.generator.clone())),
        )
        .with_max_count_file_size(config.max_count_file_size),
    );

    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![flow])
        .default_handler(|upd| async move {
            warn!(update = ?upd.kind, "Unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");
    Ok(())
}
