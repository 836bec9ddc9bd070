//! Slash commands exposed in the Telegram command menu

use teloxide::utils::command::BotCommands;

/// Telegram bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Text ➜ Any File Bot commands:")]
pub enum Command {
    #[command(description = "Open bot menu / welcome")]
    Start,
    #[command(description = "Start text → file generator")]
    Generate,
    #[command(description = "How to use")]
    Help,
    #[command(description = "Count words, characters and lines")]
    Count(String),
}
