//! Message Handler module for processing incoming Telegram messages

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::Me;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error};

use super::commands::Command;
use super::dialogue_manager::{ConversionFlow, InboundEvent};
use super::ui_builder::{MENU_GENERATE, MENU_HELP, MENU_MORE};

/// The leading `/name` or `/name@bot` token, if the text opens with one.
///
/// Code comments (`// x`, `/* x */`) and paths (`/usr/bin/env`) do not.
fn command_token(text: &str) -> Option<&str> {
    let token = text.split_whitespace().next()?;
    let body = token.strip_prefix('/')?;
    let (name, mention) = match body.split_once('@') {
        Some((name, bot)) => (name, Some(bot)),
        None => (body, None),
    };
    let is_word = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    (is_word(name) && mention.map_or(true, is_word)).then_some(token)
}

fn command_event(command: Command) -> InboundEvent {
    match command {
        Command::Start => InboundEvent::Start,
        Command::Generate => InboundEvent::Generate,
        Command::Help => InboundEvent::Help,
        Command::Count(rest) => InboundEvent::Count(rest),
    }
}

/// Turn message text into an event; commands and menu labels first
pub fn classify_text(text: &str, bot_username: &str) -> InboundEvent {
    if let Some(token) = command_token(text) {
        // Deep links arrive as `/start <payload>`; the payload is ignored
        let parsed = Command::parse(text, bot_username).or_else(|e| {
            if text.trim() == token {
                Err(e)
            } else {
                Command::parse(token, bot_username)
            }
        });
        return match parsed {
            Ok(command) => command_event(command),
            Err(e) => {
                debug!(error = %e, "Unrecognized command");
                InboundEvent::UnknownCommand
            }
        };
    }

    let trimmed = text.trim();
    // Older clients may trim the "(/generate)" suffix off the button label
    let generate_label = MENU_GENERATE.trim_end_matches(" (/generate)");
    if trimmed.starts_with(generate_label) {
        InboundEvent::Generate
    } else if trimmed == MENU_HELP {
        InboundEvent::Help
    } else if trimmed == MENU_MORE {
        InboundEvent::More
    } else {
        InboundEvent::Text(text.to_string())
    }
}

/// Map a Telegram message onto an event
pub fn classify_message(msg: &Message, bot_username: &str) -> InboundEvent {
    if let Some(text) = msg.text() {
        classify_text(text, bot_username)
    } else if let Some(doc) = msg.document() {
        InboundEvent::Document {
            file_id: doc.file.id.to_string(),
            size: u64::from(doc.file.size),
        }
    } else {
        InboundEvent::Unsupported
    }
}

pub async fn message_handler(msg: Message, me: Me, flow: Arc<ConversionFlow>) -> Result<()> {
    // Extract user's language code from Telegram
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_deref());

    let event = classify_message(&msg, me.username());
    debug!(user_id = %msg.chat.id, event = ?event, "Received message from user");

    if let Err(e) = flow.handle_event(msg.chat.id, event, language_code).await {
        error!(user_id = %msg.chat.id, error = %e, "Failed to handle message");
        return Err(e.into());
    }
    Ok(())
}
