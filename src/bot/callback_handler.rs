//! Callback Handler module for processing inline keyboard callback queries

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, error};

use super::dialogue_manager::{ConversionFlow, InboundEvent};
use super::ui_builder::{CALLBACK_KIND_PREFIX, CALLBACK_START_OVER};

/// Map inline button payloads onto events.
///
/// Unknown payloads still go through type selection so they get the same
/// "unsupported type" answer a typed token would.
pub fn classify_callback(data: &str) -> InboundEvent {
    if data == CALLBACK_START_OVER {
        InboundEvent::StartOver
    } else {
        let token = data.strip_prefix(CALLBACK_KIND_PREFIX).unwrap_or(data);
        InboundEvent::TypeChoice(token.to_string())
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, flow: Arc<ConversionFlow>) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    // Answer first to remove the loading state while the file is built
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        error!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let chat_id = match &q.message {
        Some(msg) => msg.chat().id,
        None => ChatId(q.from.id.0 as i64),
    };
    let event = classify_callback(q.data.as_deref().unwrap_or(""));

    if let Err(e) = flow
        .handle_event(chat_id, event, q.from.language_code.as_deref())
        .await
    {
        error!(user_id = %q.from.id, error = %e, "Failed to handle callback query");
        return Err(e.into());
    }
    Ok(())
}
