//! Dialogue Manager module for handling dialogue state transitions
//!
//! [`ConversionFlow`] is the text-to-file conversation: it receives one
//! [`InboundEvent`] at a time for a chat, moves the chat's state along and
//! talks back through a [`Transport`].

use std::sync::Arc;

use teloxide::types::{ChatId, ReplyMarkup};
use tracing::{debug, error, info, warn};

use crate::config::MAX_COUNT_FILE_SIZE;
use crate::dialogue::{ConversionDialogue, ConversionState, SessionStore};
use crate::errors::BotError;
use crate::file_generator::{FileGenerator, FileRequest};
use crate::formats::normalize;
use crate::localization::{t_args_lang, t_lang};
use crate::text_stats::{count, decode_upload};

use super::transport::Transport;
use super::ui_builder::{
    create_main_menu_keyboard, create_type_keyboard, format_caption, format_help,
    format_text_stats, format_welcome, is_start_over_text,
};

/// Everything the conversation reacts to, already stripped of Telegram details
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `/start`
    Start,
    /// `/generate` or the generate menu button
    Generate,
    /// `/help` or the help menu button
    Help,
    /// The "More menu" button
    More,
    /// `/count <text>`
    Count(String),
    /// A slash command the bot does not know
    UnknownCommand,
    /// Free text
    Text(String),
    /// A type keyboard button; carries the raw token
    TypeChoice(String),
    /// The start-over keyboard button
    StartOver,
    /// An uploaded document
    Document { file_id: String, size: u64 },
    /// Stickers, photos and anything else without text
    Unsupported,
}

/// The text-to-file conversation state machine
pub struct ConversionFlow {
    sessions: SessionStore,
    transport: Arc<dyn Transport>,
    generator: Arc<dyn FileGenerator>,
    max_count_file_size: u64,
}

impl ConversionFlow {
    pub fn new(
        sessions: SessionStore,
        transport: Arc<dyn Transport>,
        generator: Arc<dyn FileGenerator>,
    ) -> Self {
        Self {
            sessions,
            transport,
            generator,
            max_count_file_size: MAX_COUNT_FILE_SIZE,
        }
    }

    pub fn with_max_count_file_size(mut self, limit: u64) -> Self {
        self.max_count_file_size = limit;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one event for one chat.
    ///
    /// Only storage failures are returned; generation and delivery problems
    /// are reported to the user and logged here.
    pub async fn handle_event(
        &self,
        chat_id: ChatId,
        event: InboundEvent,
        language_code: Option<&str>,
    ) -> Result<(), BotError> {
        let dialogue = self.sessions.dialogue(chat_id);
        let state = dialogue
            .get_or_default()
            .await
            .map_err(|e| BotError::Storage(e.to_string()))?;
        debug!(user_id = %chat_id, state = ?state, event = ?event, "Handling event");

        match event {
            InboundEvent::Start => {
                exit(&dialogue).await;
                self.reply(
                    chat_id,
                    format_welcome(language_code),
                    Some(ReplyMarkup::Keyboard(create_main_menu_keyboard())),
                )
                .await;
            }
            InboundEvent::Generate => self.prompt_for_text(&dialogue, chat_id, language_code).await?,
            InboundEvent::Help => {
                self.reply(chat_id, format_help(language_code), None).await;
            }
            InboundEvent::More => {
                self.reply(chat_id, t_lang("more", language_code), None).await;
            }
            InboundEvent::Count(text) => self.count_text(chat_id, &text, language_code).await,
            InboundEvent::Document { file_id, size } => {
                self.count_document(chat_id, &file_id, size, language_code)
                    .await
            }
            InboundEvent::UnknownCommand => {
                self.reply(chat_id, t_lang("fallback", language_code), None).await;
            }
            InboundEvent::StartOver => self.prompt_for_text(&dialogue, chat_id, language_code).await?,
            InboundEvent::TypeChoice(token) => match state {
                ConversionState::AwaitingType { pending_text } => {
                    self.convert(&dialogue, chat_id, pending_text, &token, language_code)
                        .await?
                }
                _ => {
                    debug!(user_id = %chat_id, "Type button pressed without pending text");
                    self.reply(chat_id, t_lang("no-pending-text", language_code), None)
                        .await;
                }
            },
            InboundEvent::Text(text) => match state {
                ConversionState::Idle => {
                    self.reply(chat_id, t_lang("fallback", language_code), None).await;
                }
                ConversionState::AwaitingText => {
                    info!(user_id = %chat_id, text_length = text.len(), "Text received for conversion");
                    dialogue
                        .update(ConversionState::AwaitingType { pending_text: text })
                        .await
                        .map_err(|e| BotError::Storage(e.to_string()))?;
                    self.prompt_for_type(chat_id, "prompt-choose-type", language_code)
                        .await;
                }
                ConversionState::AwaitingType { pending_text } => {
                    if is_start_over_text(&text) {
                        self.prompt_for_text(&dialogue, chat_id, language_code).await?;
                    } else {
                        self.convert(&dialogue, chat_id, pending_text, &text, language_code)
                            .await?;
                    }
                }
            },
            InboundEvent::Unsupported => match state {
                ConversionState::AwaitingText => {
                    self.reply(chat_id, t_lang("prompt-enter-text", language_code), None)
                        .await;
                }
                ConversionState::AwaitingType { .. } => {
                    self.prompt_for_type(chat_id, "unsupported-type", language_code)
                        .await;
                }
                ConversionState::Idle => {
                    self.reply(chat_id, t_lang("fallback", language_code), None).await;
                }
            },
        }

        Ok(())
    }

    async fn prompt_for_text(
        &self,
        dialogue: &ConversionDialogue,
        chat_id: ChatId,
        language_code: Option<&str>,
    ) -> Result<(), BotError> {
        dialogue
            .update(ConversionState::AwaitingText)
            .await
            .map_err(|e| BotError::Storage(e.to_string()))?;
        self.reply(chat_id, t_lang("prompt-enter-text", language_code), None)
            .await;
        Ok(())
    }

    async fn prompt_for_type(&self, chat_id: ChatId, key: &str, language_code: Option<&str>) {
        if let Err(e) = self
            .transport
            .send_keyboard(chat_id, t_lang(key, language_code), create_type_keyboard())
            .await
        {
            error!(user_id = %chat_id, error = %e, "Failed to send type keyboard");
        }
    }

    /// Typed and button type selections both end up here
    async fn convert(
        &self,
        dialogue: &ConversionDialogue,
        chat_id: ChatId,
        pending_text: String,
        token: &str,
        language_code: Option<&str>,
    ) -> Result<(), BotError> {
        let kind = match normalize(token) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(user_id = %chat_id, error = %e, "Rejected file type");
                self.prompt_for_type(chat_id, "unsupported-type", language_code)
                    .await;
                return Ok(());
            }
        };

        // Leave AwaitingType before generating so no failure can park the chat there
        exit(dialogue).await;

        let request = FileRequest {
            text: pending_text,
            kind,
        };
        let file = match self.generator.generate(&request) {
            Ok(file) => file,
            Err(e) => {
                error!(user_id = %chat_id, kind = %kind, error = %e, "File generation failed");
                self.reply(chat_id, t_lang("error-generation", language_code), None)
                    .await;
                return Ok(());
            }
        };

        let filename = file.filename.clone();
        match self
            .transport
            .send_document(chat_id, file, format_caption(kind, language_code))
            .await
        {
            Ok(()) => {
                info!(user_id = %chat_id, kind = %kind, filename = %filename, "File delivered");
            }
            Err(e) => {
                error!(user_id = %chat_id, kind = %kind, error = %e, "Failed to deliver file");
                self.reply(chat_id, t_lang("error-generation", language_code), None)
                    .await;
            }
        }
        Ok(())
    }

    async fn count_text(&self, chat_id: ChatId, text: &str, language_code: Option<&str>) {
        if text.trim().is_empty() {
            self.reply(chat_id, t_lang("count-usage", language_code), None)
                .await;
            return;
        }
        let stats = count(text);
        debug!(user_id = %chat_id, words = stats.words, "Counted text");
        self.reply(chat_id, format_text_stats(&stats, language_code), None)
            .await;
    }

    async fn count_document(
        &self,
        chat_id: ChatId,
        file_id: &str,
        size: u64,
        language_code: Option<&str>,
    ) {
        if size > self.max_count_file_size {
            warn!(user_id = %chat_id, size, "Document too large to count");
            let limit = self.max_count_file_size.to_string();
            self.reply(
                chat_id,
                t_args_lang("count-file-too-large", &[("limit", &limit)], language_code),
                None,
            )
            .await;
            return;
        }

        let bytes = match self.transport.fetch_document(file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(user_id = %chat_id, error = %e, "Failed to download document");
                self.reply(chat_id, t_lang("count-download-failed", language_code), None)
                    .await;
                return;
            }
        };

        match decode_upload(&bytes) {
            Some(text) => {
                let stats = count(text);
                info!(user_id = %chat_id, words = stats.words, lines = stats.lines, "Counted document");
                self.reply(chat_id, format_text_stats(&stats, language_code), None)
                    .await;
            }
            None => {
                debug!(user_id = %chat_id, "Document is not UTF-8 text");
                self.reply(chat_id, t_lang("count-not-text", language_code), None)
                    .await;
            }
        }
    }

    /// Best-effort send; failures are logged and not retried
    async fn reply(&self, chat_id: ChatId, text: String, markup: Option<ReplyMarkup>) {
        if let Err(e) = self.transport.send_text(chat_id, text, markup).await {
            error!(user_id = %chat_id, error = %e, "Failed to send message");
        }
    }
}

async fn exit(dialogue: &ConversionDialogue) {
    // InMemStorage reports a missing entry, which already means Idle
    if let Err(e) = dialogue.exit().await {
        debug!(user_id = %dialogue.chat_id(), error = %e, "No dialogue to exit");
    }
}
