//! Transport module: the outbound side of the bot.
//!
//! The conversation flow only talks to [`Transport`]; `TelegramTransport`
//! implements it on top of `teloxide::Bot`.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InlineKeyboardMarkup, InputFile, ParseMode, ReplyMarkup};
use tracing::debug;

use crate::errors::BotError;
use crate::file_generator::GeneratedFile;

/// Outbound operations the conversation flow needs from a messaging platform
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message, optionally with a keyboard attached
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: String,
        markup: Option<ReplyMarkup>,
    ) -> Result<(), BotError>;

    /// Send a prompt with inline choice buttons
    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        prompt: String,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), BotError> {
        self.send_text(chat_id, prompt, Some(ReplyMarkup::InlineKeyboard(keyboard)))
            .await
    }

    /// Deliver a generated file
    async fn send_document(
        &self,
        chat_id: ChatId,
        file: GeneratedFile,
        caption: String,
    ) -> Result<(), BotError>;

    /// Download a file the user uploaded
    async fn fetch_document(&self, file_id: &str) -> Result<Vec<u8>, BotError>;
}

/// [`Transport`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: String,
        markup: Option<ReplyMarkup>,
    ) -> Result<(), BotError> {
        let request = self
            .bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Markdown);
        match markup {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file: GeneratedFile,
        caption: String,
    ) -> Result<(), BotError> {
        debug!(user_id = %chat_id, filename = %file.filename, "Uploading document");
        let document = InputFile::memory(file.bytes).file_name(file.filename);
        self.bot
            .send_document(chat_id, document)
            .caption(caption)
            .parse_mode(ParseMode::Markdown)
            .await?;
        Ok(())
    }

    async fn fetch_document(&self, file_id: &str) -> Result<Vec<u8>, BotError> {
        let file = self.bot.get_file(FileId(file_id.to_string())).await?;
        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot.token(),
            file.path
        );

        let response = reqwest::get(&url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(size = bytes.len(), "Document downloaded");
        Ok(bytes.to_vec())
    }
}
