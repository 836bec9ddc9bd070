//! # Bot Configuration Module
//!
//! This module defines configuration structures for the bot: the startup
//! settings read from the environment and the layout parameters used by the
//! document generators.

use std::env;

use crate::errors::BotError;

// Constants for bot configuration
pub const DEFAULT_FILE_PREFIX: &str = "text";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const MAX_COUNT_FILE_SIZE: u64 = 5 * 1024 * 1024; // 5MB limit for counted uploads

// Millimetres to PDF points
const MM: f32 = 72.0 / 25.4;

/// Log output format selected with `LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Page geometry and typography for PDF output
#[derive(Debug, Clone)]
pub struct PdfLayout {
    /// Maximum characters per rendered line
    pub wrap_width: usize,
    /// Page width in points
    pub page_width: f32,
    /// Page height in points
    pub page_height: f32,
    /// Margin on every side in points
    pub margin: f32,
    /// Font size in points
    pub font_size: f32,
    /// Distance between baselines in points
    pub line_height: f32,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            wrap_width: 90,
            page_width: 595.0,  // A4
            page_height: 842.0, // A4
            margin: 15.0 * MM,
            font_size: 12.0,
            line_height: 8.0 * MM,
        }
    }
}

impl PdfLayout {
    /// Number of lines that fit between the top and bottom margins
    pub fn lines_per_page(&self) -> usize {
        let printable = self.page_height - 2.0 * self.margin;
        ((printable / self.line_height).floor() as usize).max(1)
    }
}

/// Settings shared by every file generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Prefix of generated file names (`{prefix}_{timestamp}.{ext}`)
    pub file_prefix: String,
    /// Name of the single worksheet in spreadsheet output
    pub sheet_name: String,
    pub pdf: PdfLayout,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            sheet_name: "Text".to_string(),
            pdf: PdfLayout::default(),
        }
    }
}

/// Startup configuration for the bot process
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub default_language: String,
    pub max_count_file_size: u64,
    pub log_format: LogFormat,
    pub generator: GeneratorConfig,
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// A missing `BOT_TOKEN` (or `TELOXIDE_TOKEN`) is fatal.
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("BOT_TOKEN")
            .or_else(|| lookup("TELOXIDE_TOKEN"))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| BotError::Config("BOT_TOKEN must be set".to_string()))?;

        let default_language = lookup("DEFAULT_LANGUAGE")
            .map(|lang| lang.trim().to_lowercase())
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let max_count_file_size = match lookup("MAX_COUNT_FILE_SIZE") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                BotError::Config(format!("MAX_COUNT_FILE_SIZE must be a byte count: {e}"))
            })?,
            None => MAX_COUNT_FILE_SIZE,
        };

        let log_format = lookup("LOG_FORMAT")
            .map(|value| LogFormat::parse(&value))
            .unwrap_or_default();

        let mut generator = GeneratorConfig::default();
        if let Some(prefix) = lookup("FILE_PREFIX").filter(|p| !p.trim().is_empty()) {
            generator.file_prefix = prefix.trim().to_string();
        }

        Ok(Self {
            bot_token,
            default_language,
            max_count_file_size,
            log_format,
            generator,
        })
    }
}
