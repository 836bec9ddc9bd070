//! # Bot Error Types Module
//!
//! This module defines the error types shared by the format registry, the file
//! generators, the transport adapter and the conversation flow.

/// Custom error types for text-to-file conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    /// The requested file type is not in the format registry
    UnsupportedType(String),
    /// A file generator failed to produce a document
    Generation(String),
    /// Delivering a message or document to the user failed
    Transport(String),
    /// Startup configuration is missing or invalid
    Config(String),
    /// Dialogue storage could not be read or updated
    Storage(String),
}

impl std::fmt::Display for BotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotError::UnsupportedType(token) => write!(f, "Unsupported file type: {token}"),
            BotError::Generation(msg) => write!(f, "Generation error: {msg}"),
            BotError::Transport(msg) => write!(f, "Transport error: {msg}"),
            BotError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BotError::Storage(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for BotError {}

impl From<lopdf::Error> for BotError {
    fn from(err: lopdf::Error) -> Self {
        BotError::Generation(format!("pdf: {err}"))
    }
}

impl From<zip::result::ZipError> for BotError {
    fn from(err: zip::result::ZipError) -> Self {
        BotError::Generation(format!("xlsx: {err}"))
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::Generation(format!("io: {err}"))
    }
}

impl From<teloxide::RequestError> for BotError {
    fn from(err: teloxide::RequestError) -> Self {
        BotError::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        // File URLs embed the bot token
        BotError::Transport(err.without_url().to_string())
    }
}
