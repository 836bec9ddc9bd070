//! # Text ➜ Any File Telegram Bot
//!
//! A Telegram bot that turns text into downloadable files (plain text, code,
//! markup, PDF, spreadsheet) and counts words, characters and lines.

pub mod bot;
pub mod config;
pub mod dialogue;
pub mod errors;
pub mod file_generator;
pub mod formats;
pub mod localization;
pub mod pdf_renderer;
pub mod text_stats;
pub mod xlsx_renderer;
