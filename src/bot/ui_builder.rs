//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::formats::{supported_list, FileKind};
use crate::localization::{t_args_lang, t_lang};
use crate::text_stats::TextStats;

// Reply-keyboard labels double as command aliases
pub const MENU_GENERATE: &str = "▶️ Start text to File Generate (/generate)";
pub const MENU_MORE: &str = "ℹ️ More menu";
pub const MENU_HELP: &str = "❓ Help (/help)";
pub const START_OVER_LABEL: &str = "⬅️ Start over";

// Callback payloads of the type keyboard
pub const CALLBACK_KIND_PREFIX: &str = "ext:";
pub const CALLBACK_START_OVER: &str = "startover";

const TYPE_BUTTONS_PER_ROW: usize = 4;

/// Reply keyboard shown with the welcome message
pub fn create_main_menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(MENU_GENERATE)],
        vec![KeyboardButton::new(MENU_MORE), KeyboardButton::new(MENU_HELP)],
    ])
    .resize_keyboard()
}

/// Inline keyboard with one button per file kind and a start-over row
pub fn create_type_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = FileKind::KEYBOARD_ORDER
        .chunks(TYPE_BUTTONS_PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(|kind| {
                    InlineKeyboardButton::callback(
                        kind.as_str(),
                        format!("{CALLBACK_KIND_PREFIX}{kind}"),
                    )
                })
                .collect()
        })
        .collect();

    rows.push(vec![InlineKeyboardButton::callback(
        START_OVER_LABEL,
        CALLBACK_START_OVER,
    )]);

    InlineKeyboardMarkup::new(rows)
}

/// Whether typed text asks to discard the pending text
pub fn is_start_over_text(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    normalized == START_OVER_LABEL.to_lowercase()
        || matches!(normalized.as_str(), "start over" | "startover" | "restart")
}

pub fn format_welcome(language_code: Option<&str>) -> String {
    t_lang("welcome", language_code)
}

pub fn format_help(language_code: Option<&str>) -> String {
    t_args_lang("help", &[("formats", &supported_list())], language_code)
}

pub fn format_caption(kind: FileKind, language_code: Option<&str>) -> String {
    t_args_lang("document-caption", &[("kind", kind.as_str())], language_code)
}

pub fn format_text_stats(stats: &TextStats, language_code: Option<&str>) -> String {
    t_args_lang(
        "count-result",
        &[
            ("words", &stats.words.to_string()),
            ("characters", &stats.characters.to_string()),
            (
                "characters_no_spaces",
                &stats.characters_no_spaces.to_string(),
            ),
            ("lines", &stats.lines.to_string()),
        ],
        language_code,
    )
}
