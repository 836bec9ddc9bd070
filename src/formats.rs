//! # Format Registry
//!
//! Maps user supplied file-type tokens (`"TXT"`, `".yml"`, `"xls"`) onto the
//! canonical output kinds the generators understand.

use std::fmt;

use crate::errors::BotError;

/// Canonical output kind of a generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Txt,
    Py,
    Css,
    Js,
    Html,
    Json,
    Csv,
    Xml,
    Yaml,
    Md,
    Pdf,
    Xlsx,
}

/// Alias table; every canonical token also maps to itself
const ALIASES: &[(&str, FileKind)] = &[
    ("txt", FileKind::Txt),
    ("py", FileKind::Py),
    ("css", FileKind::Css),
    ("js", FileKind::Js),
    ("html", FileKind::Html),
    ("json", FileKind::Json),
    ("csv", FileKind::Csv),
    ("xml", FileKind::Xml),
    ("yaml", FileKind::Yaml),
    ("yml", FileKind::Yaml),
    ("md", FileKind::Md),
    ("pdf", FileKind::Pdf),
    ("xls", FileKind::Xlsx),
    ("xlsx", FileKind::Xlsx),
];

impl FileKind {
    /// Display order of the type-choice keyboard
    pub const KEYBOARD_ORDER: [FileKind; 12] = [
        FileKind::Txt,
        FileKind::Py,
        FileKind::Css,
        FileKind::Js,
        FileKind::Html,
        FileKind::Json,
        FileKind::Csv,
        FileKind::Xml,
        FileKind::Yaml,
        FileKind::Md,
        FileKind::Pdf,
        FileKind::Xlsx,
    ];

    /// Canonical token, also used as the file extension
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Txt => "txt",
            FileKind::Py => "py",
            FileKind::Css => "css",
            FileKind::Js => "js",
            FileKind::Html => "html",
            FileKind::Json => "json",
            FileKind::Csv => "csv",
            FileKind::Xml => "xml",
            FileKind::Yaml => "yaml",
            FileKind::Md => "md",
            FileKind::Pdf => "pdf",
            FileKind::Xlsx => "xlsx",
        }
    }

    /// Passthrough kinds are the UTF-8 bytes of the input with a different extension
    pub fn is_passthrough(self) -> bool {
        !matches!(self, FileKind::Pdf | FileKind::Xlsx)
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            FileKind::Txt => "text/plain",
            FileKind::Py => "text/x-python",
            FileKind::Css => "text/css",
            FileKind::Js => "text/javascript",
            FileKind::Html => "text/html",
            FileKind::Json => "application/json",
            FileKind::Csv => "text/csv",
            FileKind::Xml => "application/xml",
            FileKind::Yaml => "application/yaml",
            FileKind::Md => "text/markdown",
            FileKind::Pdf => "application/pdf",
            FileKind::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a user token and look it up in the alias table.
///
/// Whitespace is trimmed, case folded and leading dots stripped before the
/// exact-match lookup.
pub fn normalize(token: &str) -> Result<FileKind, BotError> {
    let cleaned = token.trim().to_lowercase();
    let cleaned = cleaned.trim_start_matches('.');

    ALIASES
        .iter()
        .find(|(alias, _)| *alias == cleaned)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| BotError::UnsupportedType(token.trim().to_string()))
}

/// Comma separated list of the tokens users may type, for help texts
pub fn supported_list() -> String {
    ALIASES
        .iter()
        .map(|(alias, _)| *alias)
        .collect::<Vec<_>>()
        .join(", ")
}
