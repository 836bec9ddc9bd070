//! Word, character and line counting for the `/count` command.

/// Counts for a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
    pub characters_no_spaces: usize,
    pub lines: usize,
}

/// Count words, characters and lines.
///
/// Characters are Unicode scalar values; lines follow `str::lines`, so a
/// trailing newline does not open an extra line and empty text has none.
pub fn count(text: &str) -> TextStats {
    TextStats {
        words: text.split_whitespace().count(),
        characters: text.chars().count(),
        characters_no_spaces: text.chars().filter(|c| !c.is_whitespace()).count(),
        lines: text.lines().count(),
    }
}

/// Decode an uploaded file for counting; `None` when it is not UTF-8 text
pub fn decode_upload(bytes: &[u8]) -> Option<&str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).ok()
}
