//! # PDF Renderer
//!
//! Lays text out as wrapped lines on A4 pages and serializes the result with
//! `lopdf`. Uses the standard Helvetica Type1 font so no font program has to
//! be embedded.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::config::PdfLayout;
use crate::errors::BotError;

/// Wrap a single line at `width` characters.
///
/// Words are separated by runs of whitespace. A word longer than `width` is
/// broken hard. A blank line yields one empty entry so vertical spacing is
/// kept.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut wrapped = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > width {
            if !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(width).peekable();
            while let Some(piece) = pieces.next() {
                if pieces.peek().is_some() {
                    wrapped.push(piece.iter().collect());
                } else {
                    current = piece.iter().collect();
                    current_len = piece.len();
                }
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            wrapped.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() || wrapped.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

/// Split text into rendered lines; never returns an empty list
pub fn layout_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = text.lines().flat_map(|line| wrap_line(line, width)).collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Characters WinAnsiEncoding places in 0x80..=0x9F
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

/// Encode a line for a WinAnsi encoded standard font.
///
/// Characters the encoding lacks cannot be shown by the base-14 fonts and
/// become `?`.
fn encode_win_ansi(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| match c as u32 {
            0x09 => b' ',
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => WIN_ANSI_HIGH
                .iter()
                .find(|(glyph, _)| *glyph == c)
                .map_or(b'?', |(_, code)| *code),
        })
        .collect()
}

fn page_content(lines: &[String], layout: &PdfLayout) -> Content {
    let top = layout.page_height - layout.margin - layout.font_size;
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), Object::Real(layout.font_size)]),
        Operation::new("TL", vec![Object::Real(layout.line_height)]),
        Operation::new("Td", vec![Object::Real(layout.margin), Object::Real(top)]),
    ];

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
        ));
    }

    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// Render `text` into a complete PDF byte stream
pub fn render_pdf(text: &str, layout: &PdfLayout) -> Result<Vec<u8>, BotError> {
    let lines = layout_lines(text, layout.wrap_width);
    let per_page = layout.lines_per_page();

    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for chunk in lines.chunks(per_page) {
        let content = page_content(chunk, layout);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(page_count),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(layout.page_width),
            Object::Real(layout.page_height),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;

    debug!(
        lines = lines.len(),
        pages = page_count,
        bytes = bytes.len(),
        "PDF rendered"
    );
    Ok(bytes)
}
