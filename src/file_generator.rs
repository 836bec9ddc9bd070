//! # File Generator Module
//!
//! Turns a piece of text into a named document of the requested kind.
//! Passthrough kinds are written as-is, PDF and spreadsheet output is
//! delegated to the renderers.

use chrono::{DateTime, Local, TimeZone};
use tracing::info;

use crate::config::GeneratorConfig;
use crate::errors::BotError;
use crate::formats::FileKind;
use crate::pdf_renderer::render_pdf;
use crate::xlsx_renderer::render_xlsx;

/// A document ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_kind: &'static str,
}

/// Request built when a conversation reaches its terminal state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    pub text: String,
    pub kind: FileKind,
}

/// Something that can turn a [`FileRequest`] into a [`GeneratedFile`]
pub trait FileGenerator: Send + Sync {
    fn generate(&self, request: &FileRequest) -> Result<GeneratedFile, BotError>;
}

/// Build `{prefix}_{YYYYMMDD_HHMMSS}.{ext}`
pub fn timestamp_name<Tz: TimeZone>(prefix: &str, ext: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.{}", prefix, at.format("%Y%m%d_%H%M%S"), ext)
}

/// Production generator backed by the PDF and xlsx renderers
#[derive(Debug, Clone, Default)]
pub struct DocumentGenerator {
    config: GeneratorConfig,
}

impl DocumentGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generate with an explicit timestamp for the file name
    pub fn generate_at<Tz: TimeZone>(
        &self,
        request: &FileRequest,
        at: &DateTime<Tz>,
    ) -> Result<GeneratedFile, BotError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let kind = request.kind;
        let bytes = match kind {
            FileKind::Pdf => render_pdf(&request.text, &self.config.pdf)?,
            FileKind::Xlsx => render_xlsx(&request.text, &self.config.sheet_name)?,
            _ => request.text.as_bytes().to_vec(),
        };

        let file = GeneratedFile {
            bytes,
            filename: timestamp_name(&self.config.file_prefix, kind.as_str(), at),
            mime_kind: kind.mime_type(),
        };

        info!(
            kind = %kind,
            filename = %file.filename,
            size = file.bytes.len(),
            "File generated"
        );
        Ok(file)
    }
}

impl FileGenerator for DocumentGenerator {
    fn generate(&self, request: &FileRequest) -> Result<GeneratedFile, BotError> {
        self.generate_at(request, &Local::now())
    }
}
