//! Output stage: turns a rendered [`HtmlDocument`] into files on disk.
//!
//! Every writer stages its output next to the destination and renames it into
//! place only once the content is complete, so a failed export never leaves a
//! partial file behind.

mod error;
mod pdf;

use std::path::Path;

use resgenie_render::HtmlDocument;
use tracing::info;

pub use error::ExportError;
pub use pdf::PdfExporter;

/// Something that can write a rendered resume to `output`.
pub trait Exporter {
    fn export(&self, document: &HtmlDocument, output: &Path) -> Result<(), ExportError>;
}

/// Writes the HTML document as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExporter;

impl Exporter for HtmlExporter {
    fn export(&self, document: &HtmlDocument, output: &Path) -> Result<(), ExportError> {
        check_markup(document)?;
        resgenie_utils::atomic_write(output, document.as_bytes())
            .map_err(|source| ExportError::io(format!("failed to write {}", output.display()), source))?;
        info!(path = %output.display(), bytes = document.as_str().len(), "wrote html");
        Ok(())
    }
}

/// Write bound Markdown to `output`.
pub fn write_markdown(markdown: &str, output: &Path) -> Result<(), ExportError> {
    resgenie_utils::atomic_write(output, markdown.as_bytes())
        .map_err(|source| ExportError::io(format!("failed to write {}", output.display()), source))?;
    info!(path = %output.display(), bytes = markdown.len(), "wrote markdown");
    Ok(())
}

/// Basic sanity check before handing markup to a writer.
pub(crate) fn check_markup(document: &HtmlDocument) -> Result<(), ExportError> {
    let html = document.as_str().trim_start();
    if html.is_empty() {
        return Err(ExportError::InvalidMarkup {
            reason: "document is empty",
        });
    }
    if !html.starts_with("<!DOCTYPE html>") {
        return Err(ExportError::InvalidMarkup {
            reason: "document does not start with a doctype",
        });
    }
    if !html.trim_end().ends_with("</html>") {
        return Err(ExportError::InvalidMarkup {
            reason: "document is not terminated by </html>",
        });
    }
    Ok(())
}
