//! pdfium-backed engine: page counts, text, rasterisation and page export.
//!
//! ## Why bind per session?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which keeps
//! thread-local state and is not safe to share between worker threads.
//! [`PdfiumEngine`] therefore only remembers *where* the library lives; every
//! [`EngineSession`] binds its own `Pdfium` on the blocking thread that uses
//! it and releases it on drop.

use super::{EngineSession, OpenDocument, PdfEngine};
use crate::error::EngineError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit pdfium library file or directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Engine that binds to a pdfium shared library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumEngine {
    library_path: Option<PathBuf>,
}

impl PdfiumEngine {
    /// Search `./` and then the system library path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit library file, or a directory containing the platform library.
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    /// Honour `PDFIUM_LIB_PATH` when set, otherwise behave like [`PdfiumEngine::new`].
    pub fn from_env() -> Self {
        match std::env::var(PDFIUM_LIB_PATH_ENV) {
            Ok(p) if !p.is_empty() => Self::with_library_path(p),
            _ => Self::new(),
        }
    }

    fn bind(&self) -> Result<Pdfium, EngineError> {
        let bindings = match &self.library_path {
            Some(path) if path.is_dir() => Pdfium::bind_to_library(
                Pdfium::pdfium_platform_library_name_at_path(&path.to_string_lossy().to_string()),
            ),
            Some(path) => Pdfium::bind_to_library(path.to_string_lossy().to_string()),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| EngineError::Binding(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PdfEngine for PdfiumEngine {
    fn session(&self) -> Result<Box<dyn EngineSession>, EngineError> {
        Ok(Box::new(PdfiumSession {
            pdfium: self.bind()?,
        }))
    }
}

struct PdfiumSession {
    pdfium: Pdfium,
}

impl EngineSession for PdfiumSession {
    fn open(&self, path: &Path) -> Result<Box<dyn OpenDocument + '_>, EngineError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| EngineError::Open(format!("{:?}", e)))?;

        debug!(
            "Opened {} ({} pages)",
            path.display(),
            document.pages().len()
        );

        Ok(Box::new(PdfiumDocument {
            pdfium: &self.pdfium,
            document,
        }))
    }
}

struct PdfiumDocument<'a> {
    pdfium: &'a Pdfium,
    document: PdfDocument<'a>,
}

impl PdfiumDocument<'_> {
    fn page(&self, index: usize) -> Result<PdfPage<'_>, EngineError> {
        let page_index = u16::try_from(index).map_err(|_| EngineError::Page {
            page: index + 1,
            detail: "page index exceeds pdfium's 65535-page limit".into(),
        })?;
        self.document
            .pages()
            .get(page_index)
            .map_err(|e| EngineError::Page {
                page: index + 1,
                detail: format!("{:?}", e),
            })
    }
}

impl OpenDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String, EngineError> {
        let page = self.page(index)?;
        let text = page.text().map_err(|e| EngineError::Page {
            page: index + 1,
            detail: format!("text extraction: {:?}", e),
        })?;
        Ok(text.all())
    }

    fn render_page(&self, index: usize, dpi: u32) -> Result<DynamicImage, EngineError> {
        let page = self.page(index)?;

        // Page geometry is in points (1/72 inch).
        let scale = dpi as f32 / 72.0;
        let width = (page.width().value * scale).round().max(1.0) as i32;
        let height = (page.height().value * scale).round().max(1.0) as i32;

        let render_config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| EngineError::Render {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    fn export_pages(&self, pages: Range<usize>) -> Result<Vec<u8>, EngineError> {
        if pages.is_empty() || pages.end > self.page_count() {
            return Err(EngineError::Write(format!(
                "page range {}..{} is outside the document ({} pages)",
                pages.start,
                pages.end,
                self.page_count()
            )));
        }

        let (first, last) = page_range_u16(&pages)?;

        let mut part = self
            .pdfium
            .create_new_pdf()
            .map_err(|e| EngineError::Write(format!("{:?}", e)))?;

        part.pages_mut()
            .copy_page_range_from_document(
                &self.document,
                first..=last,
                0,
            )
            .map_err(|e| EngineError::Write(format!("{:?}", e)))?;

        part.save_to_bytes()
            .map_err(|e| EngineError::Write(format!("{:?}", e)))
    }
}

/// Inclusive pdfium page indices for a non-empty `pages` range.
fn page_range_u16(pages: &Range<usize>) -> Result<(u16, u16), EngineError> {
    let out_of_range = || {
        EngineError::Write(format!(
            "page range {}..{} exceeds pdfium's 65535-page limit",
            pages.start, pages.end
        ))
    };
    let first = u16::try_from(pages.start).map_err(|_| out_of_range())?;
    let last = u16::try_from(pages.end.saturating_sub(1)).map_err(|_| out_of_range())?;
    Ok((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_range_maps_to_inclusive_indices() {
        assert_eq!(page_range_u16(&(0..3)).unwrap(), (0, 2));
        assert_eq!(page_range_u16(&(65_000..65_536)).unwrap(), (65_000, 65_535));
    }

    #[test]
    fn page_range_past_u16_is_an_error_not_a_wrap() {
        let err = page_range_u16(&(65_530..65_540)).unwrap_err();
        assert!(matches!(err, EngineError::Write(_)));
        assert!(err.to_string().contains("65535"), "{err}");
        assert!(page_range_u16(&(70_000..70_010)).is_err());
    }
}
