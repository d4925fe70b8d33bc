//! PDF reader wrapper for PDFium

use crate::error::{Error, Result};
use pdfium_render::prelude::*;
use std::collections::HashMap;
use std::path::Path;

/// Get PDFium instance (creates new instance each time - PDFium is not thread-safe)
fn create_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Document {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

/// An opened PDF document.
///
/// Page count, metadata and per-page text are extracted up front so the
/// PDFium document handle does not need to outlive the open call. Page text
/// is stored per page as a result so a single unreadable page degrades to an
/// inline error instead of failing the whole document.
pub struct PdfReader {
    page_count: u32,
    metadata: HashMap<String, Option<String>>,
    page_texts: Vec<std::result::Result<String, String>>,
}

impl PdfReader {
    /// Open a PDF from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::NotFound {
                path: path.display().to_string(),
            });
        }

        let data = std::fs::read(path)?;
        Self::open_bytes(&data)
    }

    /// Open a PDF from bytes
    pub fn open_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(Error::Document {
                reason: "Not a valid PDF file".to_string(),
            });
        }

        let pdfium = create_pdfium()?;

        let document = pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|e| Error::Document {
                reason: format!("{}", e),
            })?;

        let page_count = document.pages().len() as u32;
        let metadata = Self::extract_metadata(&document);
        let page_texts = Self::extract_all_page_texts(&document);

        Ok(Self {
            page_count,
            metadata,
            page_texts,
        })
    }

    fn extract_metadata(document: &PdfDocument) -> HashMap<String, Option<String>> {
        let tags = [
            (PdfDocumentMetadataTagType::Title, "Title"),
            (PdfDocumentMetadataTagType::Author, "Author"),
            (PdfDocumentMetadataTagType::Subject, "Subject"),
            (PdfDocumentMetadataTagType::Keywords, "Keywords"),
            (PdfDocumentMetadataTagType::Creator, "Creator"),
            (PdfDocumentMetadataTagType::Producer, "Producer"),
            (PdfDocumentMetadataTagType::CreationDate, "CreationDate"),
            (
                PdfDocumentMetadataTagType::ModificationDate,
                "ModificationDate",
            ),
        ];

        let meta = document.metadata();
        let mut map = HashMap::new();

        for (tag_type, key) in tags {
            if let Some(tag) = meta.get(tag_type) {
                let value = tag.value().to_string();
                map.insert(
                    key.to_string(),
                    if value.is_empty() { None } else { Some(value) },
                );
            }
        }

        map
    }

    fn extract_all_page_texts(
        document: &PdfDocument,
    ) -> Vec<std::result::Result<String, String>> {
        let pages = document.pages();
        let mut texts = Vec::with_capacity(pages.len() as usize);

        for index in 0..pages.len() {
            let text = pages
                .get(index)
                .map_err(|e| format!("Failed to get page {}: {}", index + 1, e))
                .and_then(|page| {
                    page.text()
                        .map(|t| t.all())
                        .map_err(|e| format!("Failed to read text of page {}: {}", index + 1, e))
                });
            texts.push(text);
        }

        texts
    }

    /// Get the number of pages
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the document metadata map (absent tags are omitted, empty values
    /// map to `None`)
    pub fn metadata(&self) -> &HashMap<String, Option<String>> {
        &self.metadata
    }

    /// Raw text of a page (1-indexed)
    pub fn page_text(&self, page_num: u32) -> Result<String> {
        if page_num < 1 || page_num > self.page_count {
            return Err(Error::Document {
                reason: format!(
                    "Page {} out of bounds (total: {})",
                    page_num, self.page_count
                ),
            });
        }

        match &self.page_texts[(page_num - 1) as usize] {
            Ok(text) => Ok(text.clone()),
            Err(reason) => Err(Error::Document {
                reason: reason.clone(),
            }),
        }
    }

    /// Build a reader from already-extracted parts, for engine tests that
    /// should not depend on a PDFium library being installed.
    #[cfg(test)]
    pub(crate) fn from_parts(
        metadata: HashMap<String, Option<String>>,
        page_texts: Vec<std::result::Result<String, String>>,
    ) -> Self {
        Self {
            page_count: page_texts.len() as u32,
            metadata,
            page_texts,
        }
    }
}
