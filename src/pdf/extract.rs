//! Extraction engine
//!
//! Decides which pages to read from an opened document and assembles the
//! metadata/text/warning payload for one source.

use crate::error::format_error;
use crate::pdf::PdfReader;
use crate::text::{clean_text, truncate_text, DEFAULT_MAX_TEXT_LENGTH};
use serde::Serialize;
use std::collections::HashMap;

/// What to include for one source, derived from the validated request.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Explicit page selection (already deduplicated and sorted), if any
    pub pages: Option<Vec<u32>>,
    /// Extract all pages as one text block when no explicit pages were given
    pub include_full_text: bool,
    /// Include the document metadata map
    pub include_metadata: bool,
    /// Include the total page count
    pub include_page_count: bool,
    /// Display budget per text block, in characters
    pub max_text_length: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            include_full_text: false,
            include_metadata: true,
            include_page_count: true,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

/// Text extracted from a specific page
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedPageText {
    /// Page number (1-based)
    pub page: u32,
    /// Cleaned, length-capped text content
    pub text: String,
}

/// Data extracted from one PDF source.
///
/// `full_text` and `page_texts` are mutually exclusive: explicit page requests
/// populate the per-page list, full-text requests populate the joined block.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PdfResultData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_texts: Option<Vec<ExtractedPageText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// Run the extraction engine over an opened document.
pub fn extract(reader: &PdfReader, options: &ExtractOptions) -> PdfResultData {
    let total_pages = reader.page_count();
    let mut data = PdfResultData::default();

    if options.include_page_count {
        data.num_pages = Some(total_pages);
    }

    if options.include_metadata {
        data.metadata = Some(reader.metadata().clone());
    }

    let mut pages_to_process: Vec<u32> = Vec::new();

    if let Some(requested) = &options.pages {
        let mut invalid_pages: Vec<u32> = Vec::new();
        for &page_num in requested {
            if (1..=total_pages).contains(&page_num) {
                pages_to_process.push(page_num);
            } else {
                invalid_pages.push(page_num);
            }
        }

        if !invalid_pages.is_empty() {
            data.warnings = Some(vec![format!(
                "Requested page numbers {:?} exceed total pages ({})",
                invalid_pages, total_pages
            )]);
        }
    } else if options.include_full_text {
        pages_to_process = (1..=total_pages).collect();
    }

    if !pages_to_process.is_empty() {
        let extracted = extract_page_texts(reader, &pages_to_process, options.max_text_length);

        if options.pages.is_some() {
            data.page_texts = Some(extracted);
        } else {
            let joined = extracted
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            data.full_text = Some(clean_text(&joined));
        }
    }

    data
}

/// Extract, clean and cap text for each selected page. A page whose text
/// cannot be read gets an error-formatted message in place of its text; the
/// remaining pages are still processed.
fn extract_page_texts(
    reader: &PdfReader,
    page_numbers: &[u32],
    max_text_length: usize,
) -> Vec<ExtractedPageText> {
    let mut extracted = Vec::with_capacity(page_numbers.len());

    for &page_num in page_numbers {
        let text = match reader.page_text(page_num) {
            Ok(raw) => truncate_text(&clean_text(&raw), max_text_length),
            Err(e) => {
                tracing::warn!(page = page_num, error = %e, "page text extraction failed");
                format!(
                    "Error: {}",
                    format_error(&e, &format!("extracting page {}", page_num))
                )
            }
        };

        extracted.push(ExtractedPageText {
            page: page_num,
            text,
        });
    }

    extracted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn three_page_reader() -> PdfReader {
        let mut metadata = HashMap::new();
        metadata.insert("Title".to_string(), Some("Test Document".to_string()));
        metadata.insert("Author".to_string(), Some("Jane Doe".to_string()));
        PdfReader::from_parts(
            metadata,
            vec![
                Ok("page  one   text".to_string()),
                Ok("page two text".to_string()),
                Ok("page three text".to_string()),
            ],
        )
    }

    #[test]
    fn test_page_count_and_metadata_included_by_default() {
        let reader = three_page_reader();
        let data = extract(&reader, &ExtractOptions::default());

        assert_eq!(data.num_pages, Some(3));
        let metadata = data.metadata.unwrap();
        assert_eq!(
            metadata.get("Title"),
            Some(&Some("Test Document".to_string()))
        );
        assert!(data.full_text.is_none());
        assert!(data.page_texts.is_none());
        assert!(data.warnings.is_none());
    }

    #[test]
    fn test_flags_can_disable_page_count_and_metadata() {
        let reader = three_page_reader();
        let options = ExtractOptions {
            include_metadata: false,
            include_page_count: false,
            ..ExtractOptions::default()
        };
        let data = extract(&reader, &options);

        assert!(data.num_pages.is_none());
        assert!(data.metadata.is_none());
    }

    #[test]
    fn test_out_of_range_pages_produce_one_warning() {
        let reader = three_page_reader();
        let options = ExtractOptions {
            pages: Some(vec![1, 9999]),
            ..ExtractOptions::default()
        };
        let data = extract(&reader, &options);

        let warnings = data.warnings.unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("9999"));
        assert!(warnings[0].contains("(3)"));

        let pages = data.page_texts.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[0].text, "page one text");
        assert!(data.full_text.is_none());
    }

    #[test]
    fn test_full_text_joins_pages_with_paragraph_breaks() {
        let reader = three_page_reader();
        let options = ExtractOptions {
            include_full_text: true,
            ..ExtractOptions::default()
        };
        let data = extract(&reader, &options);

        assert_eq!(
            data.full_text.unwrap(),
            "page one text\n\npage two text\n\npage three text"
        );
        assert!(data.page_texts.is_none());
    }

    #[test]
    fn test_no_pages_selected_without_full_text_flag() {
        let reader = three_page_reader();
        let data = extract(&reader, &ExtractOptions::default());
        assert!(data.full_text.is_none());
        assert!(data.page_texts.is_none());
    }

    #[test]
    fn test_single_page_failure_does_not_abort_source() {
        let reader = PdfReader::from_parts(
            HashMap::new(),
            vec![
                Ok("good page".to_string()),
                Err("corrupt stream".to_string()),
                Ok("another good page".to_string()),
            ],
        );
        let options = ExtractOptions {
            pages: Some(vec![1, 2, 3]),
            ..ExtractOptions::default()
        };
        let data = extract(&reader, &options);

        let pages = data.page_texts.unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].text, "good page");
        assert!(pages[1].text.starts_with("Error:"));
        assert!(pages[1].text.contains("PDF Processing Error"));
        assert_eq!(pages[2].text, "another good page");
    }

    #[test]
    fn test_result_data_serialization_skips_absent_fields() {
        let data = PdfResultData {
            num_pages: Some(2),
            ..PdfResultData::default()
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value, serde_json::json!({ "num_pages": 2 }));
    }

    #[test]
    fn test_page_text_respects_display_budget() {
        let reader = PdfReader::from_parts(HashMap::new(), vec![Ok("x".repeat(100))]);
        let options = ExtractOptions {
            pages: Some(vec![1]),
            max_text_length: 50,
            ..ExtractOptions::default()
        };
        let data = extract(&reader, &options);

        let pages = data.page_texts.unwrap();
        assert_eq!(pages[0].text.chars().count(), 50);
        assert!(pages[0].text.ends_with("..."));
    }
}
