//! PDF processing layer
//!
//! Wraps PDFium for document access and hosts the extraction engine that
//! turns an opened document into a per-source result payload.

mod extract;
mod reader;

pub use extract::{extract, ExtractOptions, ExtractedPageText, PdfResultData};
pub use reader::PdfReader;
