//! pdf-lite-mcp Library
//!
//! This crate provides a single MCP tool, `read_pdf`, for extracting text,
//! metadata, and page counts from PDF files referenced by relative path or
//! URL. Batches of up to 10 sources are processed with per-source failure
//! isolation.

pub mod error;
pub mod pdf;
pub mod server;
pub mod source;
pub mod text;

pub use error::{Error, Result};
pub use server::{
    run_server, run_server_with_config, PdfServer, PdfSourceResult, ReadPdfParams, ReadPdfRequest,
    ReadPdfResponse, ServerConfig, SourceParam,
};
