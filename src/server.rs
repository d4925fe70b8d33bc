//! MCP server implementation using rmcp
//!
//! Exposes a single `read_pdf` tool: request shape validation, the per-source
//! batch loop, and display-text formatting of the results.

use crate::error::format_error;
use crate::pdf::{extract, ExtractOptions, PdfResultData};
use crate::source::{load_path, load_url, PathResolver, DEFAULT_FETCH_TIMEOUT};
use crate::text::DEFAULT_MAX_TEXT_LENGTH;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// Tool parameters (loose shape; constraints are checked by validate())
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SourceParam {
    /// Relative path to a local PDF file (resolved against the server root)
    #[serde(default)]
    pub path: Option<String>,
    /// URL of a PDF file (http/https)
    #[serde(default)]
    pub url: Option<String>,
    /// Specific pages to extract (1-based)
    #[serde(default)]
    pub pages: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadPdfParams {
    /// PDF sources to process (max 10)
    #[serde(default)]
    pub sources: Vec<SourceParam>,
    /// Include full text if no specific pages requested
    #[serde(default)]
    pub include_full_text: bool,
    /// Include PDF metadata
    #[serde(default = "default_true")]
    pub include_metadata: bool,
    /// Include total page count
    #[serde(default = "default_true")]
    pub include_page_count: bool,
}

fn default_true() -> bool {
    true
}

/// One violated constraint, addressed by field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ReadPdfParams {
    /// Check every constraint and produce a typed request, or the full list of
    /// violations. No silent coercion: a request with any invalid field is
    /// rejected before any source is processed.
    pub fn validate(self) -> Result<ReadPdfRequest, Vec<FieldViolation>> {
        let mut violations = Vec::new();
        let mut sources = Vec::with_capacity(self.sources.len());

        if self.sources.is_empty() {
            violations.push(FieldViolation::new(
                "sources",
                "at least one source is required",
            ));
        } else if self.sources.len() > 10 {
            violations.push(FieldViolation::new(
                "sources",
                "too many sources (limit: 10)",
            ));
        }

        for (index, source) in self.sources.iter().enumerate() {
            let field = format!("sources[{}]", index);

            let target = match (&source.path, &source.url) {
                (Some(path), None) => Some(SourceTarget::Path(path.clone())),
                (None, Some(url)) => {
                    match url::Url::parse(url) {
                        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                            Some(SourceTarget::Url(url.clone()))
                        }
                        _ => {
                            violations.push(FieldViolation::new(
                                format!("{}.url", field),
                                "URL must start with http:// or https://",
                            ));
                            None
                        }
                    }
                }
                _ => {
                    violations.push(FieldViolation::new(
                        field.clone(),
                        "Each source must have either 'path' or 'url', but not both",
                    ));
                    None
                }
            };

            let pages = match &source.pages {
                None => None,
                Some(pages) => match validate_pages(pages) {
                    Ok(pages) => Some(pages),
                    Err(message) => {
                        violations.push(FieldViolation::new(format!("{}.pages", field), message));
                        None
                    }
                },
            };

            if let Some(target) = target {
                sources.push(SourceSpec { target, pages });
            }
        }

        if violations.is_empty() {
            Ok(ReadPdfRequest {
                sources,
                include_full_text: self.include_full_text,
                include_metadata: self.include_metadata,
                include_page_count: self.include_page_count,
            })
        } else {
            Err(violations)
        }
    }
}

/// Deduplicate, sort and bound a page list.
fn validate_pages(pages: &[i64]) -> Result<Vec<u32>, String> {
    if pages.is_empty() {
        return Err("Pages list cannot be empty".to_string());
    }

    if pages.iter().any(|&p| p <= 0) {
        return Err("Page numbers must be positive integers".to_string());
    }

    let mut pages: Vec<u32> = pages
        .iter()
        .map(|&p| u32::try_from(p).unwrap_or(u32::MAX))
        .collect();
    pages.sort_unstable();
    pages.dedup();

    if pages.len() > 100 {
        return Err("Too many pages requested (limit: 100)".to_string());
    }

    Ok(pages)
}

// ============================================================================
// Validated request and result types
// ============================================================================

/// Where one document comes from; exactly one of path or URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTarget {
    Path(String),
    Url(String),
}

/// One validated document reference plus its optional page selection.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub target: SourceTarget,
    /// Deduplicated, ascending, 1-based
    pub pages: Option<Vec<u32>>,
}

impl SourceSpec {
    /// The original path or URL string, used as the result identifier.
    pub fn describe(&self) -> &str {
        match &self.target {
            SourceTarget::Path(path) => path,
            SourceTarget::Url(url) => url,
        }
    }
}

/// A fully validated `read_pdf` request.
#[derive(Debug, Clone)]
pub struct ReadPdfRequest {
    pub sources: Vec<SourceSpec>,
    pub include_full_text: bool,
    pub include_metadata: bool,
    pub include_page_count: bool,
}

/// Success/failure record for one source within a batch.
#[derive(Debug, Clone, Serialize)]
pub struct PdfSourceResult {
    /// Source identifier (the original path or URL)
    pub source: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PdfResultData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One result per requested source, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct ReadPdfResponse {
    pub results: Vec<PdfSourceResult>,
}

// ============================================================================
// Server
// ============================================================================

/// Configuration for the pdf-lite-mcp server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Trusted root all relative paths must resolve within
    pub root_dir: PathBuf,
    /// Bound on a single URL fetch (default: 30s)
    pub fetch_timeout: Duration,
    /// Display budget per text block, in characters (default: 10,000)
    pub max_text_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

/// pdf-lite-mcp server
#[derive(Clone)]
pub struct PdfServer {
    resolver: Arc<PathResolver>,
    config: Arc<ServerConfig>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PdfServer {
    /// Create a server confined to `root_dir` with default settings
    pub fn new<P: Into<PathBuf>>(root_dir: P) -> crate::error::Result<Self> {
        Self::with_config(ServerConfig {
            root_dir: root_dir.into(),
            ..ServerConfig::default()
        })
    }

    /// Create a server with full configuration
    pub fn with_config(config: ServerConfig) -> crate::error::Result<Self> {
        let resolver = PathResolver::new(&config.root_dir)?;
        Ok(Self {
            resolver: Arc::new(resolver),
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        })
    }

    /// The canonicalized trusted root.
    pub fn root(&self) -> &std::path::Path {
        self.resolver.root()
    }

    /// Read content from PDF files
    #[tool(
        description = "Read content from PDF files (local paths or URLs). Extract full text, specific pages, metadata, and page count.

Source format: each element must be an object with exactly one of \"path\" (relative to the server root) or \"url\" (http/https), plus an optional \"pages\" array of 1-based page numbers."
    )]
    async fn read_pdf(&self, Parameters(params): Parameters<ReadPdfParams>) -> String {
        let started = Instant::now();
        tracing::info!("Tool call received: read_pdf");

        let request = match params.validate() {
            Ok(request) => request,
            Err(violations) => {
                tracing::warn!(violations = violations.len(), "read_pdf validation failed");
                return format_validation_errors(&violations);
            }
        };

        let response = self.process_request(&request).await;

        let successful = response.results.iter().filter(|r| r.success).count();
        tracing::info!(
            successful,
            total = response.results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "PDF processing completed"
        );

        format_response(&response)
    }
}

impl PdfServer {
    /// Process all sources sequentially, isolating per-source failures.
    ///
    /// Always produces exactly one result per input source, in input order;
    /// a failure while loading or extracting one source is converted into a
    /// failed result record and the loop continues.
    pub async fn process_request(&self, request: &ReadPdfRequest) -> ReadPdfResponse {
        let mut results = Vec::with_capacity(request.sources.len());

        for source in &request.sources {
            let result = self
                .process_source(source, request)
                .await
                .unwrap_or_else(|e| {
                    let source_desc = source.describe().to_string();
                    tracing::warn!(source = %source_desc, error = %e, "read_pdf source failed");
                    PdfSourceResult {
                        source: source_desc.clone(),
                        success: false,
                        data: None,
                        error: Some(format_error(&e, &format!("Processing {}", source_desc))),
                    }
                });
            results.push(result);
        }

        ReadPdfResponse { results }
    }

    async fn process_source(
        &self,
        source: &SourceSpec,
        request: &ReadPdfRequest,
    ) -> crate::error::Result<PdfSourceResult> {
        let started = Instant::now();
        let source_desc = source.describe().to_string();
        tracing::debug!(source = %source_desc, "processing PDF source");

        let reader = match &source.target {
            SourceTarget::Path(path) => load_path(&self.resolver, path).await?,
            SourceTarget::Url(url) => load_url(url, self.config.fetch_timeout).await?,
        };

        let options = ExtractOptions {
            pages: source.pages.clone(),
            include_full_text: request.include_full_text,
            include_metadata: request.include_metadata,
            include_page_count: request.include_page_count,
            max_text_length: self.config.max_text_length,
        };
        let data = extract(&reader, &options);

        tracing::debug!(
            source = %source_desc,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "PDF source processed"
        );

        Ok(PdfSourceResult {
            source: source_desc,
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

// ============================================================================
// Display-text formatting
// ============================================================================

/// Render a batch response as display text.
fn format_response(response: &ReadPdfResponse) -> String {
    if response.results.is_empty() {
        return "⚠️ No results to display".to_string();
    }

    if response.results.len() == 1 {
        return format_single_result(&response.results[0]);
    }

    let mut parts = vec![format!(
        "📄 Processed {} PDF sources:",
        response.results.len()
    )];

    for (i, result) in response.results.iter().enumerate() {
        parts.push(format!("\n--- Source {}: {} ---", i + 1, result.source));
        if result.success {
            parts.push("✅ Success".to_string());
            if let Some(data) = &result.data {
                parts.push(format_result_data(data, true));
            }
        } else {
            parts.push(format!(
                "❌ Failed: {}",
                result.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    parts.join("\n")
}

fn format_single_result(result: &PdfSourceResult) -> String {
    if !result.success {
        return format!(
            "❌ Failed to process {}: {}",
            result.source,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    let Some(data) = &result.data else {
        return format!("⚠️ No data extracted from {}", result.source);
    };

    format!("📄 {}\n{}", result.source, format_result_data(data, false))
}

/// Keys worth surfacing in the metadata summary line.
const METADATA_SUMMARY_KEYS: [&str; 4] = ["Title", "Author", "Subject", "Creator"];

fn format_result_data(data: &PdfResultData, compact: bool) -> String {
    let mut parts = Vec::new();

    if let Some(num_pages) = data.num_pages {
        parts.push(format!("📊 Pages: {}", num_pages));
    }

    if !compact {
        if let Some(metadata) = &data.metadata {
            let mut items = Vec::new();
            for wanted in METADATA_SUMMARY_KEYS {
                let entry = metadata
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(wanted));
                if let Some((key, Some(value))) = entry {
                    if !value.is_empty() {
                        items.push(format!("{}: {}", key, value));
                    }
                }
            }
            if !items.is_empty() {
                parts.push(format!("📝 {}", items.join(" | ")));
            }
        }
    }

    if let Some(warnings) = &data.warnings {
        for warning in warnings {
            parts.push(format!("⚠️ {}", warning));
        }
    }

    if let Some(full_text) = &data.full_text {
        if compact {
            parts.push(format!("📖 Text: {}", preview(full_text, 100)));
        } else {
            parts.push(format!("📖 Full Text:\n{}", full_text));
        }
    } else if let Some(page_texts) = &data.page_texts {
        if compact {
            parts.push(format!("📄 Extracted {} pages", page_texts.len()));
        } else {
            for page_text in page_texts {
                parts.push(format!("📄 Page {}:\n{}", page_text.page, page_text.text));
            }
        }
    }

    if parts.is_empty() {
        "No content extracted".to_string()
    } else {
        parts.join("\n")
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}

fn format_validation_errors(violations: &[FieldViolation]) -> String {
    let mut parts = vec!["🔍 Invalid arguments:".to_string()];
    for violation in violations {
        parts.push(format!("  • {}: {}", violation.field, violation.message));
    }
    parts.join("\n")
}

// ============================================================================
// Server entry points
// ============================================================================

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "pdf-lite-mcp provides a read_pdf tool for extracting text, metadata, and page \
                 counts from PDF files referenced by relative path or URL."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server rooted at the current working directory
pub async fn run_server() -> anyhow::Result<()> {
    let root_dir = std::env::current_dir()?;
    run_server_with_config(ServerConfig {
        root_dir,
        ..ServerConfig::default()
    })
    .await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> anyhow::Result<()> {
    let server = PdfServer::with_config(config)?;

    tracing::info!(root = %server.root().display(), "pdf-lite-mcp ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
