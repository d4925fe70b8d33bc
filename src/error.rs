//! Error types for pdf-lite-mcp

use thiserror::Error;

/// Result type alias for pdf-lite-mcp
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pdf-lite-mcp
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Absolute path or traversal attempt
    #[error("{reason}")]
    SecurityViolation { reason: String },

    /// Local file missing
    #[error("File not found: {path}")]
    NotFound { path: String },

    /// Non-200 status or other fetch failure
    #[error("Network error: {reason}")]
    Network { reason: String },

    /// HTTP transport failure or timeout
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Parser rejected the document content
    #[error("PDF processing error: {reason}")]
    Document { reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Format an error as a categorized, user-facing message.
///
/// Security violations, missing files, permission failures and PDF parsing
/// errors each get a distinct category marker; everything else falls back to a
/// generic category carrying the context string. This function never fails.
pub fn format_error(error: &Error, context: &str) -> String {
    match error {
        Error::SecurityViolation { reason } => format!("🔒 Security Error: {}", reason),
        Error::NotFound { path } => format!("📁 File Not Found: {}", path),
        Error::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            format!("🚫 Permission Error: {}", e)
        }
        Error::Document { reason } => format!("📄 PDF Processing Error: {}", reason),
        other => {
            let prefix = if context.is_empty() {
                String::new()
            } else {
                format!("{}: ", context)
            };
            format!("❌ Error: {}{}", prefix, other)
        }
    }
}
