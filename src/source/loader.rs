//! Document loading from local paths and URLs

use crate::error::{Error, Result};
use crate::pdf::PdfReader;
use crate::source::PathResolver;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Default bound on a single URL fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Open a document from a user-supplied relative path, confined to the
/// resolver's root.
pub async fn load_path(resolver: &PathResolver, path: &str) -> Result<PdfReader> {
    let resolved = resolver.resolve(path)?;

    if !resolved.exists() {
        return Err(Error::NotFound {
            path: path.to_string(),
        });
    }

    // Parsing is CPU-bound; keep it off the async reactor
    tokio::task::spawn_blocking(move || PdfReader::open(&resolved))
        .await
        .map_err(|e| Error::Document {
            reason: format!("Task join error: {}", e),
        })?
}

/// Download a document from a URL and open it.
///
/// The fetched bytes are persisted to a process-local temporary file which is
/// removed once the open attempt finishes, on both success and failure paths.
/// Removal failures are swallowed by the temp file's drop.
pub async fn load_url(url: &str, timeout: Duration) -> Result<PdfReader> {
    let temp = fetch_to_temp(url, timeout).await?;

    tokio::task::spawn_blocking(move || {
        let reader = PdfReader::open(temp.path());
        drop(temp);
        reader
    })
    .await
    .map_err(|e| Error::Document {
        reason: format!("Task join error: {}", e),
    })?
}

/// Fetch a URL into a named temporary file.
async fn fetch_to_temp(url: &str, timeout: Duration) -> Result<NamedTempFile> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(Error::HttpRequest)?;

    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(Error::Network {
            reason: format!("HTTP request failed with status: {}", response.status()),
        });
    }

    // Non-fatal: a wrong content type may still be a readable PDF
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();
    if !content_type.contains("pdf") && !url.to_lowercase().ends_with(".pdf") {
        tracing::warn!(url, content_type, "Content type may not be PDF");
    }

    let data = response.bytes().await.map_err(Error::HttpRequest)?;

    let mut temp = NamedTempFile::new()?;
    temp.write_all(&data)?;
    temp.flush()?;

    Ok(temp)
}
