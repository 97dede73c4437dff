//! Error types for SEC Filings MCP Server

use schemars::JsonSchema;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for SEC Filings MCP Server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SEC Filings MCP Server
#[derive(Error, Debug)]
pub enum Error {
    /// Company identifier is not a CIK
    #[error("Invalid company identifier: {cik:?}")]
    InvalidIdentifier { cik: String },

    /// Local file not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Upstream answered with a non-success status
    #[error("Upstream request to {url} failed with status {status}")]
    UpstreamStatus { url: String, status: u16 },

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Filing index violates the parallel-sequence layout
    #[error("Malformed filing index: {reason}")]
    MalformedIndex { reason: String },

    /// No filing in the index matches the query
    #[error("No {form_type} filing found for {year}")]
    NoMatchingFiling { form_type: String, year: i32 },

    /// Upstream retrieval failed and no staged substitute exists
    #[error("Download failed ({cause}) and fallback file '{file_name}' was not found")]
    FallbackUnavailable {
        file_name: String,
        #[source]
        cause: Box<Error>,
    },

    /// URL could not be built from configuration
    #[error("Invalid URL: {reason}")]
    InvalidUrl { reason: String },

    /// Download too large
    #[error("Download too large: {size} bytes (max: {max_size} bytes)")]
    DownloadTooLarge { size: u64, max_size: u64 },

    /// Path escapes the staging directory or names no file
    #[error("Path access denied: {path}")]
    PathAccessDenied { path: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// PDF is password protected
    #[error("PDF is password protected")]
    PasswordRequired,

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// Headless browser rendering error
    #[error("Rendering failed: {reason}")]
    Render { reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Machine-readable error category reported at the tool boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidIdentifier,
    NotFound,
    UpstreamError,
    NoMatchingFiling,
    FallbackUnavailable,
    AccessDenied,
    ProcessingError,
    IoError,
}

impl Error {
    /// Category of this error, stable across message wording changes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            Error::FileNotFound { .. } => ErrorKind::NotFound,
            Error::UpstreamStatus { .. }
            | Error::HttpRequest(_)
            | Error::MalformedIndex { .. }
            | Error::InvalidUrl { .. }
            | Error::DownloadTooLarge { .. }
            | Error::Serialization(_) => ErrorKind::UpstreamError,
            Error::NoMatchingFiling { .. } => ErrorKind::NoMatchingFiling,
            Error::FallbackUnavailable { .. } => ErrorKind::FallbackUnavailable,
            Error::PathAccessDenied { .. } => ErrorKind::AccessDenied,
            Error::InvalidPdf { .. }
            | Error::PasswordRequired
            | Error::Pdfium { .. }
            | Error::Render { .. } => ErrorKind::ProcessingError,
            Error::Io(_) => ErrorKind::IoError,
        }
    }

    /// Return a sanitized error message safe to send to clients.
    /// Local paths and library internals are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        let detail = match self {
            Error::InvalidIdentifier { cik } => format!("Invalid company identifier: {:?}", cik),
            Error::FileNotFound { .. } => "File not found".to_string(),
            Error::UpstreamStatus { status, .. } => {
                format!("SEC EDGAR request failed with status {}", status)
            }
            Error::HttpRequest(_) => "HTTP request failed".to_string(),
            Error::MalformedIndex { .. } => "SEC EDGAR returned a malformed filing index".to_string(),
            Error::NoMatchingFiling { form_type, year } => {
                format!("No {} filing found for {}", form_type, year)
            }
            Error::FallbackUnavailable { file_name, cause } => format!(
                "Download failed ({}) and fallback file '{}' not found",
                cause.client_message().trim_start_matches("Error: "),
                file_name
            ),
            Error::InvalidUrl { .. } => "Invalid upstream URL".to_string(),
            Error::DownloadTooLarge { max_size, .. } => {
                format!("Download exceeds maximum size of {} bytes", max_size)
            }
            Error::PathAccessDenied { .. } => "Access denied".to_string(),
            Error::InvalidPdf { .. } => "Invalid PDF file".to_string(),
            Error::PasswordRequired => "PDF is password protected".to_string(),
            Error::Pdfium { .. } => "PDF processing error".to_string(),
            Error::Render { reason } => format!("Rendering failed: {}", reason),
            Error::Serialization(_) => "Unexpected response format".to_string(),
            Error::Io(_) => "I/O error".to_string(),
        };
        format!("Error: {}", detail)
    }
}

/// Error payload attached to tool results
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for ToolError {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.client_message(),
        }
    }
}
