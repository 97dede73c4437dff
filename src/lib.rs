//! SEC Filings MCP Server Library
//!
//! This crate provides MCP tools for working with SEC EDGAR filings:
//! - `download_sec_filing`: Download a filing's primary document into the HTML staging folder
//! - `html_to_pdf`: Render a staged HTML document to PDF
//! - `read_as_markdown`: Extract the text of a staged PDF as Markdown
//! - `list_staged_files`: List files in a staging folder

pub mod config;
pub mod edgar;
pub mod error;
pub mod pdf;
pub mod server;
pub mod staging;

pub use config::{BrowserConfig, EdgarConfig, FallbackConfig, RateLimitConfig, ServerConfig};
pub use error::{Error, ErrorKind, Result, ToolError};
pub use server::{
    run_server, run_server_with_config, DownloadSecFilingParams, DownloadSecFilingResult,
    DownloadStatus, HtmlToPdfParams, HtmlToPdfResult, ListStagedFilesParams,
    ListStagedFilesResult, ReadAsMarkdownParams, ReadAsMarkdownResult, SecFilingsServer,
};
pub use staging::{StagedFile, Staging, StagingArea};
