//! MCP Server implementation using rmcp

use crate::config::ServerConfig;
use crate::edgar::{EdgarClient, FetchOutcome, FilingFetcher};
use crate::error::{Error, ErrorKind, ToolError};
use crate::pdf::{HtmlRenderer, PdfReader};
use crate::staging::{display_relative, StagedFile, Staging, StagingArea};
use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, service::RequestContext, tool, tool_handler, tool_router, RoleServer,
    ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// SEC Filings MCP Server
#[derive(Clone)]
pub struct SecFilingsServer {
    staging: Arc<Staging>,
    fetcher: FilingFetcher,
    renderer: HtmlRenderer,
    tool_router: ToolRouter<Self>,
    /// Server configuration
    config: Arc<ServerConfig>,
}

// ============================================================================
// Request/Response types for read_as_markdown
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadAsMarkdownParams {
    /// PDF file name in the PDF staging directory. Directory parts are ignored.
    pub input_file_path: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ReadAsMarkdownResult {
    /// File name that was read
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    /// Extracted text, one `## Page N` section per page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

// ============================================================================
// Request/Response types for html_to_pdf
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HtmlToPdfParams {
    /// HTML document relative to the HTML staging directory (e.g. a path returned by download_sec_filing)
    pub input_file_path: String,
    /// Output PDF file name in the PDF staging directory. Directory parts are ignored.
    pub output_file_path: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct HtmlToPdfResult {
    pub input: String,
    /// Saved PDF, relative to the PDF staging directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// PDF size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

// ============================================================================
// Request/Response types for download_sec_filing
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DownloadSecFilingParams {
    /// Company CIK, with or without leading zeros (e.g. "1018724")
    pub cik: String,
    /// Filing year, matched against the start of the filing date
    pub year: i32,
    /// Form type, matched exactly (e.g. "10-K", "10-Q", "8-K")
    pub filing_type: String,
    /// Output folder name under the HTML staging directory (default: "{cik}_{year}_{filing_type}")
    #[serde(default)]
    pub output_dir_path: String,
}

/// How the returned document was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    /// The requested filing was downloaded
    Fresh,
    /// Download failed; the staged fallback document was returned instead
    Substituted,
    /// Nothing was saved; see `error`
    Failed,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DownloadSecFilingResult {
    pub status: DownloadStatus,
    /// Saved document, relative to the HTML staging directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accession_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filing_date: Option<String>,
    /// Why the fallback document was substituted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitution_reason: Option<String>,
    /// Error kind that triggered the substitution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitution_cause: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl DownloadSecFilingResult {
    fn from_outcome(outcome: crate::error::Result<FetchOutcome>) -> Self {
        let empty = Self {
            status: DownloadStatus::Failed,
            path: None,
            url: None,
            accession_number: None,
            filing_date: None,
            substitution_reason: None,
            substitution_cause: None,
            error: None,
        };

        match outcome {
            Ok(FetchOutcome::Fresh { path, url, filing }) => Self {
                status: DownloadStatus::Fresh,
                path: Some(path),
                url: Some(url),
                accession_number: Some(filing.accession_number),
                filing_date: Some(filing.filing_date),
                ..empty
            },
            Ok(FetchOutcome::Substituted {
                path,
                reason,
                cause,
            }) => Self {
                status: DownloadStatus::Substituted,
                path: Some(path),
                substitution_reason: Some(reason),
                substitution_cause: Some(cause),
                ..empty
            },
            Err(e) => {
                tracing::warn!(error = %e, "download_sec_filing failed");
                Self {
                    error: Some(ToolError::from(&e)),
                    ..empty
                }
            }
        }
    }
}

// ============================================================================
// Request/Response types for list_staged_files
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListStagedFilesParams {
    /// Staging directory to list: "pdf" or "html"
    pub area: StagingArea,
    /// Filename pattern to filter (e.g., "*.htm"). Supports glob patterns.
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ListStagedFilesResult {
    pub area: StagingArea,
    pub files: Vec<StagedFile>,
    pub total_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

// ============================================================================
// Tool implementations
// ============================================================================

#[tool_router]
impl SecFilingsServer {
    /// Create a server with default configuration rooted at the current directory
    pub fn new() -> crate::error::Result<Self> {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new server with full configuration; staging directories are created
    pub fn with_config(config: ServerConfig) -> crate::error::Result<Self> {
        config.ensure_dirs()?;

        let staging = Arc::new(Staging::new(&config.pdf_dir, &config.html_dir));
        let client = EdgarClient::new(&config.edgar)?;
        let fetcher = FilingFetcher::new(client, staging.clone(), config.fallback.clone());
        let renderer = HtmlRenderer::new(config.browser.clone());

        Ok(Self {
            staging,
            fetcher,
            renderer,
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        })
    }

    /// Extract text from a staged PDF as Markdown
    #[tool(
        description = "Read a PDF from the PDF staging folder and return its text as Markdown, one '## Page N' section per page.

Only the file name of input_file_path is used; directory parts are ignored."
    )]
    async fn read_as_markdown(&self, Parameters(params): Parameters<ReadAsMarkdownParams>) -> String {
        let result = self
            .process_read_as_markdown(&params)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "read_as_markdown failed");
                ReadAsMarkdownResult {
                    source: params.input_file_path.clone(),
                    page_count: None,
                    markdown: None,
                    error: Some(ToolError::from(&e)),
                }
            });

        to_json(&result)
    }

    /// Render a staged HTML document to PDF
    #[tool(
        description = "Convert an HTML document from the HTML staging folder to PDF using a headless browser. The PDF is saved in the PDF staging folder.

input_file_path may include subfolders, so the path returned by download_sec_filing can be passed directly. Only the file name of output_file_path is used."
    )]
    async fn html_to_pdf(&self, Parameters(params): Parameters<HtmlToPdfParams>) -> String {
        let result = self.process_html_to_pdf(&params).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "html_to_pdf failed");
            HtmlToPdfResult {
                input: params.input_file_path.clone(),
                output: None,
                size: None,
                message: None,
                error: Some(ToolError::from(&e)),
            }
        });

        to_json(&result)
    }

    /// Download an SEC filing's primary document
    #[tool(
        description = "Download the primary document of a company's SEC EDGAR filing. Finds the most recent filing of the given form type whose filing date falls in the given year and saves it under the HTML staging folder.

Returns status 'fresh' for a genuine download. A refused request is retried once with browser-style headers. If that also fails and a fallback document is staged, status is 'substituted' with the reason: the returned document is NOT the requested filing.

Returns for success:
- path (relative to the HTML staging folder, usable with html_to_pdf)
- url, accession_number, filing_date"
    )]
    async fn download_sec_filing(
        &self,
        Parameters(params): Parameters<DownloadSecFilingParams>,
    ) -> String {
        let outcome = self
            .fetcher
            .resolve_and_fetch(
                &params.cik,
                params.year,
                &params.filing_type,
                &params.output_dir_path,
            )
            .await;

        to_json(&DownloadSecFilingResult::from_outcome(outcome))
    }

    /// List files in a staging folder
    #[tool(
        description = "List files in the 'pdf' or 'html' staging folder. Useful for discovering documents before processing them.

Returns for each file:
- Path relative to the staging folder (can be used directly with other tools)
- Filename
- File size in bytes
- Last modified time

Supports glob pattern filtering on the file name."
    )]
    async fn list_staged_files(
        &self,
        Parameters(params): Parameters<ListStagedFilesParams>,
    ) -> String {
        let result = match self.staging.list(params.area, params.pattern.as_deref()) {
            Ok(files) => ListStagedFilesResult {
                area: params.area,
                total_count: files.len() as u32,
                files,
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "list_staged_files failed");
                ListStagedFilesResult {
                    area: params.area,
                    files: vec![],
                    total_count: 0,
                    error: Some(ToolError::from(&e)),
                }
            }
        };

        to_json(&result)
    }
}

impl SecFilingsServer {
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &FilingFetcher {
        &self.fetcher
    }

    /// Extract Markdown from a staged PDF (public for testing)
    pub async fn process_read_as_markdown(
        &self,
        params: &ReadAsMarkdownParams,
    ) -> crate::error::Result<ReadAsMarkdownResult> {
        let (name, path) = self.staging.pdf_path(&params.input_file_path)?;
        let (page_count, markdown) = Self::markdown_for(&path, &name).await?;

        Ok(ReadAsMarkdownResult {
            source: name,
            page_count: Some(page_count),
            markdown: Some(markdown),
            error: None,
        })
    }

    /// Render a staged HTML document into the PDF staging directory (public for testing)
    pub async fn process_html_to_pdf(
        &self,
        params: &HtmlToPdfParams,
    ) -> crate::error::Result<HtmlToPdfResult> {
        let (input_rel, input_path) = self.staging.html_path(&params.input_file_path)?;
        if !input_path.is_file() {
            return Err(Error::FileNotFound {
                path: input_path.display().to_string(),
            });
        }
        let (output_name, output_path) = self.staging.pdf_path(&params.output_file_path)?;

        let data = self.renderer.render_to_pdf(&input_path).await?;
        self.staging.write_atomic(&output_path, &data).await?;

        Ok(HtmlToPdfResult {
            input: display_relative(&input_rel),
            message: Some(format!(
                "Success: PDF converted and saved to {}",
                output_name
            )),
            output: Some(output_name),
            size: Some(data.len() as u64),
            error: None,
        })
    }

    /// PDFium work runs on the blocking thread pool
    async fn markdown_for(path: &Path, name: &str) -> crate::error::Result<(u32, String)> {
        if !path.is_file() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let path = path.to_path_buf();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || {
            let reader = PdfReader::open(&path)?;
            Ok::<_, Error>((reader.page_count(), reader.to_markdown(&name)))
        })
        .await
        .map_err(|e| Error::Pdfium {
            reason: format!("Task join error: {}", e),
        })?
    }

    /// Canonical path of a `file://` URI, if it lies inside the PDF staging directory
    fn resource_path(&self, uri: &str) -> Option<PathBuf> {
        let path = uri.strip_prefix("file://")?;
        let canonical = std::fs::canonicalize(path).ok()?;
        let root = std::fs::canonicalize(self.staging.pdf_dir()).ok()?;
        canonical.starts_with(&root).then_some(canonical)
    }
}

#[tool_handler]
impl ServerHandler for SecFilingsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "SEC Filings MCP Server downloads SEC EDGAR filings into the HTML staging folder, \
                 converts HTML documents to PDF, and reads PDFs as Markdown. \
                 PDF files in the PDF staging folder are also exposed as resources."
                    .into(),
            ),
        }
    }

    /// List staged PDFs as resources
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let root = std::fs::canonicalize(self.staging.pdf_dir())
            .unwrap_or_else(|_| self.staging.pdf_dir().to_path_buf());
        let mut resources = Vec::new();

        if let Ok(files) = self.staging.list(StagingArea::Pdf, None) {
            for file in files {
                let is_pdf = Path::new(&file.name)
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
                if !is_pdf {
                    continue;
                }

                let uri = format!("file://{}", root.join(&file.path).display());
                let mut resource = RawResource::new(uri, file.name.clone());
                resource.mime_type = Some("application/pdf".to_string());
                resource.description = Some(format!(
                    "PDF file ({} bytes){}",
                    file.size,
                    file.modified
                        .as_ref()
                        .map(|m| format!(", modified: {}", m))
                        .unwrap_or_default()
                ));
                resource.size = Some(file.size as u32);

                resources.push(Annotated {
                    raw: resource,
                    annotations: None,
                });
            }
        }

        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: Default::default(),
        })
    }

    /// Read a staged PDF resource as Markdown
    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let uri = &request.uri;

        if !uri.starts_with("file://") {
            return Err(ErrorData::invalid_params(
                "Only file:// URIs are supported",
                None,
            ));
        }

        let Some(path) = self.resource_path(uri) else {
            return Err(ErrorData::invalid_params(
                "Resource not found in the PDF staging folder",
                None,
            ));
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match Self::markdown_for(&path, &name).await {
            Ok((_, text)) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::TextResourceContents {
                    uri: uri.clone(),
                    mime_type: Some("text/markdown".to_string()),
                    text,
                    meta: Default::default(),
                }],
            }),
            Err(e) => {
                tracing::warn!(error = %e, "read_resource failed");
                Err(ErrorData::internal_error(e.client_message(), None))
            }
        }
    }
}

/// Run the MCP server with configuration from the environment
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::from_env()).await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    tracing::info!(
        pdf_dir = %config.pdf_dir.display(),
        html_dir = %config.html_dir.display(),
        fallback = config.fallback.enabled,
        "staging directories"
    );

    let server = SecFilingsServer::with_config(config)?;

    tracing::info!("SEC Filings MCP Server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::FilingMatch;
    use pretty_assertions::assert_eq;

    fn test_server(base: &Path) -> SecFilingsServer {
        SecFilingsServer::with_config(ServerConfig::with_base_dir(base)).unwrap()
    }

    #[test]
    fn test_params_deserialization() {
        let json = r#"{"cik": "1018724", "year": 2023, "filing_type": "10-K"}"#;
        let params: DownloadSecFilingParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.cik, "1018724");
        assert_eq!(params.year, 2023);
        assert_eq!(params.output_dir_path, "");

        let json = r#"{"area": "html", "pattern": "*.htm"}"#;
        let params: ListStagedFilesParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.area, StagingArea::Html);
    }

    #[test]
    fn test_with_config_creates_staging_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let server = test_server(tmp.path());
        assert!(server.config().pdf_dir.is_dir());
        assert!(server.config().html_dir.is_dir());
    }

    #[test]
    fn test_download_status_schema_describes_every_variant() {
        let schema = serde_json::to_string(&rmcp::schemars::schema_for!(DownloadStatus)).unwrap();
        for description in [
            "The requested filing was downloaded",
            "the staged fallback document was returned instead",
            "Nothing was saved",
        ] {
            assert!(schema.contains(description), "missing {description:?}");
        }
    }

    #[test]
    fn test_download_result_fresh() {
        let result = DownloadSecFilingResult::from_outcome(Ok(FetchOutcome::Fresh {
            path: "amzn/amzn-20221231.htm".to_string(),
            url: "https://www.sec.gov/Archives/edgar/data/1018724/000101872423000004/amzn-20221231.htm".to_string(),
            filing: FilingMatch {
                position: 0,
                accession_number: "0001018724-23-000004".to_string(),
                form: "10-K".to_string(),
                filing_date: "2023-02-02".to_string(),
                primary_document: "amzn-20221231.htm".to_string(),
            },
        }));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "fresh");
        assert_eq!(value["path"], "amzn/amzn-20221231.htm");
        assert_eq!(value["filing_date"], "2023-02-02");
        assert!(value.get("error").is_none());
        assert!(value.get("substitution_reason").is_none());
    }

    #[test]
    fn test_download_result_substituted_is_flagged() {
        let result = DownloadSecFilingResult::from_outcome(Ok(FetchOutcome::Substituted {
            path: "amzn/amzn-20231231.htm".to_string(),
            reason: "SEC EDGAR request failed with status 403".to_string(),
            cause: ErrorKind::UpstreamError,
        }));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "substituted");
        assert_eq!(value["substitution_cause"], "upstream_error");
        assert!(value.get("url").is_none());
    }

    #[test]
    fn test_download_result_error() {
        let result = DownloadSecFilingResult::from_outcome(Err(Error::InvalidIdentifier {
            cik: "AMZN".to_string(),
        }));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"]["kind"], "invalid_identifier");
        assert!(value["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_read_as_markdown_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let server = test_server(tmp.path());
        let params = ReadAsMarkdownParams {
            input_file_path: "missing.pdf".to_string(),
        };
        let result = server.process_read_as_markdown(&params).await;
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_read_as_markdown_traversal_stays_in_staging() {
        let tmp = tempfile::tempdir().unwrap();
        let server = test_server(tmp.path());
        // A real file outside the staging directory with the same basename
        std::fs::write(tmp.path().join("passwd"), b"root:x:0:0").unwrap();

        let params = ReadAsMarkdownParams {
            input_file_path: "../passwd".to_string(),
        };
        let err = server.process_read_as_markdown(&params).await.unwrap_err();
        match err {
            Error::FileNotFound { path } => {
                assert_eq!(PathBuf::from(path), server.config().pdf_dir.join("passwd"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_as_markdown_rejects_non_pdf() {
        let tmp = tempfile::tempdir().unwrap();
        let server = test_server(tmp.path());
        std::fs::write(server.config().pdf_dir.join("notes.pdf"), b"plain text").unwrap();

        let params = ReadAsMarkdownParams {
            input_file_path: "notes.pdf".to_string(),
        };
        let result = server.process_read_as_markdown(&params).await;
        assert!(matches!(result, Err(Error::InvalidPdf { .. })));
    }

    #[tokio::test]
    async fn test_html_to_pdf_missing_input() {
        let tmp = tempfile::tempdir().unwrap();
        let server = test_server(tmp.path());
        let params = HtmlToPdfParams {
            input_file_path: "amzn/amzn-20221231.htm".to_string(),
            output_file_path: "amzn.pdf".to_string(),
        };
        let result = server.process_html_to_pdf(&params).await;
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_html_to_pdf_with_fake_browser() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("fake-chromium");
        std::fs::write(
            &script,
            "#!/bin/sh\nfor a in \"$@\"; do case \"$a\" in --print-to-pdf=*) out=\"${a#--print-to-pdf=}\";; esac; done\nprintf '%%PDF-1.7\\n' > \"$out\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = ServerConfig::with_base_dir(tmp.path());
        config.browser.executable = script.to_string_lossy().to_string();
        let server = SecFilingsServer::with_config(config).unwrap();

        let doc_dir = server.config().html_dir.join("amzn");
        std::fs::create_dir_all(&doc_dir).unwrap();
        std::fs::write(doc_dir.join("amzn-20221231.htm"), "<html>10-K</html>").unwrap();

        let params = HtmlToPdfParams {
            input_file_path: "amzn/amzn-20221231.htm".to_string(),
            output_file_path: "../../out/amzn.pdf".to_string(),
        };
        let result = server.process_html_to_pdf(&params).await.unwrap();
        assert_eq!(result.output.as_deref(), Some("amzn.pdf"));
        assert_eq!(result.input, "amzn/amzn-20221231.htm");

        let saved = std::fs::read(server.config().pdf_dir.join("amzn.pdf")).unwrap();
        assert!(saved.starts_with(b"%PDF-1.7"));
        assert_eq!(result.size, Some(saved.len() as u64));
    }

    #[test]
    fn test_resource_path_confined_to_pdf_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let server = test_server(tmp.path());
        let inside = server.config().pdf_dir.join("a.pdf");
        std::fs::write(&inside, b"%PDF-1.4").unwrap();
        let outside = tmp.path().join("b.pdf");
        std::fs::write(&outside, b"%PDF-1.4").unwrap();

        assert!(server
            .resource_path(&format!("file://{}", inside.display()))
            .is_some());
        assert!(server
            .resource_path(&format!("file://{}", outside.display()))
            .is_none());
        assert!(server
            .resource_path(&format!(
                "file://{}/../b.pdf",
                server.config().pdf_dir.display()
            ))
            .is_none());
    }
}
