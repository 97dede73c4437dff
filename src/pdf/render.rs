//! HTML to PDF rendering through a headless Chromium-family browser
//!
//! The browser runs as a subprocess with `--print-to-pdf`, bounded by the
//! configured timeout. The child is killed if the timeout fires.

use crate::config::BrowserConfig;
use crate::error::{Error, Result};
use crate::pdf::reader::is_pdf;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Renders local HTML documents to PDF bytes
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    config: BrowserConfig,
}

impl HtmlRenderer {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    /// Render the document at `input` and return the PDF bytes
    pub async fn render_to_pdf(&self, input: &Path) -> Result<Vec<u8>> {
        let input = tokio::fs::canonicalize(input)
            .await
            .map_err(|_| Error::FileNotFound {
                path: input.display().to_string(),
            })?;
        let url = url::Url::from_file_path(&input).map_err(|_| Error::Render {
            reason: format!("cannot build file URL for {}", input.display()),
        })?;

        let output = scratch_path();
        let result = self.run_browser(url.as_str(), &output).await;
        let data = match result {
            Ok(()) => tokio::fs::read(&output).await.map_err(|e| Error::Render {
                reason: format!("browser produced no PDF: {}", e),
            }),
            Err(e) => Err(e),
        };
        let _ = tokio::fs::remove_file(&output).await;
        let data = data?;

        if !is_pdf(&data) {
            return Err(Error::Render {
                reason: "browser output is not a PDF".to_string(),
            });
        }

        tracing::info!(input = %input.display(), bytes = data.len(), "rendered HTML to PDF");
        Ok(data)
    }

    async fn run_browser(&self, url: &str, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.config.executable);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(browser = %self.config.executable, %url, "launching headless browser");

        let child = cmd.spawn().map_err(|e| Error::Render {
            reason: format!("failed to launch {}: {}", self.config.executable, e),
        })?;

        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::Render {
                reason: format!("timed out after {}s", self.config.timeout.as_secs_f32()),
            })?
            .map_err(|e| Error::Render {
                reason: format!("browser failed: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(3)..].join(" | ");
            tracing::warn!(status = %output.status, stderr = %tail, "headless browser failed");
            return Err(Error::Render {
                reason: format!("browser exited with {}", output.status),
            });
        }

        Ok(())
    }
}

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("sec-filings-mcp-{}.pdf", uuid::Uuid::new_v4()))
}
