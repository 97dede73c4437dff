//! Filing resolution and download with fallback substitution

use crate::config::FallbackConfig;
use crate::edgar::client::EdgarClient;
use crate::edgar::index::{FilingMatch, FilingQuery};
use crate::error::{Error, ErrorKind, Result};
use crate::staging::{sanitize_basename, Staging};
use std::path::Path;
use std::sync::Arc;

/// How a `resolve_and_fetch` call produced its file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The requested filing was downloaded
    Fresh {
        /// Path relative to the HTML staging directory
        path: String,
        url: String,
        filing: FilingMatch,
    },
    /// Retrieval failed and the staged fallback document was returned instead
    Substituted {
        /// Path relative to the HTML staging directory
        path: String,
        reason: String,
        cause: ErrorKind,
    },
}

impl FetchOutcome {
    pub fn path(&self) -> &str {
        match self {
            FetchOutcome::Fresh { path, .. } | FetchOutcome::Substituted { path, .. } => path,
        }
    }

    pub fn is_substituted(&self) -> bool {
        matches!(self, FetchOutcome::Substituted { .. })
    }
}

/// Resolves filings in a company's index and saves them to the HTML staging directory
#[derive(Clone)]
pub struct FilingFetcher {
    client: EdgarClient,
    staging: Arc<Staging>,
    fallback: FallbackConfig,
}

impl FilingFetcher {
    pub fn new(client: EdgarClient, staging: Arc<Staging>, fallback: FallbackConfig) -> Self {
        Self {
            client,
            staging,
            fallback,
        }
    }

    pub fn client(&self) -> &EdgarClient {
        &self.client
    }

    /// Locate the newest filing matching `(form_type, year)` and download it
    /// into `output_location` under the HTML staging directory.
    ///
    /// An invalid identifier fails immediately. Any later failure is handed to
    /// the fallback policy, which may substitute the staged fallback document.
    pub async fn resolve_and_fetch(
        &self,
        company_id: &str,
        year: i32,
        form_type: &str,
        output_location: &str,
    ) -> Result<FetchOutcome> {
        let query = FilingQuery::new(company_id, year, form_type)?;

        let dir_name = output_dir_name(output_location, company_id.trim(), year, form_type);
        let dir_path = self.staging.html_dir().join(&dir_name);
        tokio::fs::create_dir_all(&dir_path).await?;

        tracing::info!(
            cik = %query.cik.padded(),
            year,
            form_type,
            output = %dir_name,
            "resolving filing"
        );

        match self.fetch_fresh(&query, &dir_name, &dir_path).await {
            Ok(outcome) => Ok(outcome),
            Err(cause) => self.substitute(cause, &dir_name, &dir_path).await,
        }
    }

    async fn fetch_fresh(
        &self,
        query: &FilingQuery,
        dir_name: &str,
        dir_path: &Path,
    ) -> Result<FetchOutcome> {
        let index = self.client.fetch_index(query.cik).await?;

        let filing = index.find(query).ok_or_else(|| Error::NoMatchingFiling {
            form_type: query.form_type.clone(),
            year: query.year,
        })?;
        tracing::debug!(
            position = filing.position,
            accession = %filing.accession_number,
            filing_date = %filing.filing_date,
            "matched filing"
        );

        // Local name is the document's final path component
        let doc_name =
            sanitize_basename(&filing.primary_document).map_err(|_| Error::MalformedIndex {
                reason: format!(
                    "filing {} has no usable primary document",
                    filing.accession_number
                ),
            })?;
        let url = self.client.document_url(query.cik, &filing)?;
        let data = self.client.fetch_document(&url).await?;

        self.staging
            .write_atomic(&dir_path.join(&doc_name), &data)
            .await?;

        Ok(FetchOutcome::Fresh {
            path: format!("{}/{}", dir_name, doc_name),
            url,
            filing,
        })
    }

    async fn substitute(&self, cause: Error, dir_name: &str, dir_path: &Path) -> Result<FetchOutcome> {
        if !self.fallback.enabled {
            tracing::warn!(error = %cause, "filing download failed");
            return Err(cause);
        }

        let Ok(file_name) = sanitize_basename(&self.fallback.file_name) else {
            tracing::warn!(error = %cause, "filing download failed and fallback name is unusable");
            return Err(Error::FallbackUnavailable {
                file_name: self.fallback.file_name.clone(),
                cause: Box::new(cause),
            });
        };

        let staged_root = self.staging.html_dir().join(&file_name);
        let staged_in_dir = dir_path.join(&file_name);

        if staged_root.is_file() {
            self.staging.copy_atomic(&staged_root, &staged_in_dir).await?;
        } else if !staged_in_dir.is_file() {
            tracing::warn!(
                error = %cause,
                fallback = %file_name,
                "filing download failed and no fallback document is staged"
            );
            return Err(Error::FallbackUnavailable {
                file_name,
                cause: Box::new(cause),
            });
        }

        let path = format!("{}/{}", dir_name, file_name);
        tracing::warn!(
            error = %cause,
            substitute = %path,
            "filing download failed, substituting fallback document"
        );

        Ok(FetchOutcome::Substituted {
            path,
            reason: cause
                .client_message()
                .trim_start_matches("Error: ")
                .to_string(),
            cause: cause.kind(),
        })
    }
}

/// Final component of the caller's output location, or `{cik}_{year}_{form}`
fn output_dir_name(output_location: &str, company_id: &str, year: i32, form_type: &str) -> String {
    match sanitize_basename(output_location) {
        Ok(name) => name,
        Err(_) => format!("{}_{}_{}", company_id, year, form_type).replace(['/', '\\'], "_"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("amzn", "amzn")]
    #[case("C:\\Users\\me\\amzn_2023", "amzn_2023")]
    #[case("../../escape", "escape")]
    #[case("", "1018724_2023_10-K")]
    #[case("out/", "1018724_2023_10-K")]
    fn test_output_dir_name(#[case] location: &str, #[case] expected: &str) {
        assert_eq!(output_dir_name(location, "1018724", 2023, "10-K"), expected);
    }

    #[test]
    fn test_output_dir_name_default_has_no_separators() {
        assert_eq!(output_dir_name("", "1", 2023, "10-K/A"), "1_2023_10-K_A");
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = FetchOutcome::Substituted {
            path: "amzn/amzn-20231231.htm".to_string(),
            reason: "SEC EDGAR request failed with status 403".to_string(),
            cause: ErrorKind::UpstreamError,
        };
        assert_eq!(outcome.path(), "amzn/amzn-20231231.htm");
        assert!(outcome.is_substituted());
    }
}
