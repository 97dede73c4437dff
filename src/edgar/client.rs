//! Rate-limited HTTP client for SEC EDGAR
//!
//! SEC rejects requests without a descriptive User-Agent and asks clients
//! to stay under 10 requests per second. A request refused upstream is
//! retried once with browser-style headers when that profile is enabled.

use crate::config::EdgarConfig;
use crate::edgar::index::{self, Cik, FilingIndex, FilingMatch};
use crate::edgar::rate_limiter::RateLimiter;
use crate::error::{Error, Result};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::fmt;
use std::sync::Arc;

/// Request profile used for one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Configured User-Agent identifying the client
    Declared,
    /// Browser User-Agent and Accept headers
    Browser,
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStrategy::Declared => write!(f, "declared"),
            FetchStrategy::Browser => write!(f, "browser"),
        }
    }
}

/// SEC EDGAR client; every request passes through the shared limiter
#[derive(Clone)]
pub struct EdgarClient {
    http: reqwest::Client,
    browser_http: Option<reqwest::Client>,
    limiter: Arc<RateLimiter>,
    submissions_base_url: String,
    archives_base_url: String,
    max_download_bytes: u64,
}

impl EdgarClient {
    pub fn new(config: &EdgarConfig) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit));
        Self::with_limiter(config, limiter)
    }

    /// Build a client sharing an existing limiter
    pub fn with_limiter(config: &EdgarConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(Error::HttpRequest)?;

        let browser_http = if config.browser_retry {
            let mut headers = HeaderMap::new();
            headers.insert(
                ACCEPT,
                HeaderValue::from_static(
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                ),
            );
            headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

            Some(
                reqwest::Client::builder()
                    .user_agent(config.browser_user_agent.clone())
                    .default_headers(headers)
                    .timeout(config.timeout)
                    .gzip(true)
                    .build()
                    .map_err(Error::HttpRequest)?,
            )
        } else {
            None
        };

        Ok(Self {
            http,
            browser_http,
            limiter,
            submissions_base_url: config.submissions_base_url.clone(),
            archives_base_url: config.archives_base_url.clone(),
            max_download_bytes: config.max_download_bytes,
        })
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Fetch and validate a company's recent filing index
    pub async fn fetch_index(&self, cik: Cik) -> Result<FilingIndex> {
        let url = index::submissions_url(&self.submissions_base_url, cik)?;
        tracing::info!(cik = %cik.padded(), %url, "fetching filing index");

        let body = self.get_bytes(&url).await?;
        FilingIndex::from_submissions_json(&body)
    }

    /// Archive URL of a filing's primary document
    pub fn document_url(&self, cik: Cik, filing: &FilingMatch) -> Result<String> {
        index::document_url(&self.archives_base_url, cik, filing)
    }

    /// Download a document from the archive
    pub async fn fetch_document(&self, url: &str) -> Result<Vec<u8>> {
        tracing::info!(%url, "downloading filing document");
        self.get_bytes(url).await
    }

    /// GET with the declared profile, then once more with the browser
    /// profile if the first attempt failed upstream.
    ///
    /// When both attempts fail the first error is returned.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let cause = match self.get_with(&self.http, FetchStrategy::Declared, url).await {
            Ok(data) => return Ok(data),
            Err(e) => e,
        };

        let retryable = matches!(cause, Error::UpstreamStatus { .. } | Error::HttpRequest(_));
        let Some(browser) = self.browser_http.as_ref().filter(|_| retryable) else {
            return Err(cause);
        };

        tracing::warn!(%url, error = %cause, "retrying with browser profile");
        match self.get_with(browser, FetchStrategy::Browser, url).await {
            Ok(data) => Ok(data),
            Err(e) => {
                tracing::warn!(%url, error = %e, "browser profile retry failed");
                Err(cause)
            }
        }
    }

    /// One rate-limited GET with streamed size checking
    async fn get_with(
        &self,
        http: &reqwest::Client,
        strategy: FetchStrategy,
        url: &str,
    ) -> Result<Vec<u8>> {
        self.limiter.acquire().await;
        tracing::debug!(%url, %strategy, "GET");

        let response = http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::FORBIDDEN {
                tracing::warn!(%url, "SEC EDGAR returned 403 - check User-Agent and request rate");
            }
            return Err(Error::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Check Content-Length header for early rejection
        if let Some(content_length) = response.content_length() {
            if content_length > self.max_download_bytes {
                return Err(Error::DownloadTooLarge {
                    size: content_length,
                    max_size: self.max_download_bytes,
                });
            }
        }

        let mut data = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(Error::HttpRequest)?;
            data.extend_from_slice(&chunk);
            if data.len() as u64 > self.max_download_bytes {
                return Err(Error::DownloadTooLarge {
                    size: data.len() as u64,
                    max_size: self.max_download_bytes,
                });
            }
        }

        tracing::debug!(%url, bytes = data.len(), "download complete");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> EdgarConfig {
        EdgarConfig {
            submissions_base_url: format!("{}/submissions", server.uri()),
            archives_base_url: format!("{}/Archives/edgar/data", server.uri()),
            user_agent: "Test Suite tests@example.com".to_string(),
            browser_user_agent: "Mozilla/5.0 test-browser".to_string(),
            ..EdgarConfig::default()
        }
    }

    #[tokio::test]
    async fn test_user_agent_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Archives/edgar/data/1/0001/doc.htm"))
            .and(header("user-agent", "Test Suite tests@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<html></html>".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let client = EdgarClient::new(&config_for(&server)).unwrap();
        let url = format!("{}/Archives/edgar/data/1/0001/doc.htm", server.uri());
        let body = client.fetch_document(&url).await.unwrap();
        assert_eq!(body, b"<html></html>");
    }

    #[tokio::test]
    async fn test_forbidden_is_upstream_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = EdgarClient::new(&config_for(&server)).unwrap();
        let result = client.fetch_index(Cik::parse("320193").unwrap()).await;
        assert!(matches!(
            result,
            Err(Error::UpstreamStatus { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_download_size_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 2048]))
            .mount(&server)
            .await;

        let config = EdgarConfig {
            max_download_bytes: 1024,
            ..config_for(&server)
        };
        let client = EdgarClient::new(&config).unwrap();
        let result = client.fetch_document(&format!("{}/big", server.uri())).await;
        assert!(matches!(result, Err(Error::DownloadTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_requests_counted_by_limiter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let config = EdgarConfig {
            rate_limit: crate::config::RateLimitConfig {
                max_requests: 10,
                window: std::time::Duration::from_secs(60),
            },
            ..config_for(&server)
        };
        let client = EdgarClient::new(&config).unwrap();
        for _ in 0..3 {
            client.fetch_document(&format!("{}/x", server.uri())).await.unwrap();
        }
        assert_eq!(client.limiter().admitted_in_window(), 3);
    }

    fn counting_limiter() -> crate::config::RateLimitConfig {
        crate::config::RateLimitConfig {
            max_requests: 10,
            window: std::time::Duration::from_secs(60),
        }
    }

    #[tokio::test]
    async fn test_forbidden_retried_with_browser_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "Test Suite tests@example.com"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("user-agent", "Mozilla/5.0 test-browser"))
            .and(header_exists("accept-language"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<html>ok</html>".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let config = EdgarConfig {
            rate_limit: counting_limiter(),
            ..config_for(&server)
        };
        let client = EdgarClient::new(&config).unwrap();
        let body = client
            .fetch_document(&format!("{}/doc.htm", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, b"<html>ok</html>");
        // Both attempts pass through the limiter
        assert_eq!(client.limiter().admitted_in_window(), 2);
    }

    #[tokio::test]
    async fn test_browser_retry_disabled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let config = EdgarConfig {
            browser_retry: false,
            rate_limit: counting_limiter(),
            ..config_for(&server)
        };
        let client = EdgarClient::new(&config).unwrap();
        let result = client.fetch_document(&format!("{}/doc.htm", server.uri())).await;
        assert!(matches!(
            result,
            Err(Error::UpstreamStatus { status: 403, .. })
        ));
        assert_eq!(client.limiter().admitted_in_window(), 1);
    }

    #[tokio::test]
    async fn test_failed_retry_reports_first_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "Test Suite tests@example.com"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("user-agent", "Mozilla/5.0 test-browser"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = EdgarClient::new(&config_for(&server)).unwrap();
        let result = client.fetch_document(&format!("{}/doc.htm", server.uri())).await;
        assert!(matches!(
            result,
            Err(Error::UpstreamStatus { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_size_limit_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 2048]))
            .expect(1)
            .mount(&server)
            .await;

        let config = EdgarConfig {
            max_download_bytes: 1024,
            ..config_for(&server)
        };
        let client = EdgarClient::new(&config).unwrap();
        let result = client.fetch_document(&format!("{}/big", server.uri())).await;
        assert!(matches!(result, Err(Error::DownloadTooLarge { .. })));
    }
}
