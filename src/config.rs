//! Server configuration

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SUBMISSIONS_URL: &str = "https://data.sec.gov/submissions";
pub const DEFAULT_ARCHIVES_URL: &str = "https://www.sec.gov/Archives/edgar/data";
pub const DEFAULT_FALLBACK_FILE: &str = "amzn-20231231.htm";
pub const DEFAULT_BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36 (compatible; sec-filings-mcp-server; contact@example.com)";

/// Resource and endpoint configuration for the SEC Filings MCP Server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Staging directory for PDF input/output (default: ./pdf)
    pub pdf_dir: PathBuf,
    /// Staging directory for HTML documents and filing downloads (default: ./html)
    pub html_dir: PathBuf,
    pub edgar: EdgarConfig,
    pub fallback: FallbackConfig,
    pub browser: BrowserConfig,
}

/// SEC EDGAR endpoints and HTTP client settings
#[derive(Debug, Clone)]
pub struct EdgarConfig {
    /// Base URL of the per-company submissions index
    pub submissions_base_url: String,
    /// Base URL of the filing document archive
    pub archives_base_url: String,
    /// SEC rejects requests that do not identify the client
    pub user_agent: String,
    /// Per-request timeout (default: 30s)
    pub timeout: Duration,
    /// Maximum size of a downloaded document (default: 100MB)
    pub max_download_bytes: u64,
    pub rate_limit: RateLimitConfig,
    /// Retry an upstream failure once with browser-style headers (default: enabled)
    pub browser_retry: bool,
    /// User-Agent of the browser-style retry
    pub browser_user_agent: String,
}

/// Fixed-window rate limit applied to every outbound EDGAR request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests admitted per window (default: 10)
    pub max_requests: u32,
    /// Window length (default: 1s)
    pub window: Duration,
}

/// Substitution of a pre-staged document when a filing download fails
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    pub enabled: bool,
    /// File name looked up in the HTML staging directory
    pub file_name: String,
}

/// Headless browser used for HTML to PDF rendering
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Chromium-family executable (default: "chromium", resolved via PATH)
    pub executable: String,
    /// Rendering timeout (default: 30s)
    pub timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_base_dir(PathBuf::from("."))
    }
}

impl Default for EdgarConfig {
    fn default() -> Self {
        Self {
            submissions_base_url: DEFAULT_SUBMISSIONS_URL.to_string(),
            archives_base_url: DEFAULT_ARCHIVES_URL.to_string(),
            user_agent: format!(
                "sec-filings-mcp-server/{} (contact@example.com)",
                env!("CARGO_PKG_VERSION")
            ),
            timeout: Duration::from_secs(30),
            max_download_bytes: 100 * 1024 * 1024, // 100MB
            rate_limit: RateLimitConfig::default(),
            browser_retry: true,
            browser_user_agent: DEFAULT_BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // SEC fair access: 10 requests per second
        Self {
            max_requests: 10,
            window: Duration::from_secs(1),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file_name: DEFAULT_FALLBACK_FILE.to_string(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: "chromium".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Default configuration with both staging directories under `base`
    pub fn with_base_dir(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            pdf_dir: base.join("pdf"),
            html_dir: base.join("html"),
            edgar: EdgarConfig::default(),
            fallback: FallbackConfig::default(),
            browser: BrowserConfig::default(),
        }
    }

    /// Build configuration from defaults overlaid with environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match lookup("SEC_MCP_BASE_DIR") {
            Some(base) => Self::with_base_dir(base),
            None => Self::default(),
        };

        if let Some(ua) = lookup("SEC_EDGAR_USER_AGENT") {
            config.edgar.user_agent = ua;
        }
        if let Some(url) = lookup("SEC_EDGAR_SUBMISSIONS_URL") {
            config.edgar.submissions_base_url = url;
        }
        if let Some(url) = lookup("SEC_EDGAR_ARCHIVES_URL") {
            config.edgar.archives_base_url = url;
        }
        if let Some(limit) = parse_var::<u32>(&lookup, "SEC_EDGAR_RATE_LIMIT") {
            config.edgar.rate_limit.max_requests = limit;
        }
        if let Some(flag) = lookup("SEC_EDGAR_BROWSER_RETRY") {
            config.edgar.browser_retry = !is_off(&flag);
        }
        if let Some(ua) = lookup("SEC_EDGAR_BROWSER_USER_AGENT") {
            config.edgar.browser_user_agent = ua;
        }
        if let Some(name) = lookup("SEC_MCP_FALLBACK_FILE") {
            config.fallback.file_name = name;
        }
        if let Some(flag) = lookup("SEC_MCP_FALLBACK") {
            config.fallback.enabled = !is_off(&flag);
        }
        if let Some(browser) = lookup("SEC_MCP_BROWSER") {
            config.browser.executable = browser;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SEC_MCP_BROWSER_TIMEOUT_SECS") {
            config.browser.timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Create both staging directories if they don't exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.pdf_dir)?;
        std::fs::create_dir_all(&self.html_dir)?;
        Ok(())
    }
}

fn is_off(flag: &str) -> bool {
    matches!(
        flag.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment variable");
            None
        }
    }
}
