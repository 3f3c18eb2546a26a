use std::time::Duration;

use crate::rate_limit::RateLimiter;

/// Default public E-utilities origin
const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Tool identity requested (not required) by NCBI
const DEFAULT_TOOL: &str = "my_tool";

/// Contact email requested (not required) by NCBI
const DEFAULT_EMAIL: &str = "my_email@example.com";

/// Largest number of identifiers fetched in one efetch request
const DEFAULT_BATCH_SIZE: usize = 250;

/// Largest `retmax` requested per esearch page
const DEFAULT_PAGE_SIZE: usize = 50_000;

/// Immutable client configuration
///
/// Built once with the `with_*` methods and shared by value; per-call
/// request parameters are layered on top of [`ClientConfig::base_params`]
/// so no shared state is ever mutated between requests.
///
/// # Example
///
/// ```
/// use entrez_client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_tool("my_analysis_pipeline")
///     .with_email("researcher@university.edu")
///     .with_api_key("your_api_key_here");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    tool: Option<String>,
    email: Option<String>,
    api_key: Option<String>,
    db: String,
    rate_limit: Option<usize>,
    batch_size: usize,
    page_size: usize,
    base_url: Option<String>,
    pub(crate) timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with NCBI defaults (no API key,
    /// 3 requests/second, `pubmed` database)
    pub fn new() -> Self {
        Self {
            tool: None,
            email: None,
            api_key: None,
            db: "pubmed".to_string(),
            rate_limit: None,
            batch_size: DEFAULT_BATCH_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            base_url: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the tool name sent with every request
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Set the contact email sent with every request
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set an NCBI API key (raises the default rate ceiling to 10/second)
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Target a different Entrez database (default `pubmed`)
    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = db.into();
        self
    }

    /// Override the request-per-second ceiling
    pub fn with_rate_limit(mut self, requests_per_second: usize) -> Self {
        self.rate_limit = Some(requests_per_second);
        self
    }

    /// Override the efetch batch size (default 250)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Override the esearch page size (default 50000)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Point the client at a different origin (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the per-request HTTP timeout (default 30s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Effective base URL for E-utilities endpoints
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Effective tool name
    pub fn effective_tool(&self) -> &str {
        self.tool.as_deref().unwrap_or(DEFAULT_TOOL)
    }

    /// Effective contact email
    pub fn effective_email(&self) -> &str {
        self.email.as_deref().unwrap_or(DEFAULT_EMAIL)
    }

    /// Target database name
    pub fn db(&self) -> &str {
        &self.db
    }

    /// Configured efetch batch size
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Configured esearch page size
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Effective rate ceiling: explicit override, else 10/second with an
    /// API key, else the anonymous NCBI limit of 3/second
    pub fn effective_rate_limit(&self) -> usize {
        match (self.rate_limit, &self.api_key) {
            (Some(rate), _) => rate,
            (None, Some(_)) => 10,
            (None, None) => 3,
        }
    }

    /// User agent advertised on every request
    pub fn effective_user_agent(&self) -> String {
        format!("entrez-client/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Build the rate limiter matching this configuration
    pub fn create_rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.effective_rate_limit())
    }

    /// The immutable base parameter list sent with every request
    ///
    /// Call sites clone this and append endpoint-specific parameters;
    /// the base list itself is never mutated.
    pub fn base_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("db".to_string(), self.db.clone()),
            ("tool".to_string(), self.effective_tool().to_string()),
            ("email".to_string(), self.effective_email().to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key".to_string(), key.clone()));
        }
        params
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
