use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{PubMedError, Result};
use crate::pmc::models::PmcArticle;
use crate::pmc::parser::parse_articles_from_xml;
use crate::rate_limit::RateLimiter;

/// The PMC esearch endpoint refuses pages larger than this.
const PMC_PAGE_CEILING: usize = 10_000;

/// Client for full-text retrieval from PubMed Central
#[derive(Clone)]
pub struct PmcClient {
    client: reqwest::Client,
    config: ClientConfig,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl PmcClient {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::new())
    }

    /// Create a client from an explicit configuration
    ///
    /// The database is forced to `pmc` regardless of what the
    /// configuration carries.
    pub fn with_config(config: ClientConfig) -> Self {
        let config = config.with_db("pmc");
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.effective_user_agent())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let rate_limiter = config.create_rate_limiter();
        let base_url = config.effective_base_url().to_string();
        Self {
            client,
            config,
            rate_limiter,
            base_url,
        }
    }

    /// Collect the PMC IDs matching `query`
    #[instrument(skip(self))]
    pub async fn search_article_ids(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<String>> {
        if max_results == Some(0) {
            return Ok(Vec::new());
        }

        let page_size = self.config.page_size().clamp(1, PMC_PAGE_CEILING);
        let mut ids: Vec<String> = Vec::new();
        let mut retrieved: usize = 0;
        let mut total: Option<usize> = None;

        loop {
            if let Some(total) = total {
                if retrieved >= total {
                    break;
                }
            }
            if let Some(max) = max_results {
                if retrieved >= max {
                    break;
                }
            }

            let mut retmax = page_size;
            if let Some(max) = max_results {
                retmax = retmax.min(max - retrieved);
            }

            let params = [
                ("term".to_string(), query.to_string()),
                ("retmode".to_string(), "json".to_string()),
                ("retmax".to_string(), retmax.to_string()),
                ("retstart".to_string(), retrieved.to_string()),
            ];
            let response = self.send("/esearch.fcgi", &params).await?;
            let result: crate::pubmed::responses::ESearchResult = response.json().await?;
            let data = result.esearchresult;

            ids.extend(data.idlist);
            let reported = data
                .retmax
                .as_deref()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if reported == 0 {
                warn!(retstart = retrieved, "esearch returned an empty page, stopping");
                break;
            }
            retrieved += reported;

            if total.is_none() {
                total = Some(
                    data.count
                        .as_deref()
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0),
                );
            }
        }

        if let Some(max) = max_results {
            ids.truncate(max);
        }
        info!(ids = ids.len(), "full-text search complete");
        Ok(ids)
    }

    /// Fetch full-text records for the given PMC IDs in batches
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn fetch_articles(&self, ids: &[String]) -> Result<Vec<PmcArticle>> {
        let mut articles = Vec::new();
        for batch in ids.chunks(self.config.batch_size().max(1)) {
            let params = [
                ("id".to_string(), batch.join(",")),
                ("retmode".to_string(), "xml".to_string()),
            ];
            let response = self.send("/efetch.fcgi", &params).await?;
            let xml = response.text().await?;
            if xml.trim().is_empty() {
                continue;
            }
            articles.extend(parse_articles_from_xml(&xml)?);
        }
        Ok(articles)
    }

    /// Search then fetch in one call
    pub async fn query(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<PmcArticle>> {
        let ids = self.search_article_ids(query, max_results).await?;
        self.fetch_articles(&ids).await
    }

    async fn send(&self, path: &str, extra: &[(String, String)]) -> Result<reqwest::Response> {
        self.rate_limiter.acquire().await;

        let mut params = self.config.base_params();
        params.extend(extra.iter().cloned());
        let query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect();
        let url = format!("{}{}?{}", self.base_url, path, query.join("&"));

        debug!(%path, "requesting E-utilities endpoint");
        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(PubMedError::ApiError { status, body });
        }
        Ok(response)
    }
}

impl Default for PmcClient {
    fn default() -> Self {
        Self::new()
    }
}
