use futures_util::stream::{self, Stream, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{PubMedError, Result};
use crate::pubmed::models::PubMedRecord;
use crate::pubmed::parser::parse_records_from_xml;
use crate::pubmed::responses::{ESearchData, ESearchResult};
use crate::rate_limit::RateLimiter;

/// Client for the PubMed E-utilities endpoints
///
/// Every request goes through the shared rate limiter, so a clone of the
/// client (or several tasks borrowing one) stays inside the NCBI request
/// ceiling as a group.
#[derive(Clone)]
pub struct PubMedClient {
    client: reqwest::Client,
    config: ClientConfig,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl PubMedClient {
    /// Create a client with default NCBI settings
    pub fn new() -> Self {
        Self::with_config(ClientConfig::new())
    }

    /// Create a client from an explicit configuration
    pub fn with_config(config: ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.effective_user_agent())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(client, config)
    }

    /// Create a client reusing an existing HTTP connection pool
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        let rate_limiter = config.create_rate_limiter();
        let base_url = config.effective_base_url().to_string();
        Self {
            client,
            config,
            rate_limiter,
            base_url,
        }
    }

    /// Collect the PMIDs matching `query`
    ///
    /// Pages through esearch until the reported total is reached or
    /// `max_results` is satisfied; `None` retrieves every match.
    #[instrument(skip(self))]
    pub async fn search_article_ids(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<String>> {
        if max_results == Some(0) {
            return Ok(Vec::new());
        }

        let page_size = self.config.page_size().max(1);
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

            let data = self.esearch(query, retrieved, retmax).await?;
            if let Some(error) = &data.error {
                warn!(error = %error, "esearch reported an error field");
            }

            let page_ids = data.idlist.len();
            ids.extend(data.idlist);

            let reported = data
                .retmax
                .as_deref()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if reported == 0 {
                // A zero-size page would never advance the cursor.
                warn!(retstart = retrieved, "esearch returned an empty page, stopping");
                break;
            }
            retrieved += reported;

            if total.is_none() {
                let count = data
                    .count
                    .as_deref()
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                total = Some(count);
            }

            debug!(
                page_ids,
                retrieved,
                total = total.unwrap_or(0),
                "retrieved esearch page"
            );
        }

        if let Some(max) = max_results {
            ids.truncate(max);
        }
        info!(ids = ids.len(), "search complete");
        Ok(ids)
    }

    /// Total number of records matching `query`, from a single
    /// minimal-page esearch request
    #[instrument(skip(self))]
    pub async fn total_results_count(&self, query: &str) -> Result<usize> {
        let data = self.esearch(query, 0, 1).await?;
        Ok(data
            .count
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0))
    }

    /// Fetch full records for the given PMIDs
    ///
    /// Identifiers are fetched sequentially in comma-joined batches;
    /// records come back in request order.
    #[instrument(skip(self, pmids), fields(pmids = pmids.len()))]
    pub async fn fetch_articles(&self, pmids: &[String]) -> Result<Vec<PubMedRecord>> {
        let mut records = Vec::new();
        for batch in pmids.chunks(self.config.batch_size().max(1)) {
            records.extend(self.fetch_batch(batch).await?);
        }
        Ok(records)
    }

    /// Search then fetch, yielding records as a stream
    ///
    /// The ID search runs up front; efetch batches are only requested as
    /// the stream is polled, so a consumer that stops early never pays
    /// for the remaining batches.
    pub async fn query(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<impl Stream<Item = Result<PubMedRecord>> + '_> {
        let ids = self.search_article_ids(query, max_results).await?;
        let batches: Vec<Vec<String>> = ids
            .chunks(self.config.batch_size().max(1))
            .map(|batch| batch.to_vec())
            .collect();

        Ok(stream::iter(batches)
            .then(move |batch| async move { self.fetch_batch(&batch).await })
            .map_ok(|records| stream::iter(records.into_iter().map(Ok)))
            .try_flatten())
    }

    /// One efetch round trip for up to a batch of PMIDs
    async fn fetch_batch(&self, pmids: &[String]) -> Result<Vec<PubMedRecord>> {
        if pmids.is_empty() {
            return Ok(Vec::new());
        }

        let params = [
            ("id".to_string(), pmids.join(",")),
            ("retmode".to_string(), "xml".to_string()),
        ];
        let response = self.send("/efetch.fcgi", &params).await?;
        let xml = response.text().await?;
        if xml.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_records_from_xml(&xml)
    }

    async fn esearch(&self, query: &str, retstart: usize, retmax: usize) -> Result<ESearchData> {
        let params = [
            ("term".to_string(), query.to_string()),
            ("retmode".to_string(), "json".to_string()),
            ("retmax".to_string(), retmax.to_string()),
            ("retstart".to_string(), retstart.to_string()),
        ];
        let response = self.send("/esearch.fcgi", &params).await?;
        let result: ESearchResult = response.json().await?;
        Ok(result.esearchresult)
    }

    /// Issue one rate-limited GET against an E-utilities path
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

impl Default for PubMedClient {
    fn default() -> Self {
        Self::new()
    }
}
