use std::collections::HashSet;
use std::pin::pin;

use futures_util::StreamExt;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use entrez_client::{ClientConfig, PubMedClient};

fn test_client(mock: &MockServer) -> PubMedClient {
    let config = ClientConfig::new()
        .with_base_url(mock.uri())
        .with_rate_limit(1000);
    PubMedClient::with_config(config)
}

async fn mount_esearch(mock_server: &MockServer, total: usize) {
    let ids: Vec<String> = (1..=total).map(|i| i.to_string()).collect();
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esearchresult": {
                "count": total.to_string(),
                "retmax": total.to_string(),
                "retstart": "0",
                "idlist": ids,
            }
        })))
        .mount(mock_server)
        .await;
}

struct EfetchResponder;

impl Respond for EfetchResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let ids = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        let records: String = ids
            .split(',')
            .filter(|id| !id.is_empty())
            .map(|pmid| {
                format!(
                    "<PubmedArticle><MedlineCitation><PMID>{pmid}</PMID>\
                     </MedlineCitation></PubmedArticle>"
                )
            })
            .collect();
        ResponseTemplate::new(200).set_body_string(format!(
            "<?xml version=\"1.0\" ?><PubmedArticleSet>{records}</PubmedArticleSet>"
        ))
    }
}

#[tokio::test]
async fn test_query_streams_every_matching_record_once() {
    let mock_server = MockServer::start().await;
    mount_esearch(&mock_server, 500).await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(EfetchResponder)
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let mut stream = pin!(client.query("crispr cas9", None).await.unwrap());

    let mut pmids = Vec::new();
    while let Some(record) = stream.next().await {
        pmids.push(record.unwrap().pmid().to_string());
    }

    assert_eq!(pmids.len(), 500);
    let unique: HashSet<&String> = pmids.iter().collect();
    assert_eq!(unique.len(), 500, "a record was yielded more than once");
    assert_eq!(pmids.first().map(String::as_str), Some("1"));
    assert_eq!(pmids.last().map(String::as_str), Some("500"));
}

#[tokio::test]
async fn test_query_fetches_batches_lazily() {
    let mock_server = MockServer::start().await;
    mount_esearch(&mock_server, 500).await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(EfetchResponder)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let stream = client.query("crispr cas9", None).await.unwrap();

    // Consuming only the first batch must not request the second.
    let consumed: Vec<_> = pin!(stream).take(250).collect().await;
    assert_eq!(consumed.len(), 250);

    let efetch_requests = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/efetch.fcgi")
        .count();
    assert_eq!(efetch_requests, 1);
}

#[tokio::test]
async fn test_query_with_no_matches_yields_nothing() {
    let mock_server = MockServer::start().await;
    mount_esearch(&mock_server, 0).await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(EfetchResponder)
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let stream = client.query("zzzznomatches", None).await.unwrap();
    let records: Vec<_> = pin!(stream).collect().await;
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_query_honors_max_results() {
    let mock_server = MockServer::start().await;
    mount_esearch(&mock_server, 500).await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(EfetchResponder)
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let stream = client.query("crispr cas9", Some(100)).await.unwrap();
    let records: Vec<_> = pin!(stream).collect().await;
    assert_eq!(records.len(), 100);
}
