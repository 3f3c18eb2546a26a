use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use entrez_client::{ClientConfig, PubMedClient, PubMedError};

fn test_client(mock: &MockServer) -> PubMedClient {
    let config = ClientConfig::new()
        .with_base_url(mock.uri())
        .with_rate_limit(1000)
        .with_page_size(300);
    PubMedClient::with_config(config)
}

#[tokio::test]
async fn test_search_surfaces_rate_limit_rejection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(429).set_body_string("API rate limit exceeded"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let error = client
        .search_article_ids("cancer", None)
        .await
        .expect_err("a 429 must fail the call");

    match error {
        PubMedError::ApiError { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "API rate limit exceeded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_fetch_surfaces_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let error = client
        .fetch_articles(&["31978945".to_string()])
        .await
        .expect_err("a 500 must fail the call");
    assert!(matches!(error, PubMedError::ApiError { status: 500, .. }));
}

#[tokio::test]
async fn test_pagination_aborts_on_mid_run_failure() {
    let mock_server = MockServer::start().await;

    let first_page: Vec<String> = (0..300).map(|i| i.to_string()).collect();
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("retstart", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esearchresult": {
                "count": "1344",
                "retmax": "300",
                "retstart": "0",
                "idlist": first_page,
            }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("retstart", "300"))
        .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let error = client
        .search_article_ids("cancer", None)
        .await
        .expect_err("a failing page must fail the whole search");
    assert!(matches!(error, PubMedError::ApiError { status: 503, .. }));
}

#[tokio::test]
async fn test_fetch_rejects_unreadable_xml() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<PubmedArticleSet><PMID></Wrong></PubmedArticleSet>"),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let error = client
        .fetch_articles(&["31978945".to_string()])
        .await
        .expect_err("broken XML must fail the call");
    assert!(matches!(error, PubMedError::XmlError { .. }));
}

#[tokio::test]
async fn test_malformed_esearch_json_is_a_request_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let error = client
        .search_article_ids("cancer", None)
        .await
        .expect_err("non-JSON body must fail the call");
    assert!(matches!(error, PubMedError::RequestError(_)));
}
