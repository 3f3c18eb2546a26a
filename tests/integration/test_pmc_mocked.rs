use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use entrez_client::{ClientConfig, PmcClient};

const FULL_TEXT_SET: &str = r#"<?xml version="1.0" ?>
<pmc-articleset>
<article>
  <front>
    <journal-meta>
      <journal-title-group><journal-title>eLife</journal-title></journal-title-group>
      <publisher><publisher-name>eLife Sciences</publisher-name></publisher>
    </journal-meta>
    <article-meta>
      <article-id pub-id-type="pmc">7000001</article-id>
      <title-group><article-title>First full-text article</article-title></title-group>
      <pub-date pub-type="pmc-release"><day>1</day><month>6</month><year>2021</year></pub-date>
      <abstract><p>First abstract.</p></abstract>
    </article-meta>
  </front>
</article>
<article>
  <front>
    <article-meta>
      <article-id pub-id-type="pmc">7000002</article-id>
      <title-group><article-title>Second full-text article</article-title></title-group>
    </article-meta>
  </front>
</article>
</pmc-articleset>"#;

fn test_client(mock: &MockServer) -> PmcClient {
    let config = ClientConfig::new()
        .with_base_url(mock.uri())
        .with_rate_limit(1000);
    PmcClient::with_config(config)
}

#[tokio::test]
async fn test_query_searches_and_fetches_full_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("db", "pmc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esearchresult": {
                "count": "2",
                "retmax": "2",
                "retstart": "0",
                "idlist": ["7000001", "7000002"],
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("db", "pmc"))
        .and(query_param("id", "7000001,7000002"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FULL_TEXT_SET))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let articles = client.query("chromatin topology", None).await.unwrap();

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].pmc_id.as_deref(), Some("7000001"));
    assert_eq!(articles[0].title, "First full-text article");
    assert_eq!(
        articles[0].journal.as_ref().unwrap().title.as_deref(),
        Some("eLife")
    );
    let date = articles[0].publication_date.unwrap();
    assert_eq!((date.year(), u8::from(date.month()), date.day()), (2021, 6, 1));

    assert_eq!(articles[1].pmc_id.as_deref(), Some("7000002"));
    assert!(articles[1].journal.is_none());
    assert!(articles[1].publication_date.is_none());
}

#[tokio::test]
async fn test_fetch_surfaces_api_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let error = client
        .fetch_articles(&["7000001".to_string()])
        .await
        .expect_err("a 400 must fail the call");
    assert!(matches!(
        error,
        entrez_client::PubMedError::ApiError { status: 400, .. }
    ));
}
