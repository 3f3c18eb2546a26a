use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use entrez_client::{ClientConfig, PubMedClient, PubMedRecord};

fn test_client(mock: &MockServer) -> PubMedClient {
    let config = ClientConfig::new()
        .with_base_url(mock.uri())
        .with_rate_limit(1000);
    PubMedClient::with_config(config)
}

fn article_xml(pmid: &str) -> String {
    format!(
        "<PubmedArticle><MedlineCitation><PMID>{pmid}</PMID>\
         <Article><ArticleTitle>Record {pmid}</ArticleTitle></Article>\
         </MedlineCitation></PubmedArticle>"
    )
}

/// Answers efetch with one minimal record per requested identifier, in
/// request order, so batch partitioning is observable end to end.
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
            .map(article_xml)
            .collect();
        ResponseTemplate::new(200).set_body_string(format!(
            "<?xml version=\"1.0\" ?><PubmedArticleSet>{records}</PubmedArticleSet>"
        ))
    }
}

#[tokio::test]
async fn test_fetch_partitions_into_250_id_batches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(EfetchResponder)
        .expect(3)
        .mount(&mock_server)
        .await;

    let pmids: Vec<String> = (1..=600).map(|i| i.to_string()).collect();
    let client = test_client(&mock_server);
    let records = client.fetch_articles(&pmids).await.unwrap();

    // Every identifier comes back, in request order.
    assert_eq!(records.len(), 600);
    let returned: Vec<&str> = records.iter().map(|r| r.pmid()).collect();
    let expected: Vec<String> = (1..=600).map(|i| i.to_string()).collect();
    assert_eq!(returned, expected.iter().map(String::as_str).collect::<Vec<_>>());

    // No single request carried more than a full batch.
    for request in mock_server.received_requests().await.unwrap() {
        let id_count = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.split(',').count())
            .unwrap_or(0);
        assert!(id_count <= 250, "batch of {id_count} identifiers");
    }
}

#[tokio::test]
async fn test_fetch_respects_configured_batch_size() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(EfetchResponder)
        .expect(4)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::new()
        .with_base_url(mock_server.uri())
        .with_rate_limit(1000)
        .with_batch_size(5);
    let client = PubMedClient::with_config(config);

    let pmids: Vec<String> = (1..=20).map(|i| i.to_string()).collect();
    let records = client.fetch_articles(&pmids).await.unwrap();
    assert_eq!(records.len(), 20);
}

#[tokio::test]
async fn test_fetch_decodes_mixed_articles_and_books() {
    let mock_server = MockServer::start().await;

    let body = r#"<?xml version="1.0" ?>
<PubmedArticleSet>
    <PubmedArticle>
        <MedlineCitation>
            <PMID>31978945</PMID>
            <Article><ArticleTitle>A journal article</ArticleTitle></Article>
        </MedlineCitation>
    </PubmedArticle>
    <PubmedBookArticle>
        <BookDocument>
            <PMID>20301577</PMID>
            <Book><BookTitle>A book chapter</BookTitle></Book>
        </BookDocument>
    </PubmedBookArticle>
</PubmedArticleSet>"#;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let records = client
        .fetch_articles(&["31978945".to_string(), "20301577".to_string()])
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(matches!(records[0], PubMedRecord::Article(_)));
    assert_eq!(records[0].title(), Some("A journal article"));
    assert!(matches!(records[1], PubMedRecord::Book(_)));
    assert_eq!(records[1].title(), Some("A book chapter"));
}

#[tokio::test]
async fn test_fetch_with_no_ids_makes_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(EfetchResponder)
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let records = client.fetch_articles(&[]).await.unwrap();
    assert!(records.is_empty());
}
