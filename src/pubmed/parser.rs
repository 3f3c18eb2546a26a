use std::collections::BTreeMap;
use std::result;
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use time::{Date, Month};
use tracing::{debug, warn};

use crate::error::{PubMedError, Result};
use crate::pubmed::models::{
    Author, BookSection, MeshHeading, PubMedArticle, PubMedBookArticle, PubMedRecord,
    PublicationDate,
};

/// ORCID URL form: scheme, host, then four dash-separated groups of four,
/// the last of which may end in `X`.
static ORCID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://orcid\.org/(\d{4}-\d{4}-\d{4}-\d{3}[\dX])").expect("valid ORCID pattern")
});

/// Decode every record in an efetch XML document
///
/// Journal articles (`PubmedArticle`) are decoded first, then book
/// articles (`PubmedBookArticle`), each retaining its raw source subtree.
/// A record whose identifier cannot be located is skipped with a warning;
/// only an unreadable document fails the call.
pub fn parse_records_from_xml(xml: &str) -> Result<Vec<PubMedRecord>> {
    validate_document(xml)?;

    let mut records = Vec::new();

    for subtree in extract_record_subtrees(xml, "PubmedArticle") {
        match from_str::<PubmedArticleXml>(&subtree) {
            Ok(parsed) => match parsed.into_record(subtree) {
                Some(article) => records.push(PubMedRecord::Article(article)),
                None => warn!("skipping article record without a PMID"),
            },
            Err(e) => warn!(error = %e, "skipping unreadable article record"),
        }
    }

    for subtree in extract_record_subtrees(xml, "PubmedBookArticle") {
        match from_str::<PubmedBookArticleXml>(&subtree) {
            Ok(parsed) => match parsed.into_record(subtree) {
                Some(book) => records.push(PubMedRecord::Book(book)),
                None => warn!("skipping book record without a PMID"),
            },
            Err(e) => warn!(error = %e, "skipping unreadable book record"),
        }
    }

    debug!(records = records.len(), "decoded efetch document");
    Ok(records)
}

/// Reject documents that are not well-formed XML
fn validate_document(xml: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => return Ok(()),
            Ok(_) => {}
            Err(e) => {
                return Err(PubMedError::XmlError {
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Slice out every `<tag>...</tag>` subtree as raw text
///
/// Record elements never nest, so a plain open/close scan is enough and
/// keeps the original bytes intact for the `raw_xml` field.
fn extract_record_subtrees(xml: &str, tag: &str) -> Vec<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut subtrees = Vec::new();
    let mut pos = 0;

    while let Some(found) = xml[pos..].find(&open) {
        let start = pos + found;
        let after_open = start + open.len();
        // Guard against matching a longer tag name prefix
        match xml.as_bytes().get(after_open) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {}
            _ => {
                pos = after_open;
                continue;
            }
        }
        let Some(close_rel) = xml[after_open..].find(&close) else {
            break;
        };
        let end = after_open + close_rel + close.len();
        subtrees.push(xml[start..end].to_string());
        pos = end;
    }

    subtrees
}

/// Extract a bare ORCID from an author identifier value
///
/// Anything that does not match the URL form yields `None`; malformed
/// input never propagates an error.
pub(crate) fn extract_orcid(value: &str) -> Option<String> {
    ORCID_RE
        .captures(value.trim())
        .map(|captures| captures[1].to_string())
}

// ---------------------------------------------------------------------
// XML mirror structures (journal articles)
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename = "PubmedArticle")]
struct PubmedArticleXml {
    #[serde(rename = "MedlineCitation")]
    medline_citation: Option<MedlineCitationXml>,
    #[serde(rename = "PubmedData")]
    pubmed_data: Option<PubmedDataXml>,
}

impl PubmedArticleXml {
    fn into_record(self, raw_xml: String) -> Option<PubMedArticle> {
        let citation = self.medline_citation;
        let pubmed_data = self.pubmed_data;

        let article_ids: BTreeMap<String, String> = pubmed_data
            .as_ref()
            .and_then(|d| d.article_id_list.as_ref())
            .map(|list| list.to_map())
            .unwrap_or_default();

        // The PMID is the one field the record cannot do without.
        let pmid = citation
            .as_ref()
            .and_then(|c| c.pmid.as_ref())
            .map(|p| p.value.trim().to_string())
            .filter(|p| !p.is_empty())
            .or_else(|| article_ids.get("pubmed").cloned())?;

        let article = citation.as_ref().and_then(|c| c.article.as_ref());
        let journal = article.and_then(|a| a.journal.as_ref());
        let journal_issue = journal.and_then(|j| j.journal_issue.as_ref());
        let abstract_section = article.and_then(|a| a.abstract_section.as_ref());

        let doi = article_ids.get("doi").cloned().or_else(|| {
            article
                .and_then(|a| a.elocation_ids.as_ref())
                .and_then(|ids| {
                    ids.iter()
                        .find(|id| id.id_type.as_deref() == Some("doi"))
                        .map(|id| id.value.trim().to_string())
                })
        });

        let publication_date = resolve_publication_date(
            pubmed_data.as_ref().and_then(|d| d.history.as_ref()),
            journal_issue.and_then(|issue| issue.pub_date.as_ref()),
        );

        Some(PubMedArticle {
            pmid,
            title: article.and_then(|a| a.article_title.clone()),
            abstract_text: abstract_section.and_then(|s| s.full_text()),
            methods: abstract_section.and_then(|s| s.labelled_section(&["METHODS"])),
            results: abstract_section.and_then(|s| s.labelled_section(&["RESULTS"])),
            conclusions: abstract_section
                .and_then(|s| s.labelled_section(&["CONCLUSION", "CONCLUSIONS"])),
            keywords: citation
                .as_ref()
                .and_then(|c| c.keyword_list.as_ref())
                .map(|list| list.to_keywords())
                .unwrap_or_default(),
            journal: journal.and_then(|j| j.title.clone()),
            issn: journal.and_then(|j| j.issn_of_type("Print")),
            issn_electronic: journal.and_then(|j| j.issn_of_type("Electronic")),
            volume: journal_issue.and_then(|issue| issue.volume.clone()),
            issue: journal_issue.and_then(|issue| issue.issue.clone()),
            pages: article.and_then(|a| a.pagination.as_ref()).and_then(|p| p.to_pages()),
            publication_types: article
                .and_then(|a| a.publication_type_list.as_ref())
                .map(|list| list.to_types())
                .unwrap_or_default(),
            publication_status: pubmed_data
                .as_ref()
                .and_then(|d| d.publication_status.clone()),
            publication_date,
            authors: article
                .and_then(|a| a.author_list.as_ref())
                .map(|list| list.to_authors())
                .unwrap_or_default(),
            copyrights: abstract_section.and_then(|s| s.copyright.clone()),
            doi,
            mesh_headings: citation
                .as_ref()
                .and_then(|c| c.mesh_heading_list.as_ref())
                .map(|list| list.to_headings()),
            article_ids,
            owner: citation.as_ref().and_then(|c| c.owner.clone()),
            raw_xml,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MedlineCitationXml {
    #[serde(rename = "@Owner")]
    owner: Option<String>,
    #[serde(rename = "PMID")]
    pmid: Option<PmidXml>,
    #[serde(rename = "Article")]
    article: Option<ArticleXml>,
    #[serde(rename = "MeshHeadingList")]
    mesh_heading_list: Option<MeshHeadingListXml>,
    #[serde(rename = "KeywordList")]
    keyword_list: Option<KeywordListXml>,
}

#[derive(Debug, Deserialize)]
struct PmidXml {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ArticleXml {
    #[serde(rename = "Journal")]
    journal: Option<JournalXml>,
    #[serde(rename = "ArticleTitle")]
    article_title: Option<String>,
    #[serde(rename = "Pagination")]
    pagination: Option<PaginationXml>,
    #[serde(rename = "ELocationID")]
    elocation_ids: Option<Vec<ELocationIdXml>>,
    #[serde(rename = "Abstract")]
    abstract_section: Option<AbstractXml>,
    #[serde(rename = "AuthorList")]
    author_list: Option<AuthorListXml>,
    #[serde(rename = "PublicationTypeList")]
    publication_type_list: Option<PublicationTypeListXml>,
}

#[derive(Debug, Deserialize)]
struct JournalXml {
    #[serde(rename = "ISSN")]
    issn: Option<Vec<IssnXml>>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "JournalIssue")]
    journal_issue: Option<JournalIssueXml>,
}

impl JournalXml {
    fn issn_of_type(&self, issn_type: &str) -> Option<String> {
        self.issn.as_ref().and_then(|issns| {
            issns
                .iter()
                .find(|issn| issn.issn_type.as_deref() == Some(issn_type))
                .map(|issn| issn.value.trim().to_string())
        })
    }
}

#[derive(Debug, Deserialize)]
struct IssnXml {
    #[serde(rename = "$text", default)]
    value: String,
    #[serde(rename = "@IssnType")]
    issn_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JournalIssueXml {
    #[serde(rename = "Volume")]
    volume: Option<String>,
    #[serde(rename = "Issue")]
    issue: Option<String>,
    #[serde(rename = "PubDate")]
    pub_date: Option<PubDateXml>,
}

#[derive(Debug, Deserialize)]
struct PubDateXml {
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Month")]
    month: Option<String>,
    #[serde(rename = "Day")]
    day: Option<String>,
    #[serde(rename = "Season")]
    season: Option<String>,
    #[serde(rename = "MedlineDate")]
    medline_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaginationXml {
    #[serde(rename = "MedlinePgn")]
    medline_pgn: Option<String>,
    #[serde(rename = "StartPage")]
    start_page: Option<String>,
    #[serde(rename = "EndPage")]
    end_page: Option<String>,
}

impl PaginationXml {
    fn to_pages(&self) -> Option<String> {
        if let Some(pgn) = &self.medline_pgn {
            return Some(pgn.clone());
        }
        match (&self.start_page, &self.end_page) {
            (Some(start), Some(end)) => Some(format!("{start}-{end}")),
            (Some(start), None) => Some(start.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ELocationIdXml {
    #[serde(rename = "$text", default)]
    value: String,
    #[serde(rename = "@EIdType")]
    id_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AbstractXml {
    #[serde(rename = "AbstractText", default)]
    abstract_texts: Vec<AbstractTextXml>,
    #[serde(rename = "CopyrightInformation")]
    copyright: Option<String>,
}

impl AbstractXml {
    /// All abstract sections joined with a space
    fn full_text(&self) -> Option<String> {
        if self.abstract_texts.is_empty() {
            None
        } else {
            Some(
                self.abstract_texts
                    .iter()
                    .map(|t| t.text())
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
    }

    /// The first section whose label matches one of `labels`
    fn labelled_section(&self, labels: &[&str]) -> Option<String> {
        self.abstract_texts
            .iter()
            .find(|t| {
                t.label()
                    .is_some_and(|l| labels.iter().any(|wanted| l.eq_ignore_ascii_case(wanted)))
            })
            .map(|t| t.text().to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AbstractTextXml {
    Simple(String),
    Structured {
        #[serde(rename = "$text", default)]
        text: String,
        #[serde(rename = "@Label")]
        label: Option<String>,
    },
}

impl AbstractTextXml {
    fn text(&self) -> &str {
        match self {
            AbstractTextXml::Simple(text) => text,
            AbstractTextXml::Structured { text, .. } => text,
        }
    }

    fn label(&self) -> Option<&str> {
        match self {
            AbstractTextXml::Simple(_) => None,
            AbstractTextXml::Structured { label, .. } => label.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthorListXml {
    #[serde(rename = "Author", default)]
    authors: Vec<AuthorXml>,
}

impl AuthorListXml {
    fn to_authors(&self) -> Vec<Author> {
        self.authors.iter().map(|a| a.to_author()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct AuthorXml {
    #[serde(rename = "LastName")]
    last_name: Option<String>,
    #[serde(rename = "ForeName")]
    fore_name: Option<String>,
    #[serde(rename = "Initials")]
    initials: Option<String>,
    #[serde(rename = "CollectiveName")]
    collective_name: Option<String>,
    #[serde(rename = "AffiliationInfo")]
    affiliation_info: Option<Vec<AffiliationInfoXml>>,
    #[serde(rename = "Identifier")]
    identifiers: Option<Vec<IdentifierXml>>,
}

impl AuthorXml {
    fn to_author(&self) -> Author {
        let orcid = self.identifiers.as_ref().and_then(|ids| {
            ids.iter()
                .find(|id| id.source.as_deref() == Some("ORCID"))
                .and_then(|id| extract_orcid(&id.value))
        });

        Author {
            last_name: self.last_name.clone(),
            fore_name: self.fore_name.clone(),
            initials: self.initials.clone(),
            affiliation: self
                .affiliation_info
                .as_ref()
                .and_then(|infos| infos.iter().find_map(|info| info.affiliation.clone())),
            orcid,
            collective_name: self.collective_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AffiliationInfoXml {
    #[serde(rename = "Affiliation")]
    affiliation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdentifierXml {
    #[serde(rename = "$text", default)]
    value: String,
    #[serde(rename = "@Source")]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublicationTypeListXml {
    #[serde(rename = "PublicationType", default)]
    publication_types: Vec<PublicationTypeXml>,
}

impl PublicationTypeListXml {
    fn to_types(&self) -> Vec<String> {
        self.publication_types
            .iter()
            .map(|pt| pt.text().to_string())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PublicationTypeXml {
    Simple(String),
    Complex {
        #[serde(rename = "$text", default)]
        text: String,
    },
}

impl PublicationTypeXml {
    fn text(&self) -> &str {
        match self {
            PublicationTypeXml::Simple(text) => text,
            PublicationTypeXml::Complex { text } => text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MeshHeadingListXml {
    #[serde(rename = "MeshHeading", default)]
    mesh_headings: Vec<MeshHeadingXml>,
}

impl MeshHeadingListXml {
    /// An empty list element decodes to an empty vector, never `None`
    fn to_headings(&self) -> Vec<MeshHeading> {
        self.mesh_headings
            .iter()
            .filter_map(|h| h.to_heading())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct MeshHeadingXml {
    #[serde(rename = "DescriptorName")]
    descriptor_name: Option<DescriptorNameXml>,
}

impl MeshHeadingXml {
    fn to_heading(&self) -> Option<MeshHeading> {
        self.descriptor_name.as_ref().map(|d| MeshHeading {
            descriptor: d.text.clone(),
            major_topic: d.major_topic,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DescriptorNameXml {
    #[serde(rename = "$text", default)]
    text: String,
    #[serde(rename = "@MajorTopicYN", default, deserialize_with = "deserialize_bool_yn")]
    major_topic: bool,
}

fn deserialize_bool_yn<'de, D>(deserializer: D) -> result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value == "Y")
}

#[derive(Debug, Deserialize)]
struct KeywordListXml {
    #[serde(rename = "Keyword", default)]
    keywords: Vec<KeywordXml>,
}

impl KeywordListXml {
    fn to_keywords(&self) -> Vec<String> {
        self.keywords.iter().map(|k| k.text().to_string()).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeywordXml {
    Simple(String),
    Complex {
        #[serde(rename = "$text", default)]
        text: String,
    },
}

impl KeywordXml {
    fn text(&self) -> &str {
        match self {
            KeywordXml::Simple(text) => text,
            KeywordXml::Complex { text } => text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PubmedDataXml {
    #[serde(rename = "History")]
    history: Option<HistoryXml>,
    #[serde(rename = "PublicationStatus")]
    publication_status: Option<String>,
    #[serde(rename = "ArticleIdList")]
    article_id_list: Option<ArticleIdListXml>,
}

#[derive(Debug, Deserialize)]
struct HistoryXml {
    #[serde(rename = "PubMedPubDate", default)]
    dates: Vec<PubMedPubDateXml>,
}

#[derive(Debug, Deserialize)]
struct PubMedPubDateXml {
    #[serde(rename = "@PubStatus")]
    pub_status: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Month")]
    month: Option<String>,
    #[serde(rename = "Day")]
    day: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleIdListXml {
    #[serde(rename = "ArticleId", default)]
    ids: Vec<ArticleIdXml>,
}

impl ArticleIdListXml {
    fn to_map(&self) -> BTreeMap<String, String> {
        self.ids
            .iter()
            .filter_map(|id| {
                id.id_type
                    .as_ref()
                    .map(|id_type| (id_type.clone(), id.value.trim().to_string()))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ArticleIdXml {
    #[serde(rename = "$text", default)]
    value: String,
    #[serde(rename = "@IdType")]
    id_type: Option<String>,
}

// ---------------------------------------------------------------------
// XML mirror structures (book articles)
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename = "PubmedBookArticle")]
struct PubmedBookArticleXml {
    #[serde(rename = "BookDocument")]
    book_document: Option<BookDocumentXml>,
    #[serde(rename = "PubmedBookData")]
    pubmed_book_data: Option<PubmedDataXml>,
}

impl PubmedBookArticleXml {
    fn into_record(self, raw_xml: String) -> Option<PubMedBookArticle> {
        let document = self.book_document;
        let book = document.as_ref().and_then(|d| d.book.as_ref());

        let mut article_ids: BTreeMap<String, String> = document
            .as_ref()
            .and_then(|d| d.article_id_list.as_ref())
            .map(|list| list.to_map())
            .unwrap_or_default();
        if let Some(more) = self
            .pubmed_book_data
            .as_ref()
            .and_then(|d| d.article_id_list.as_ref())
        {
            for (id_type, value) in more.to_map() {
                article_ids.entry(id_type).or_insert(value);
            }
        }

        let pmid = document
            .as_ref()
            .and_then(|d| d.pmid.as_ref())
            .map(|p| p.value.trim().to_string())
            .filter(|p| !p.is_empty())
            .or_else(|| article_ids.get("pubmed").cloned())?;

        let abstract_section = document.as_ref().and_then(|d| d.abstract_section.as_ref());

        let mut authors: Vec<Author> = Vec::new();
        if let Some(document) = document.as_ref() {
            for list in &document.author_lists {
                authors.extend(list.to_authors());
            }
        }
        if let Some(book) = book {
            for list in &book.author_lists {
                authors.extend(list.to_authors());
            }
        }

        Some(PubMedBookArticle {
            pmid,
            title: book.and_then(|b| b.book_title.clone()),
            abstract_text: abstract_section.and_then(|s| s.full_text()),
            authors,
            doi: article_ids.get("doi").cloned(),
            copyrights: abstract_section.and_then(|s| s.copyright.clone()),
            isbn: book.and_then(|b| b.isbn.as_ref()).and_then(|isbns| isbns.first().cloned()),
            language: document
                .as_ref()
                .and_then(|d| d.language.as_ref())
                .and_then(|langs| langs.first().cloned()),
            publication_types: document
                .as_ref()
                .and_then(|d| d.publication_type_list.as_ref())
                .map(|list| list.to_types())
                .unwrap_or_default(),
            publication_date: book
                .and_then(|b| b.pub_date.as_ref())
                .and_then(|d| d.year.as_ref())
                .map(|y| y.trim().to_string()),
            publisher: book
                .and_then(|b| b.publisher.as_ref())
                .and_then(|p| p.name.clone()),
            publisher_location: book
                .and_then(|b| b.publisher.as_ref())
                .and_then(|p| p.location.clone()),
            sections: document
                .as_ref()
                .and_then(|d| d.sections.as_ref())
                .map(|s| s.to_sections())
                .unwrap_or_default(),
            raw_xml,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BookDocumentXml {
    #[serde(rename = "PMID")]
    pmid: Option<PmidXml>,
    #[serde(rename = "ArticleIdList")]
    article_id_list: Option<ArticleIdListXml>,
    #[serde(rename = "Book")]
    book: Option<BookXml>,
    #[serde(rename = "Language")]
    language: Option<Vec<String>>,
    #[serde(rename = "AuthorList", default)]
    author_lists: Vec<AuthorListXml>,
    #[serde(rename = "PublicationType")]
    publication_type_list: Option<PublicationTypeListInlineXml>,
    #[serde(rename = "Abstract")]
    abstract_section: Option<AbstractXml>,
    #[serde(rename = "Sections")]
    sections: Option<SectionsXml>,
}

/// Book documents carry bare repeated `PublicationType` elements rather
/// than a `PublicationTypeList` wrapper.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct PublicationTypeListInlineXml {
    publication_types: Vec<PublicationTypeXml>,
}

impl PublicationTypeListInlineXml {
    fn to_types(&self) -> Vec<String> {
        self.publication_types
            .iter()
            .map(|pt| pt.text().to_string())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct BookXml {
    #[serde(rename = "Publisher")]
    publisher: Option<PublisherXml>,
    #[serde(rename = "BookTitle")]
    book_title: Option<String>,
    #[serde(rename = "PubDate")]
    pub_date: Option<PubDateXml>,
    #[serde(rename = "AuthorList", default)]
    author_lists: Vec<AuthorListXml>,
    #[serde(rename = "Isbn")]
    isbn: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct PublisherXml {
    #[serde(rename = "PublisherName")]
    name: Option<String>,
    #[serde(rename = "PublisherLocation")]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SectionsXml {
    #[serde(rename = "Section", default)]
    sections: Vec<SectionXml>,
}

impl SectionsXml {
    fn to_sections(&self) -> Vec<BookSection> {
        self.sections
            .iter()
            .map(|s| BookSection {
                title: s.title.clone(),
                location_label: s.location_label.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SectionXml {
    #[serde(rename = "SectionTitle")]
    title: Option<String>,
    #[serde(rename = "LocationLabel")]
    location_label: Option<String>,
}

// ---------------------------------------------------------------------
// Publication date resolution
// ---------------------------------------------------------------------

/// Best-effort publication date following the upstream fallback policy:
/// prefer the history event with `PubStatus="pubmed"`, then the journal
/// `PubDate`, otherwise nothing.
fn resolve_publication_date(
    history: Option<&HistoryXml>,
    pub_date: Option<&PubDateXml>,
) -> Option<PublicationDate> {
    if let Some(date) = history.and_then(pubmed_event_date) {
        return Some(date);
    }
    pub_date.and_then(journal_pub_date)
}

/// The dated history event flagged `PubStatus="pubmed"`
///
/// Requires a parsable year; month and day default to 1 when absent or
/// non-numeric. Impossible calendar combinations fall through.
fn pubmed_event_date(history: &HistoryXml) -> Option<PublicationDate> {
    let event = history
        .dates
        .iter()
        .find(|d| d.pub_status.as_deref() == Some("pubmed"))?;

    let year = parse_i32(event.year.as_deref())?;
    let month = parse_u8(event.month.as_deref()).unwrap_or(1);
    let day = parse_u8(event.day.as_deref()).unwrap_or(1);

    calendar_date(year, month, day).map(PublicationDate::Date)
}

/// Generic `PubDate` resolution, trying in order: year + abbreviated
/// month + day, year + abbreviated month, year + numeric month, year +
/// numeric month + day, the free-text `MedlineDate`, and finally year +
/// season as free text.
fn journal_pub_date(pub_date: &PubDateXml) -> Option<PublicationDate> {
    if let Some(year) = parse_i32(pub_date.year.as_deref()) {
        let abbrev_month = pub_date.month.as_deref().and_then(month_from_abbrev);
        let numeric_month = parse_u8(pub_date.month.as_deref());
        let day = parse_u8(pub_date.day.as_deref());

        if let (Some(month), Some(day)) = (abbrev_month, day) {
            if let Some(date) = calendar_date(year, month, day) {
                return Some(PublicationDate::Date(date));
            }
        }
        if let Some(month) = abbrev_month {
            if let Some(date) = calendar_date(year, month, 1) {
                return Some(PublicationDate::Date(date));
            }
        }
        if let Some(month) = numeric_month {
            if let Some(date) = calendar_date(year, month, 1) {
                return Some(PublicationDate::Date(date));
            }
        }
        if let (Some(month), Some(day)) = (numeric_month, day) {
            if let Some(date) = calendar_date(year, month, day) {
                return Some(PublicationDate::Date(date));
            }
        }
    }

    if let Some(medline_date) = pub_date
        .medline_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return Some(PublicationDate::Text(medline_date.to_string()));
    }

    if let (Some(year), Some(season)) = (pub_date.year.as_deref(), pub_date.season.as_deref()) {
        let year = year.trim();
        let season = season.trim();
        if !year.is_empty() && !season.is_empty() {
            return Some(PublicationDate::Text(format!("{year} {season}")));
        }
    }

    None
}

fn parse_i32(value: Option<&str>) -> Option<i32> {
    value.and_then(|v| v.trim().parse().ok())
}

fn parse_u8(value: Option<&str>) -> Option<u8> {
    value.and_then(|v| v.trim().parse().ok())
}

fn month_from_abbrev(value: &str) -> Option<u8> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let value = value.trim().to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|abbrev| value.starts_with(abbrev))
        .map(|index| index as u8 + 1)
}

fn calendar_date(year: i32, month: u8, day: u8) -> Option<Date> {
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}
