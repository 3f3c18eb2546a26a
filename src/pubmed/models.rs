use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use time::Date;

/// One decoded record from an efetch response
///
/// An efetch document may mix journal articles and book articles; the tag
/// of the record element decides the variant.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "record_type")]
pub enum PubMedRecord {
    /// A `PubmedArticle` element (journal article)
    Article(PubMedArticle),
    /// A `PubmedBookArticle` element (book chapter)
    Book(PubMedBookArticle),
}

impl PubMedRecord {
    /// The record identifier (PMID)
    pub fn pmid(&self) -> &str {
        match self {
            PubMedRecord::Article(a) => &a.pmid,
            PubMedRecord::Book(b) => &b.pmid,
        }
    }

    /// The record title, when present
    pub fn title(&self) -> Option<&str> {
        match self {
            PubMedRecord::Article(a) => a.title.as_deref(),
            PubMedRecord::Book(b) => b.title.as_deref(),
        }
    }

    /// Diagnostic dump of the full record as pretty-printed JSON
    ///
    /// Calendar dates are rendered as ISO strings and the retained raw
    /// XML subtree as its string form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A journal article decoded from a `PubmedArticle` element
///
/// Every field apart from the PMID is independently optional; a missing
/// or malformed field decodes to `None` (or an empty list) without
/// affecting the rest of the record.
#[derive(Debug, Clone, Serialize)]
pub struct PubMedArticle {
    /// PubMed ID
    pub pmid: String,
    /// Article title
    pub title: Option<String>,
    /// Full abstract text (all sections joined)
    pub abstract_text: Option<String>,
    /// Structured abstract section labelled METHODS
    pub methods: Option<String>,
    /// Structured abstract section labelled RESULTS
    pub results: Option<String>,
    /// Structured abstract section labelled CONCLUSION(S)
    pub conclusions: Option<String>,
    /// Author-supplied keywords
    pub keywords: Vec<String>,
    /// Journal title
    pub journal: Option<String>,
    /// Print ISSN
    pub issn: Option<String>,
    /// Electronic ISSN
    pub issn_electronic: Option<String>,
    /// Journal volume
    pub volume: Option<String>,
    /// Journal issue
    pub issue: Option<String>,
    /// Page range (MedlinePgn)
    pub pages: Option<String>,
    /// Publication types (e.g. "Journal Article", "Review")
    pub publication_types: Vec<String>,
    /// Publication status (e.g. "ppublish", "epublish")
    pub publication_status: Option<String>,
    /// Best-effort publication date
    pub publication_date: Option<PublicationDate>,
    /// Author list in document order
    pub authors: Vec<Author>,
    /// Copyright statement
    pub copyrights: Option<String>,
    /// DOI (Digital Object Identifier)
    pub doi: Option<String>,
    /// MeSH headings: `None` when the heading list element is absent,
    /// an empty vector when it is present but empty
    pub mesh_headings: Option<Vec<MeshHeading>>,
    /// Raw identifier map, keyed by `IdType` (pubmed, doi, pmc, ...)
    pub article_ids: BTreeMap<String, String>,
    /// Owning agency of the citation (MedlineCitation `Owner`)
    pub owner: Option<String>,
    /// The source XML subtree this record was decoded from
    pub raw_xml: String,
}

/// A book chapter decoded from a `PubmedBookArticle` element
#[derive(Debug, Clone, Serialize)]
pub struct PubMedBookArticle {
    /// PubMed ID
    pub pmid: String,
    /// Book or chapter title
    pub title: Option<String>,
    /// Abstract text
    pub abstract_text: Option<String>,
    /// Author list (may carry collective names)
    pub authors: Vec<Author>,
    /// DOI
    pub doi: Option<String>,
    /// Copyright statement
    pub copyrights: Option<String>,
    /// ISBN
    pub isbn: Option<String>,
    /// Publication language
    pub language: Option<String>,
    /// Publication types
    pub publication_types: Vec<String>,
    /// Publication year as reported by the book record
    pub publication_date: Option<String>,
    /// Publisher name
    pub publisher: Option<String>,
    /// Publisher location
    pub publisher_location: Option<String>,
    /// Book sections with their location labels
    pub sections: Vec<BookSection>,
    /// The source XML subtree this record was decoded from
    pub raw_xml: String,
}

/// One author entry
///
/// Authors are plain value objects; they are not deduplicated across
/// records and carry no identity beyond field equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    /// Family name
    pub last_name: Option<String>,
    /// Given name(s)
    pub fore_name: Option<String>,
    /// Initials
    pub initials: Option<String>,
    /// First affiliation text, when present
    pub affiliation: Option<String>,
    /// ORCID extracted from the author identifier URL
    pub orcid: Option<String>,
    /// Collective name (group authorship, book records)
    pub collective_name: Option<String>,
}

/// One MeSH heading: descriptor text plus its major-topic flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshHeading {
    /// Descriptor text
    pub descriptor: String,
    /// Whether the descriptor is flagged as a major topic
    pub major_topic: bool,
}

/// One section of a book record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSection {
    /// Section title
    pub title: Option<String>,
    /// Location label (chapter number etc.)
    pub location_label: Option<String>,
}

/// Best-effort publication date
///
/// Either a full calendar date, or the free-text form upstream reported
/// when no calendar date could be derived (MedlineDate, year + season).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicationDate {
    /// A resolved calendar date
    Date(Date),
    /// Free-text fallback, preserved unchanged
    Text(String),
}

impl fmt::Display for PublicationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // time::Date renders ISO calendar form (2020-01-01)
            PublicationDate::Date(date) => write!(f, "{date}"),
            PublicationDate::Text(text) => write!(f, "{text}"),
        }
    }
}

impl Serialize for PublicationDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl PublicationDate {
    /// The calendar date, when this is not a free-text fallback
    pub fn as_date(&self) -> Option<Date> {
        match self {
            PublicationDate::Date(date) => Some(*date),
            PublicationDate::Text(_) => None,
        }
    }

    /// The free-text form, when no calendar date was derived
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PublicationDate::Date(_) => None,
            PublicationDate::Text(text) => Some(text),
        }
    }
}
