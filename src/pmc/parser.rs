use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use time::{Date, Month};
use tracing::{debug, warn};

use crate::error::{PubMedError, Result};
use crate::pmc::models::{PmcArticle, PmcAuthor, PmcJournal};

/// Decode every JATS `article` element in an efetch document
///
/// Extraction is per-field tolerant; an article without a title is
/// dropped with a warning rather than failing the document.
pub fn parse_articles_from_xml(xml: &str) -> Result<Vec<PmcArticle>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<ArticleAccumulator> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if tag == "article" {
                    current = Some(ArticleAccumulator::default());
                } else if let Some(acc) = current.as_mut() {
                    acc.enter(&tag, e);
                }
                path.push(tag);
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                path.pop();
                if tag == "article" {
                    if let Some(acc) = current.take() {
                        match acc.finish() {
                            Some(article) => articles.push(article),
                            None => warn!("skipping full-text record without a title"),
                        }
                    }
                } else if let Some(acc) = current.as_mut() {
                    acc.leave(&tag);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(acc), Some(text)) = (current.as_mut(), e.unescape().ok()) {
                    acc.text(&path, text.trim());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(PubMedError::XmlError {
                    message: e.to_string(),
                });
            }
        }
    }

    debug!(articles = articles.len(), "decoded full-text document");
    Ok(articles)
}

fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

#[derive(Default)]
struct DateParts {
    /// Position in the element preference order; `None` for date
    /// elements outside the fallback chain.
    rank: Option<u8>,
    year: Option<String>,
    month: Option<String>,
    day: Option<String>,
}

impl DateParts {
    fn to_date(&self) -> Option<Date> {
        let year: i32 = self.year.as_deref()?.trim().parse().ok()?;
        let month: u8 = self.month.as_deref()?.trim().parse().ok()?;
        let day: u8 = self.day.as_deref()?.trim().parse().ok()?;
        Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
    }
}

#[derive(Default)]
struct ArticleAccumulator {
    pmc_id: Option<String>,
    pmid: Option<String>,
    doi: Option<String>,
    title: String,
    abstract_parts: Vec<String>,
    journal_title: Option<String>,
    publisher: Option<String>,
    authors: Vec<PmcAuthor>,
    dates: Vec<DateParts>,
    current_author: Option<PmcAuthor>,
    current_date: Option<DateParts>,
    current_id_type: Option<String>,
}

impl ArticleAccumulator {
    fn enter(&mut self, tag: &str, e: &BytesStart<'_>) {
        match tag {
            "contrib" if attr(e, "contrib-type").as_deref() == Some("author") => {
                self.current_author = Some(PmcAuthor {
                    surname: None,
                    given_names: None,
                    email: None,
                });
            }
            // Full-text exports carry dates as JATS pub-date elements,
            // PubMed-cased PubMedPubDate history events, or bare PubDate.
            "pub-date" => {
                let rank = (attr(e, "pub-type").as_deref() == Some("pmc-release")).then_some(0);
                self.current_date = Some(DateParts {
                    rank,
                    ..DateParts::default()
                });
            }
            "PubMedPubDate" => {
                let rank = (attr(e, "PubStatus").as_deref() == Some("pubmed")).then_some(1);
                self.current_date = Some(DateParts {
                    rank,
                    ..DateParts::default()
                });
            }
            "PubDate" => {
                self.current_date = Some(DateParts {
                    rank: Some(2),
                    ..DateParts::default()
                });
            }
            "article-id" => {
                self.current_id_type = attr(e, "pub-id-type");
            }
            _ => {}
        }
    }

    fn leave(&mut self, tag: &str) {
        match tag {
            "contrib" => {
                if let Some(author) = self.current_author.take() {
                    self.authors.push(author);
                }
            }
            "pub-date" | "PubMedPubDate" | "PubDate" => {
                if let Some(date) = self.current_date.take() {
                    self.dates.push(date);
                }
            }
            "article-id" => {
                self.current_id_type = None;
            }
            _ => {}
        }
    }

    fn text(&mut self, path: &[String], text: &str) {
        if text.is_empty() {
            return;
        }
        let tag = path.last().map(String::as_str).unwrap_or("");

        // Date children come in both lowercase JATS and capitalized
        // PubMed casing depending on the export.
        if let Some(date) = self.current_date.as_mut() {
            if tag.eq_ignore_ascii_case("year") {
                date.year = Some(text.to_string());
            } else if tag.eq_ignore_ascii_case("month") {
                date.month = Some(text.to_string());
            } else if tag.eq_ignore_ascii_case("day") {
                date.day = Some(text.to_string());
            }
            return;
        }

        if let Some(author) = self.current_author.as_mut() {
            match tag {
                "surname" => author.surname = Some(text.to_string()),
                "given-names" => author.given_names = Some(text.to_string()),
                "email" => author.email = Some(text.to_string()),
                _ => {}
            }
            return;
        }

        match tag {
            "article-title" if path.iter().any(|t| t == "title-group") => {
                if !self.title.is_empty() {
                    self.title.push(' ');
                }
                self.title.push_str(text);
            }
            "journal-title" => self.journal_title = Some(text.to_string()),
            "publisher-name" => self.publisher = Some(text.to_string()),
            "article-id" => match self.current_id_type.as_deref() {
                Some("pmc") => self.pmc_id = Some(text.to_string()),
                Some("pmid") => self.pmid = Some(text.to_string()),
                Some("doi") => self.doi = Some(text.to_string()),
                _ => {}
            },
            _ => {
                if path.iter().any(|t| t == "abstract") {
                    self.abstract_parts.push(text.to_string());
                }
            }
        }
    }

    /// Element preference: `pub-date[@pub-type="pmc-release"]`, then
    /// `PubMedPubDate[@PubStatus="pubmed"]`, then `PubDate`. A candidate
    /// counts only with year, month, and day all present and numeric.
    fn resolve_date(&self) -> Option<Date> {
        (0..=2u8)
            .flat_map(|rank| self.dates.iter().filter(move |d| d.rank == Some(rank)))
            .find_map(DateParts::to_date)
    }

    fn finish(self) -> Option<PmcArticle> {
        if self.title.is_empty() {
            return None;
        }
        let publication_date = self.resolve_date();
        let journal = if self.journal_title.is_some() || self.publisher.is_some() {
            Some(PmcJournal {
                title: self.journal_title,
                publisher: self.publisher,
            })
        } else {
            None
        };
        let abstract_text = if self.abstract_parts.is_empty() {
            None
        } else {
            Some(self.abstract_parts.join(" "))
        };
        Some(PmcArticle {
            pmc_id: self.pmc_id,
            pmid: self.pmid,
            doi: self.doi,
            title: self.title,
            abstract_text,
            journal,
            authors: self.authors,
            publication_date,
        })
    }
}
