//! PubMed Central full-text retrieval
//!
//! Same two-phase shape as the PubMed side, against the `pmc` database
//! with JATS full-text XML coming back from efetch.

mod client;
mod models;
mod parser;

pub use client::PmcClient;
pub use models::{PmcArticle, PmcAuthor, PmcJournal};
pub use parser::parse_articles_from_xml;
