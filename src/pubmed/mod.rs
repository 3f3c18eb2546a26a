//! PubMed search and retrieval
//!
//! Two-phase access to the PubMed database: esearch collects matching
//! PMIDs page by page, efetch turns them into typed records batch by
//! batch. [`PubMedClient::query`] combines both behind a lazy stream.

mod client;
mod models;
mod parser;
pub(crate) mod responses;

pub use client::PubMedClient;
pub use models::{
    Author, BookSection, MeshHeading, PubMedArticle, PubMedBookArticle, PubMedRecord,
    PublicationDate,
};
pub use parser::parse_records_from_xml;
