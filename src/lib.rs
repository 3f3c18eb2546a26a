//! Client library for the NCBI Entrez E-utilities
//!
//! Retrieves bibliographic records from PubMed and full-text articles
//! from PubMed Central, staying inside the NCBI request ceiling through
//! a built-in sliding-window rate limiter.
//!
//! # Example
//!
//! ```no_run
//! use entrez_client::{ClientConfig, PubMedClient};
//! use futures_util::StreamExt;
//!
//! # async fn example() -> entrez_client::Result<()> {
//! let config = ClientConfig::new()
//!     .with_tool("my-pipeline")
//!     .with_email("curator@example.org");
//! let client = PubMedClient::with_config(config);
//!
//! let mut records = std::pin::pin!(client.query("crispr cas9", Some(100)).await?);
//! while let Some(record) = records.next().await {
//!     let record = record?;
//!     println!("{}: {:?}", record.pmid(), record.title());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pmc;
pub mod pubmed;
pub mod rate_limit;

pub use config::ClientConfig;
pub use error::{PubMedError, Result};
pub use pmc::{PmcArticle, PmcAuthor, PmcClient, PmcJournal};
pub use pubmed::{
    Author, BookSection, MeshHeading, PubMedArticle, PubMedBookArticle, PubMedClient,
    PubMedRecord, PublicationDate,
};
pub use rate_limit::RateLimiter;
