use serde::Serialize;
use time::Date;

/// A full-text article from PubMed Central
///
/// Records without a title are not produced; everything else is
/// best-effort.
#[derive(Debug, Clone, Serialize)]
pub struct PmcArticle {
    pub pmc_id: Option<String>,
    pub pmid: Option<String>,
    pub doi: Option<String>,
    pub title: String,
    pub abstract_text: Option<String>,
    pub journal: Option<PmcJournal>,
    pub authors: Vec<PmcAuthor>,
    #[serde(with = "crate::pmc::models::iso_date")]
    pub publication_date: Option<Date>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PmcJournal {
    pub title: Option<String>,
    pub publisher: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PmcAuthor {
    pub surname: Option<String>,
    pub given_names: Option<String>,
    pub email: Option<String>,
}

pub(crate) mod iso_date {
    use serde::Serializer;
    use time::Date;

    pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&format!(
                "{:04}-{:02}-{:02}",
                date.year(),
                u8::from(date.month()),
                date.day()
            )),
            None => serializer.serialize_none(),
        }
    }
}
