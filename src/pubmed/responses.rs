use serde::Deserialize;

/// Envelope of an esearch JSON response
#[derive(Debug, Deserialize)]
pub struct ESearchResult {
    pub esearchresult: ESearchData,
}

/// Body of an esearch response
///
/// The endpoint reports its numeric fields as strings; they stay
/// strings here and are parsed at the point of use.
#[derive(Debug, Deserialize)]
pub struct ESearchData {
    #[serde(rename = "ERROR")]
    pub error: Option<String>,
    pub count: Option<String>,
    pub retmax: Option<String>,
    pub retstart: Option<String>,
    #[serde(default)]
    pub idlist: Vec<String>,
}
