//! The public LOINCSNOMED Snowstorm backend.

use std::time::Duration;

use ecl_model::{Concept, Expansion, Result, SnomedId};
use serde::Deserialize;
use tracing::debug;

use crate::TerminologyServer;
use crate::transport::{DEFAULT_TIMEOUT, build_client, decode_error, status_error, transport_error};

pub const DEFAULT_BASE_URL: &str = "http://browser.loincsnomed.org/snowstorm/snomed-ct";
pub const DEFAULT_BRANCH: &str = "MAIN/LOINC/2025-09-21";

/// Client for a Snowstorm instance carrying the LOINC extension.
///
/// Uses the native Snowstorm REST API, not the FHIR facade, because the
/// native concept endpoints return FSN and PT in one round trip.
#[derive(Debug)]
pub struct SnowstormServer {
    client: reqwest::blocking::Client,
    base_url: String,
    branch: String,
}

impl SnowstormServer {
    pub fn new(base_url: &str, branch: &str, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout.unwrap_or(DEFAULT_TIMEOUT), None)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            branch: branch.trim_matches('/').to_string(),
        })
    }

    /// The public LOINCSNOMED browser instance.
    pub fn public() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL, DEFAULT_BRANCH, None)
    }
}

#[derive(Debug, Deserialize)]
struct ConceptsPage {
    #[serde(default)]
    items: Vec<ConceptDto>,
    #[serde(default)]
    total: usize,
}

#[derive(Debug, Deserialize)]
struct ConceptDto {
    #[serde(rename = "conceptId")]
    concept_id: String,
    fsn: Option<TermDto>,
    pt: Option<TermDto>,
}

#[derive(Debug, Deserialize)]
struct TermDto {
    term: String,
}

impl ConceptDto {
    fn into_concept(self, ecl: &str) -> Result<Concept> {
        Ok(Concept {
            id: SnomedId::new(&self.concept_id)
                .map_err(|e| decode_error(format!("bad conceptId: {e}"), ecl))?,
            fsn: self.fsn.map(|t| t.term),
            pt: self.pt.map(|t| t.term),
        })
    }
}

impl TerminologyServer for SnowstormServer {
    fn name(&self) -> &'static str {
        "snowstorm"
    }

    fn expand(&self, ecl: &str, limit: usize) -> Result<Expansion> {
        let url = format!("{}/{}/concepts", self.base_url, self.branch);
        debug!(%url, ecl, limit, "expand");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ecl", ecl),
                ("limit", &limit.to_string()),
                ("activeFilter", "true"),
            ])
            .send()
            .map_err(|e| transport_error(&e, ecl))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status.as_u16(), body, ecl));
        }

        let page: ConceptsPage = response.json().map_err(|e| decode_error(e, ecl))?;
        let concepts = page
            .items
            .into_iter()
            .map(|dto| dto.into_concept(ecl))
            .collect::<Result<Vec<_>>>()?;
        Ok(Expansion {
            total: page.total,
            concepts,
        })
    }

    fn lookup(&self, concept_id: &SnomedId) -> Result<Concept> {
        let url = format!("{}/{}/concepts/{}", self.base_url, self.branch, concept_id);
        debug!(%url, "lookup");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| transport_error(&e, ""))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status.as_u16(), body, ""));
        }

        let dto: ConceptDto = response.json().map_err(|e| decode_error(e, ""))?;
        dto.into_concept("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_concepts_page() {
        let json = r#"{
            "items": [
                {"conceptId": "168331010000106",
                 "fsn": {"term": "Hemoglobin in blood (observable entity)", "lang": "en"},
                 "pt": {"term": "Hemoglobin in blood", "lang": "en"}},
                {"conceptId": "723525010000109",
                 "pt": {"term": "Erythrocyte count"}}
            ],
            "total": 42,
            "limit": 1000,
            "offset": 0
        }"#;
        let page: ConceptsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.total, 42);

        let concepts: Vec<Concept> = page
            .items
            .into_iter()
            .map(|dto| dto.into_concept("").unwrap())
            .collect();
        assert_eq!(concepts[0].display(), "Hemoglobin in blood");
        assert_eq!(concepts[1].fsn, None);
        assert_eq!(concepts[1].display(), "Erythrocyte count");
    }

    #[test]
    fn empty_page_decodes_with_defaults() {
        let page: ConceptsPage = serde_json::from_str("{}").unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }
}
