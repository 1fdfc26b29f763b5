//! The OntoServer FHIR backend.
//!
//! ECL execution goes through `ValueSet/$expand` against the implicit SNOMED
//! value set, concept details through `CodeSystem/$lookup`. The MII
//! terminology server requires an mTLS client certificate (PKCS#12).

use std::path::PathBuf;
use std::time::Duration;

use ecl_model::{Concept, Expansion, Result, SnomedId, TermError};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::TerminologyServer;
use crate::transport::{DEFAULT_TIMEOUT, build_client, decode_error, status_error, transport_error};

pub const SNOMED_SYSTEM_URL: &str = "http://snomed.info/sct";
pub const DEFAULT_VERSION_URL: &str = "http://snomed.info/sct/11010000107/version/20250921";

/// SNOMED description type ids used in FHIR designations.
const FSN_USE_CODE: &str = "900000000000003001";
const PT_USE_CODE: &str = "900000000000013009";

/// Connection settings for an OntoServer instance.
#[derive(Debug, Clone)]
pub struct OntoServerConfig {
    /// FHIR base, e.g. `https://ontoserver.mii-termserv.de/fhir`.
    pub base_url: String,
    pub code_system_url: String,
    /// Edition/version URL selecting the SNOMED release to query.
    pub version_url: String,
    /// Use POST with a ValueSet body instead of the GET `fhir_vs` form.
    pub use_post: bool,
    /// PKCS#12 bundle with the client certificate, if the server needs mTLS.
    pub pkcs12_path: Option<PathBuf>,
    pub pkcs12_password: Option<String>,
    pub timeout: Option<Duration>,
}

impl OntoServerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            code_system_url: SNOMED_SYSTEM_URL.to_string(),
            version_url: DEFAULT_VERSION_URL.to_string(),
            use_post: false,
            pkcs12_path: None,
            pkcs12_password: None,
            timeout: None,
        }
    }
}

#[derive(Debug)]
pub struct OntoServer {
    client: reqwest::blocking::Client,
    config: OntoServerConfig,
}

impl OntoServer {
    /// Build the client, loading the mTLS identity up front.
    ///
    /// # Errors
    ///
    /// An unreadable or rejected PKCS#12 bundle is [`TermError::Authentication`]
    /// and fatal: there is no point issuing requests that can only get 403s.
    pub fn new(config: OntoServerConfig) -> Result<Self> {
        let identity = match &config.pkcs12_path {
            Some(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    TermError::Authentication(format!(
                        "cannot read client certificate {}: {e}",
                        path.display()
                    ))
                })?;
                let password = config.pkcs12_password.as_deref().unwrap_or("");
                Some(
                    reqwest::Identity::from_pkcs12_der(&bytes, password).map_err(|e| {
                        TermError::Authentication(format!(
                            "cannot load client certificate {}: {e}",
                            path.display()
                        ))
                    })?,
                )
            }
            None => None,
        };

        Ok(Self {
            client: build_client(config.timeout.unwrap_or(DEFAULT_TIMEOUT), identity)?,
            config,
        })
    }

    fn expand_url(&self) -> String {
        format!(
            "{}/ValueSet/$expand",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Deserialize)]
struct ValueSetDto {
    #[serde(default)]
    expansion: ExpansionDto,
}

#[derive(Debug, Default, Deserialize)]
struct ExpansionDto {
    total: Option<usize>,
    #[serde(default)]
    contains: Vec<ContainsDto>,
}

#[derive(Debug, Deserialize)]
struct ContainsDto {
    code: String,
    display: Option<String>,
    #[serde(default)]
    designation: Vec<DesignationDto>,
}

#[derive(Debug, Deserialize)]
struct DesignationDto {
    #[serde(rename = "use")]
    use_coding: Option<UseDto>,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UseDto {
    code: Option<String>,
}

impl ContainsDto {
    fn into_concept(self, ecl: &str) -> Result<Concept> {
        let mut fsn = None;
        let mut pt = None;
        for designation in &self.designation {
            let use_code = designation
                .use_coding
                .as_ref()
                .and_then(|u| u.code.as_deref());
            match use_code {
                Some(FSN_USE_CODE) => fsn = designation.value.clone(),
                Some(PT_USE_CODE) => pt = designation.value.clone(),
                _ => {}
            }
        }
        // The plain display is the preferred term when designations are absent.
        Ok(Concept {
            id: SnomedId::new(&self.code)
                .map_err(|e| decode_error(format!("bad code in expansion: {e}"), ecl))?,
            fsn,
            pt: pt.or(self.display),
        })
    }
}

/// FHIR `Parameters` resource as returned by `$lookup`.
#[derive(Debug, Deserialize)]
struct ParametersDto {
    #[serde(default)]
    parameter: Vec<ParameterDto>,
}

#[derive(Debug, Deserialize)]
struct ParameterDto {
    name: String,
    #[serde(rename = "valueString")]
    value_string: Option<String>,
    #[serde(default)]
    part: Vec<PartDto>,
}

#[derive(Debug, Deserialize)]
struct PartDto {
    name: String,
    #[serde(rename = "valueString")]
    value_string: Option<String>,
    #[serde(rename = "valueCoding")]
    value_coding: Option<UseDto>,
}

impl ParametersDto {
    fn into_concept(self, concept_id: &SnomedId) -> Concept {
        let display = self
            .parameter
            .iter()
            .find(|p| p.name == "display")
            .and_then(|p| p.value_string.clone());

        let mut fsn = None;
        let mut pt = None;
        for parameter in &self.parameter {
            if parameter.name != "designation" {
                continue;
            }
            let use_code = parameter
                .part
                .iter()
                .find(|part| part.name == "use")
                .and_then(|part| part.value_coding.as_ref())
                .and_then(|coding| coding.code.as_deref());
            let value = parameter
                .part
                .iter()
                .find(|part| part.name == "value")
                .and_then(|part| part.value_string.clone());
            match use_code {
                Some(FSN_USE_CODE) => fsn = value,
                Some(PT_USE_CODE) => pt = value,
                _ => {}
            }
        }

        Concept {
            id: concept_id.clone(),
            fsn,
            pt: pt.or(display),
        }
    }
}

impl TerminologyServer for OntoServer {
    fn name(&self) -> &'static str {
        "ontoserver"
    }

    fn expand(&self, ecl: &str, limit: usize) -> Result<Expansion> {
        let url = self.expand_url();
        debug!(%url, ecl, limit, post = self.config.use_post, "expand");

        let request = if self.config.use_post {
            let body = json!({
                "resourceType": "ValueSet",
                "compose": {
                    "include": [{
                        "system": self.config.code_system_url,
                        "version": self.config.version_url,
                        "filter": [{
                            "property": "constraint",
                            "op": "=",
                            "value": ecl
                        }]
                    }]
                }
            });
            self.client
                .post(&url)
                .query(&[("count", limit.to_string())])
                .json(&body)
        } else {
            // Implicit value set form; the query serializer percent-encodes
            // the ECL embedded in the url parameter.
            let fhir_vs = format!("{}?fhir_vs=ecl/{}", self.config.version_url, ecl);
            self.client
                .get(&url)
                .query(&[("url", fhir_vs), ("count", limit.to_string())])
        };

        let response = request.send().map_err(|e| transport_error(&e, ecl))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status.as_u16(), body, ecl));
        }

        let dto: ValueSetDto = response.json().map_err(|e| decode_error(e, ecl))?;
        let concepts = dto
            .expansion
            .contains
            .into_iter()
            .map(|c| c.into_concept(ecl))
            .collect::<Result<Vec<_>>>()?;
        Ok(Expansion {
            total: dto.expansion.total.unwrap_or(concepts.len()),
            concepts,
        })
    }

    fn lookup(&self, concept_id: &SnomedId) -> Result<Concept> {
        let url = format!(
            "{}/CodeSystem/$lookup",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(%url, concept = %concept_id, "lookup");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("system", self.config.code_system_url.as_str()),
                ("code", concept_id.as_str()),
                ("version", self.config.version_url.as_str()),
            ])
            .send()
            .map_err(|e| transport_error(&e, ""))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status.as_u16(), body, ""));
        }

        let dto: ParametersDto = response.json().map_err(|e| decode_error(e, ""))?;
        Ok(dto.into_concept(concept_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_designations_take_precedence_over_display() {
        let json = r#"{
            "resourceType": "ValueSet",
            "expansion": {
                "total": 2,
                "contains": [
                    {"system": "http://snomed.info/sct",
                     "code": "168331010000106",
                     "display": "Hemoglobin in blood",
                     "designation": [
                        {"use": {"system": "http://snomed.info/sct",
                                 "code": "900000000000003001"},
                         "value": "Hemoglobin in blood (observable entity)"},
                        {"use": {"code": "900000000000013009"},
                         "value": "Hemoglobin in blood"}
                     ]},
                    {"code": "723525010000109", "display": "Erythrocyte count"}
                ]
            }
        }"#;
        let dto: ValueSetDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.expansion.total, Some(2));

        let first = dto.expansion.contains.into_iter().next().unwrap();
        let concept = first.into_concept("").unwrap();
        assert_eq!(
            concept.fsn.as_deref(),
            Some("Hemoglobin in blood (observable entity)")
        );
        assert_eq!(concept.pt.as_deref(), Some("Hemoglobin in blood"));
    }

    #[test]
    fn expansion_without_total_counts_contains() {
        let dto: ValueSetDto =
            serde_json::from_str(r#"{"expansion": {"contains": [{"code": "38082009"}]}}"#).unwrap();
        assert_eq!(dto.expansion.total, None);
        let concept = dto
            .expansion
            .contains
            .into_iter()
            .next()
            .unwrap()
            .into_concept("")
            .unwrap();
        // No display, no designations: only the code survives.
        assert_eq!(concept.display(), "38082009");
    }

    #[test]
    fn lookup_parameters_extract_designations() {
        let json = r#"{
            "resourceType": "Parameters",
            "parameter": [
                {"name": "display", "valueString": "Hemoglobin"},
                {"name": "designation", "part": [
                    {"name": "use", "valueCoding": {"code": "900000000000003001"}},
                    {"name": "value", "valueString": "Hemoglobin (substance)"}
                ]}
            ]
        }"#;
        let dto: ParametersDto = serde_json::from_str(json).unwrap();
        let id = SnomedId::new("38082009").unwrap();
        let concept = dto.into_concept(&id);
        assert_eq!(concept.fsn.as_deref(), Some("Hemoglobin (substance)"));
        assert_eq!(concept.pt.as_deref(), Some("Hemoglobin"));
    }

    #[test]
    fn missing_certificate_is_an_authentication_error() {
        let mut config = OntoServerConfig::new("https://ontoserver.example/fhir");
        config.pkcs12_path = Some(PathBuf::from("/nonexistent/client.p12"));
        let err = OntoServer::new(config).unwrap_err();
        assert_eq!(err.kind(), "authentication");
        assert!(!err.is_retryable());
    }
}
