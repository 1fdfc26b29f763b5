//! Per-primary JSON report.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use ecl_model::{ComparisonRecord, Concept, LoincCode, Metrics, QueryFailure, ResultSet};

/// The full analysis record for one primary LOINC code.
///
/// Everything a reviewer needs to audit a run: every rendered ECL, the raw
/// concept lists, the mapped codes and the metrics against the reference.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub primary_loinc: LoincCode,
    /// Human-readable analyte name, e.g. "hemoglobin".
    pub name: String,
    /// RFC 3339 generation timestamp.
    pub generated_at: String,
    /// Backend label ("snowstorm" or "ontoserver").
    pub server: String,
    pub reference_name: String,
    pub reference_codes: Vec<LoincCode>,
    pub experiments: Vec<ExperimentOutcome>,
}

/// One experiment's slice of the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentOutcome {
    pub experiment: String,
    pub ecl: String,
    pub snomed_concept_count: usize,
    pub concepts: Vec<Concept>,
    pub loinc_codes: Vec<LoincCode>,
    pub execution_ms: u64,
    pub metrics: Option<Metrics>,
    pub failure: Option<QueryFailure>,
}

impl ExperimentOutcome {
    /// Join an executed result set with its comparison record.
    #[must_use]
    pub fn new(result: &ResultSet, comparison: ComparisonRecord) -> Self {
        Self {
            experiment: result.experiment.clone(),
            ecl: result.ecl.clone(),
            snomed_concept_count: result.snomed_concept_count,
            concepts: result.concepts.clone(),
            loinc_codes: result.loinc_codes.iter().cloned().collect(),
            execution_ms: result.execution_ms,
            metrics: comparison.metrics,
            failure: comparison.failure,
        }
    }

    /// A record for an experiment whose query failed; no concepts, no codes.
    #[must_use]
    pub fn failed(comparison: ComparisonRecord) -> Self {
        Self {
            experiment: comparison.experiment,
            ecl: comparison.ecl,
            snomed_concept_count: 0,
            concepts: Vec::new(),
            loinc_codes: Vec::new(),
            execution_ms: 0,
            metrics: None,
            failure: comparison.failure,
        }
    }
}

impl AnalysisReport {
    /// Write the report as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), experiments = self.experiments.len(), "wrote JSON report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecl_model::SnomedId;
    use std::collections::BTreeSet;

    fn sample_report() -> AnalysisReport {
        let result = ResultSet {
            experiment: "fixed_component".to_string(),
            ecl: "<< 363787002 |Observable entity| : 246093002 |Component| = 38082009"
                .to_string(),
            snomed_concept_count: 1,
            concepts: vec![Concept {
                id: SnomedId::new("168331010000106").unwrap(),
                fsn: Some("Hemoglobin in blood (observable entity)".to_string()),
                pt: Some("Hemoglobin in blood".to_string()),
            }],
            loinc_codes: BTreeSet::from([LoincCode::new("718-7").unwrap()]),
            execution_ms: 120,
        };
        let comparison = ComparisonRecord {
            primary_loinc: LoincCode::new("718-7").unwrap(),
            experiment: result.experiment.clone(),
            ecl: result.ecl.clone(),
            result_count: 1,
            reference_count: 3,
            reference_name: "interpolar".to_string(),
            metrics: None,
            failure: None,
        };
        AnalysisReport {
            primary_loinc: LoincCode::new("718-7").unwrap(),
            name: "hemoglobin".to_string(),
            generated_at: "2026-08-30T12:00:00Z".to_string(),
            server: "snowstorm".to_string(),
            reference_name: "interpolar".to_string(),
            reference_codes: vec![LoincCode::new("718-7").unwrap()],
            experiments: vec![ExperimentOutcome::new(&result, comparison)],
        }
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.experiments.len(), 1);
        assert_eq!(back.experiments[0].experiment, "fixed_component");
        assert_eq!(back.experiments[0].loinc_codes.len(), 1);
    }

    #[test]
    fn report_writes_to_disk() {
        let path = std::env::temp_dir().join(format!("ecl-report-{}.json", std::process::id()));
        sample_report().write(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(text.contains("\"primary_loinc\": \"718-7\""));
    }
}
