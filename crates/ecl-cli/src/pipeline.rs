//! The per-primary analysis pipeline: map, discover, render, execute,
//! compare. Query failures are isolated per experiment; only configuration
//! and data-load problems abort the analysis of a primary code.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, info_span, warn};

use ecl_compare::build_record;
use ecl_model::{
    Component, ComparisonRecord, LoincCode, QueryFailure, ReferenceSet, Result, ResultSet,
    SnomedId, TermError,
};
use ecl_query::{Experiment, experiment_catalog, render};
use ecl_report::ExperimentOutcome;
use ecl_standards::{
    IdentifierTable, discover_attributes, interpolar_reference, load_interpolar_groups,
};

use crate::cli::DataArgs;
use crate::config::ClientSettings;

/// Static inputs loaded once per run and shared across all primary codes.
pub struct AnalysisInputs {
    pub table: IdentifierTable,
    pub groups: BTreeMap<LoincCode, ReferenceSet>,
    pub relationship_file: PathBuf,
}

impl AnalysisInputs {
    pub fn load(data: &DataArgs) -> Result<Self> {
        Ok(Self {
            table: IdentifierTable::load(&data.identifier_file)?,
            groups: load_interpolar_groups(&data.interpolar_file)?,
            relationship_file: data.relationship_file.clone(),
        })
    }
}

/// Everything produced by analyzing one primary code, ready for the report
/// writers.
pub struct PrimaryAnalysis {
    pub primary: LoincCode,
    pub name: String,
    pub reference: ReferenceSet,
    pub records: Vec<ComparisonRecord>,
    pub outcomes: Vec<ExperimentOutcome>,
    /// Per-experiment mapped code sets, in catalog order, for the matrix.
    pub result_columns: Vec<(String, BTreeSet<LoincCode>)>,
    /// Display text per code, taken from the preferred term of the mapped
    /// concept that contributed it.
    pub displays: BTreeMap<LoincCode, Option<String>>,
    pub failed_queries: usize,
}

/// Parse the `--exclude-specimens` values into typed IDs.
pub fn parse_specimens(values: &[String]) -> Result<Vec<SnomedId>> {
    values.iter().map(|v| SnomedId::new(v)).collect()
}

/// Build the experiment catalog for a primary code without touching the
/// network. Shared by `analyze` and `render`.
pub fn catalog_for_primary(
    table: &IdentifierTable,
    relationship_file: &std::path::Path,
    primary: &LoincCode,
    exclude_specimens: &[SnomedId],
) -> Result<(SnomedId, Vec<Experiment>)> {
    let concept = table.snomed_for(primary).ok_or_else(|| {
        TermError::Configuration(format!("no SNOMED concept mapped to LOINC {primary}"))
    })?;
    let attributes = discover_attributes(relationship_file, concept)?;
    let catalog = experiment_catalog(concept, &attributes, exclude_specimens)?;
    Ok((concept.clone(), catalog))
}

/// Run the full pipeline for one primary code.
pub fn analyze_primary(
    inputs: &AnalysisInputs,
    settings: &mut ClientSettings,
    primary: &LoincCode,
    name: &str,
    exclude_specimens: &[SnomedId],
) -> Result<PrimaryAnalysis> {
    let span = info_span!("analyze", primary = %primary, name);
    let _guard = span.enter();

    let (concept, catalog) = catalog_for_primary(
        &inputs.table,
        &inputs.relationship_file,
        primary,
        exclude_specimens,
    )?;
    let reference = interpolar_reference(&inputs.groups, primary);
    info!(
        concept = %concept,
        experiments = catalog.len(),
        reference_codes = reference.len(),
        "starting analysis"
    );

    let mut analysis = PrimaryAnalysis {
        primary: primary.clone(),
        name: name.to_string(),
        reference: reference.clone(),
        records: Vec::new(),
        outcomes: Vec::new(),
        result_columns: Vec::new(),
        displays: BTreeMap::new(),
        failed_queries: 0,
    };

    for experiment in &catalog {
        match run_experiment(inputs, settings, experiment) {
            Ok(result) => {
                for matched in &result.concepts {
                    for code in inputs.table.loinc_for(&matched.id) {
                        analysis
                            .displays
                            .entry(code.clone())
                            .or_insert_with(|| matched.pt.clone());
                    }
                }
                analysis
                    .result_columns
                    .push((result.experiment.clone(), result.loinc_codes.clone()));
                let record = build_record(&result, &reference);
                analysis
                    .outcomes
                    .push(ExperimentOutcome::new(&result, record.clone()));
                analysis.records.push(record);
            }
            Err((component, error)) => {
                warn!(
                    experiment = experiment.name,
                    component = component.name(),
                    error = %error,
                    "query failed"
                );
                analysis.failed_queries += 1;
                let record = failed_record(primary, &reference, experiment, component, &error);
                analysis.outcomes.push(ExperimentOutcome::failed(record.clone()));
                analysis.records.push(record);
            }
        }
    }

    info!(
        experiments = analysis.records.len(),
        failed = analysis.failed_queries,
        "analysis complete"
    );
    Ok(analysis)
}

/// Render and execute one experiment, attributing any failure to the
/// component that raised it.
fn run_experiment(
    inputs: &AnalysisInputs,
    settings: &mut ClientSettings,
    experiment: &Experiment,
) -> std::result::Result<ResultSet, (Component, TermError)> {
    let ecl = render(&experiment.spec).map_err(|e| (Component::QueryBuilder, e))?;

    settings.pacer.pace();
    let started = Instant::now();
    let server = &settings.server;
    let limit = settings.limit;
    let expansion = settings
        .retry
        .execute(experiment.name, || server.expand(&ecl, limit))
        .map_err(|e| (Component::Client, e))?;
    let execution_ms = started.elapsed().as_millis() as u64;

    let loinc_codes = inputs
        .table
        .map_concepts(expansion.concepts.iter().map(|c| &c.id));
    info!(
        experiment = experiment.name,
        matches = expansion.total,
        mapped = loinc_codes.len(),
        execution_ms,
        "experiment executed"
    );

    Ok(ResultSet {
        experiment: experiment.name.to_string(),
        ecl,
        snomed_concept_count: expansion.total,
        concepts: expansion.concepts,
        loinc_codes,
        execution_ms,
    })
}

fn failed_record(
    primary: &LoincCode,
    reference: &ReferenceSet,
    experiment: &Experiment,
    component: Component,
    error: &TermError,
) -> ComparisonRecord {
    // A failed render has no ECL to report; re-rendering may fail again.
    let ecl = render(&experiment.spec).unwrap_or_default();
    ComparisonRecord {
        primary_loinc: primary.clone(),
        experiment: experiment.name.to_string(),
        ecl,
        result_count: 0,
        reference_count: reference.len(),
        reference_name: reference.name.clone(),
        metrics: None,
        failure: Some(QueryFailure::new(component, error)),
    }
}
