//! Command entry points.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{error, info};

use ecl_model::LoincCode;
use ecl_query::render;
use ecl_report::{
    AnalysisReport, write_comparison_matrix, write_summary_csv, write_summary_html,
    write_valueset,
};
use ecl_standards::IdentifierTable;

use crate::cli::{AnalyzeArgs, BatchArgs, RenderArgs};
use crate::config::ClientSettings;
use crate::pipeline::{
    AnalysisInputs, PrimaryAnalysis, analyze_primary, catalog_for_primary, parse_specimens,
};
use crate::summary::{print_analysis, print_batch};
use crate::types::{BatchResult, BatchRow, CodeStatus};

pub fn run_analyze(args: &AnalyzeArgs) -> Result<usize> {
    let inputs = AnalysisInputs::load(&args.data).context("load static inputs")?;
    let mut settings = ClientSettings::from_args(&args.server).context("configure client")?;
    let exclude = parse_specimens(&args.exclude_specimens).context("parse exclusions")?;
    let primary = LoincCode::new(&args.primary_loinc).context("parse primary code")?;

    let analysis = analyze_primary(&inputs, &mut settings, &primary, &args.name, &exclude)?;
    write_outputs(&args.output_dir, settings.server.name(), &analysis)?;
    print_analysis(&analysis);
    Ok(analysis.failed_queries)
}

pub fn run_batch(args: &BatchArgs) -> Result<BatchResult> {
    let inputs = AnalysisInputs::load(&args.data).context("load static inputs")?;
    let mut settings = ClientSettings::from_args(&args.server).context("configure client")?;
    let exclude = parse_specimens(&args.exclude_specimens).context("parse exclusions")?;
    let codes = read_code_list(&args.list)?;
    info!(codes = codes.len(), "starting batch run");

    let mut result = BatchResult::default();
    for (primary, name) in codes {
        match analyze_primary(&inputs, &mut settings, &primary, &name, &exclude) {
            Ok(analysis) => {
                write_outputs(&args.output_dir, settings.server.name(), &analysis)?;
                result.rows.push(BatchRow {
                    primary,
                    name,
                    experiments: analysis.records.len(),
                    failed_queries: analysis.failed_queries,
                    status: if analysis.failed_queries == 0 {
                        CodeStatus::Ok
                    } else {
                        CodeStatus::Partial
                    },
                });
                result.failed_queries += analysis.failed_queries;
            }
            Err(err) => {
                // Per-code isolation: log, count, continue with the rest.
                error!(primary = %primary, error = %err, "analysis failed");
                result.rows.push(BatchRow {
                    primary,
                    name,
                    experiments: 0,
                    failed_queries: 0,
                    status: CodeStatus::Failed(err.kind().to_string()),
                });
                result.failed_codes += 1;
            }
        }
    }

    print_batch(&result);
    Ok(result)
}

pub fn run_render(args: &RenderArgs) -> Result<()> {
    let table = IdentifierTable::load(&args.identifier_file).context("load identifier table")?;
    let exclude = parse_specimens(&args.exclude_specimens).context("parse exclusions")?;
    let primary = LoincCode::new(&args.primary_loinc).context("parse primary code")?;

    let (concept, catalog) =
        catalog_for_primary(&table, &args.relationship_file, &primary, &exclude)?;
    println!("{primary} -> SNOMED {concept}");
    for experiment in &catalog {
        let ecl = render(&experiment.spec)?;
        println!("{:<28} {ecl}", experiment.name);
    }
    Ok(())
}

/// Write the four report artifacts for one analyzed primary code.
fn write_outputs(output_dir: &Path, server: &str, analysis: &PrimaryAnalysis) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let prefix = format!("{}_{}", analysis.name, analysis.primary);

    let report = AnalysisReport {
        primary_loinc: analysis.primary.clone(),
        name: analysis.name.clone(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        server: server.to_string(),
        reference_name: analysis.reference.name.clone(),
        reference_codes: analysis.reference.codes.iter().cloned().collect(),
        experiments: analysis.outcomes.clone(),
    };
    report.write(&output_dir.join(format!("{prefix}_report.json")))?;

    write_summary_csv(
        &output_dir.join(format!("{prefix}_summary.csv")),
        &analysis.records,
    )?;
    write_comparison_matrix(
        &output_dir.join(format!("{prefix}_matrix.csv")),
        &analysis.result_columns,
        &analysis.reference,
    )?;
    write_summary_html(
        &output_dir.join(format!("{prefix}_summary.html")),
        &format!("{} ({})", analysis.name, analysis.primary),
        &analysis.records,
    )?;

    // ValueSet of every code any experiment found, with best-effort displays.
    let codes: BTreeMap<LoincCode, Option<String>> = analysis
        .displays
        .iter()
        .map(|(code, display)| (code.clone(), display.clone()))
        .collect();
    write_valueset(
        &output_dir.join(format!("{prefix}_valueset.json")),
        &valueset_name(&analysis.name),
        &format!("{} LOINC codes from ECL analysis", analysis.name),
        &codes,
    )?;
    Ok(())
}

/// FHIR ValueSet.name must match [A-Za-z][A-Za-z0-9_]*.
fn valueset_name(name: &str) -> String {
    let mut out = String::new();
    let mut upper = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if upper {
                out.extend(ch.to_uppercase());
                upper = false;
            } else {
                out.push(ch);
            }
        } else {
            upper = true;
        }
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'V');
    }
    format!("{out}EclCodes")
}

/// Read the batch list: a CSV with `loinc` and `name` columns.
fn read_code_list(path: &Path) -> Result<Vec<(LoincCode, String)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let loinc_idx = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("loinc"))
        .ok_or_else(|| anyhow!("{} has no 'loinc' column", path.display()))?;
    let name_idx = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("name"));

    let mut codes = Vec::new();
    for record in reader.records() {
        let record = record?;
        let code_field = record.get(loinc_idx).unwrap_or("").trim();
        if code_field.is_empty() {
            continue;
        }
        let code = LoincCode::new(code_field)?;
        let name = name_idx
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(|| code.as_str().replace('-', "_"), ToString::to_string);
        codes.push((code, name));
    }
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn valueset_names_are_fhir_safe() {
        assert_eq!(valueset_name("hemoglobin"), "HemoglobinEclCodes");
        assert_eq!(valueset_name("c-reactive protein"), "CReactiveProteinEclCodes");
        assert_eq!(valueset_name("25-oh vitamin d"), "V25OhVitaminDEclCodes");
    }

    #[test]
    fn code_list_reads_loinc_and_name_columns() {
        let path = std::env::temp_dir().join(format!("ecl-batch-{}.csv", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"loinc,name\n718-7,hemoglobin\n2160-0,\n").unwrap();
        drop(file);

        let codes = read_code_list(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].1, "hemoglobin");
        // A missing name falls back to a file-safe form of the code.
        assert_eq!(codes[1].1, "2160_0");
    }
}
