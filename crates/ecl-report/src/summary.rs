//! Summary CSV: one row per primary code per experiment.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use ecl_model::ComparisonRecord;

/// An undefined metric is an empty cell, never a zero.
fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}

pub fn write_summary_csv(path: &Path, records: &[ComparisonRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record([
        "primary_loinc",
        "experiment",
        "result_count",
        "reference_count",
        "overlap_count",
        "precision",
        "recall",
        "f1_score",
        "status",
    ])?;

    for record in records {
        let (overlap, precision, recall, f1) = match &record.metrics {
            Some(m) => (
                m.overlap_count.to_string(),
                cell(m.precision),
                cell(m.recall),
                cell(m.f1_score),
            ),
            None => (String::new(), String::new(), String::new(), String::new()),
        };
        let status = match &record.failure {
            Some(failure) => format!("failed: {}", failure.kind),
            None => "ok".to_string(),
        };
        writer.write_record([
            record.primary_loinc.as_str(),
            &record.experiment,
            &record.result_count.to_string(),
            &record.reference_count.to_string(),
            &overlap,
            &precision,
            &recall,
            &f1,
            &status,
        ])?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rows = records.len(), "wrote summary CSV");
    Ok(())
}
