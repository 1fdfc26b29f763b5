//! Minimal static HTML rendering of the summary, for eyeballing a run
//! without loading the CSVs into a spreadsheet.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use ecl_model::ComparisonRecord;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn metric_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        // Visually distinct from 0.000.
        None => "&ndash;".to_string(),
    }
}

#[must_use]
pub fn render_summary_html(title: &str, records: &[ComparisonRecord]) -> String {
    let mut rows = String::new();
    for record in records {
        let (overlap, precision, recall, f1) = match &record.metrics {
            Some(m) => (
                m.overlap_count.to_string(),
                metric_cell(m.precision),
                metric_cell(m.recall),
                metric_cell(m.f1_score),
            ),
            None => (
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ),
        };
        let status = match &record.failure {
            Some(failure) => format!("failed ({})", escape(&failure.kind)),
            None => "ok".to_string(),
        };
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td><code>{}</code></td>\
             <td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(record.primary_loinc.as_str()),
            escape(&record.experiment),
            escape(&record.ecl),
            record.result_count,
            overlap,
            precision,
            recall,
            f1,
            status,
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 2em; }}\n\
         table {{ border-collapse: collapse; }}\n\
         th, td {{ border: 1px solid #ccc; padding: 4px 8px; text-align: left; }}\n\
         th {{ background: #f0f0f0; }}\n\
         code {{ font-size: 0.85em; }}\n\
         </style>\n</head>\n<body>\n<h1>{title}</h1>\n<table>\n\
         <tr><th>Primary</th><th>Experiment</th><th>ECL</th><th>Results</th>\
         <th>Overlap</th><th>Precision</th><th>Recall</th><th>F1</th><th>Status</th></tr>\n\
         {rows}</table>\n</body>\n</html>\n",
        title = escape(title),
        rows = rows,
    )
}

pub fn write_summary_html(path: &Path, title: &str, records: &[ComparisonRecord]) -> Result<()> {
    std::fs::write(path, render_summary_html(title, records))
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rows = records.len(), "wrote HTML summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecl_model::{LoincCode, Metrics};

    #[test]
    fn undefined_metrics_render_as_dash() {
        let record = ComparisonRecord {
            primary_loinc: LoincCode::new("718-7").unwrap(),
            experiment: "descendants_baseline".to_string(),
            ecl: "<< 363787002 |Observable entity|".to_string(),
            result_count: 0,
            reference_count: 3,
            reference_name: "interpolar".to_string(),
            metrics: Some(Metrics {
                overlap_count: 0,
                precision: None,
                recall: Some(0.0),
                f1_score: None,
                result_only_codes: vec![],
                reference_only_codes: vec![],
            }),
            failure: None,
        };
        let html = render_summary_html("Hemoglobin", &[record]);
        assert!(html.contains("<td>&ndash;</td><td>0.000</td><td>&ndash;</td>"));
        assert!(html.contains("&lt;&lt; 363787002"));
    }
}
