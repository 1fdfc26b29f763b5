//! End-of-run console tables.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use ecl_compare::mean_metrics;

use crate::pipeline::PrimaryAnalysis;
use crate::types::{BatchResult, CodeStatus};

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn metric_cell(value: Option<f64>) -> Cell {
    match value {
        Some(v) => Cell::new(format!("{v:.3}")).set_alignment(CellAlignment::Right),
        None => Cell::new("-")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
    }
}

pub fn print_analysis(analysis: &PrimaryAnalysis) {
    println!(
        "Primary: {} ({}), reference \"{}\" with {} codes",
        analysis.primary,
        analysis.name,
        analysis.reference.name,
        analysis.reference.len()
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Experiment"),
        header_cell("Results"),
        header_cell("Overlap"),
        header_cell("Precision"),
        header_cell("Recall"),
        header_cell("F1"),
        header_cell("Status"),
    ]);
    apply_table_style(&mut table);

    for record in &analysis.records {
        let (overlap, precision, recall, f1) = match &record.metrics {
            Some(m) => (
                Cell::new(m.overlap_count).set_alignment(CellAlignment::Right),
                metric_cell(m.precision),
                metric_cell(m.recall),
                metric_cell(m.f1_score),
            ),
            None => (
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
            ),
        };
        let status = match &record.failure {
            Some(failure) => Cell::new(&failure.kind).fg(Color::Red),
            None => Cell::new("ok").fg(Color::Green),
        };
        table.add_row(vec![
            Cell::new(&record.experiment),
            Cell::new(record.result_count).set_alignment(CellAlignment::Right),
            overlap,
            precision,
            recall,
            f1,
            status,
        ]);
    }

    let mean = mean_metrics(&analysis.records);
    table.add_row(vec![
        Cell::new("MEAN")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        metric_cell(mean.precision),
        metric_cell(mean.recall),
        metric_cell(mean.f1_score),
        Cell::new(""),
    ]);

    println!("{table}");
}

pub fn print_batch(result: &BatchResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Primary"),
        header_cell("Name"),
        header_cell("Experiments"),
        header_cell("Failed queries"),
        header_cell("Status"),
    ]);
    apply_table_style(&mut table);

    for row in &result.rows {
        let status = match &row.status {
            CodeStatus::Ok => Cell::new("ok").fg(Color::Green),
            CodeStatus::Partial => Cell::new("partial").fg(Color::Yellow),
            CodeStatus::Failed(kind) => Cell::new(format!("failed: {kind}")).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(row.primary.as_str()),
            Cell::new(&row.name),
            Cell::new(row.experiments).set_alignment(CellAlignment::Right),
            Cell::new(row.failed_queries).set_alignment(CellAlignment::Right),
            status,
        ]);
    }

    println!("{table}");
    println!(
        "{} codes, {} failed, {} failed queries",
        result.rows.len(),
        result.failed_codes,
        result.failed_queries
    );
}
