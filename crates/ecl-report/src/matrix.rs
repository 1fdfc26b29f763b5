//! Comparison matrix CSV.
//!
//! One row per LOINC code seen anywhere in the run, with a Yes-flag column
//! per experiment, a reference membership flag and the primary marker. Codes
//! found by many approaches sort first, so the consensus block sits at the
//! top of the file.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use ecl_model::{LoincCode, ReferenceSet};

const YES: &str = "Yes";

pub fn write_comparison_matrix(
    path: &Path,
    experiments: &[(String, BTreeSet<LoincCode>)],
    reference: &ReferenceSet,
) -> Result<()> {
    // Union of every result set and the reference.
    let mut all_codes: BTreeSet<&LoincCode> = reference.codes.iter().collect();
    for (_, codes) in experiments {
        all_codes.extend(codes.iter());
    }

    let mut rows: Vec<MatrixRow<'_>> = all_codes
        .into_iter()
        .map(|code| {
            let flags: Vec<bool> = experiments
                .iter()
                .map(|(_, codes)| codes.contains(code))
                .collect();
            let approach_count = flags.iter().filter(|f| **f).count();
            MatrixRow {
                code,
                flags,
                approach_count,
                in_reference: reference.contains(code),
                is_primary: *code == reference.primary,
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.approach_count
            .cmp(&a.approach_count)
            .then_with(|| a.code.cmp(b.code))
    });

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let mut header = vec!["LOINC_Code".to_string()];
    header.extend(experiments.iter().map(|(name, _)| name.clone()));
    header.push("In_Reference".to_string());
    header.push("Is_Primary".to_string());
    header.push("Approach_Count".to_string());
    writer.write_record(&header)?;

    for row in &rows {
        let mut record = vec![row.code.as_str().to_string()];
        record.extend(row.flags.iter().map(|f| flag(*f)));
        record.push(flag(row.in_reference));
        record.push(flag(row.is_primary));
        record.push(row.approach_count.to_string());
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rows = rows.len(), "wrote comparison matrix");
    Ok(())
}

struct MatrixRow<'a> {
    code: &'a LoincCode,
    flags: Vec<bool>,
    approach_count: usize,
    in_reference: bool,
    is_primary: bool,
}

fn flag(set: bool) -> String {
    if set { YES.to_string() } else { String::new() }
}
