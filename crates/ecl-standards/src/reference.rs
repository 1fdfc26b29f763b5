//! Reference set loaders.
//!
//! Two curated sources are supported: the Interpolar comparability mapping
//! (one row per primary/secondary LOINC pair with a comparability class) and
//! the "Top 300" list of frequently used codes. Both are CSV exports of the
//! original spreadsheets; spreadsheet parsing itself is out of scope.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use csv::ReaderBuilder;
use tracing::info;

use ecl_model::{LoincCode, ReferenceSet, Result};

use crate::identifier::data_load;

/// Only rows in this comparability class count as comparable codes.
const QUANTITATIVE: &str = "1 - quantitativ";

const COL_PRIMARY: &str = "LOINC_PRIMARY";
const COL_LOINC: &str = "LOINC";
const COL_COMPARABILITY: &str = "COMPARABILITY_TO_LOINC_PRIMARY";

/// All Interpolar comparable-code groups, keyed by primary LOINC code.
///
/// Each group always contains its own primary code. Loaded once per run and
/// read-only afterwards.
pub fn load_interpolar_groups(path: &Path) -> Result<BTreeMap<LoincCode, ReferenceSet>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| data_load(path, &e))?;

    let headers = reader
        .headers()
        .map_err(|e| data_load(path, &e))?
        .clone();
    let primary_idx = column_index(&headers, COL_PRIMARY)
        .ok_or_else(|| data_load(path, &format!("missing column {COL_PRIMARY}")))?;
    let loinc_idx = column_index(&headers, COL_LOINC)
        .ok_or_else(|| data_load(path, &format!("missing column {COL_LOINC}")))?;
    let comparability_idx = column_index(&headers, COL_COMPARABILITY)
        .ok_or_else(|| data_load(path, &format!("missing column {COL_COMPARABILITY}")))?;

    let mut groups: BTreeMap<LoincCode, ReferenceSet> = BTreeMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| data_load(path, &e))?;
        if record.get(comparability_idx).map(str::trim) != Some(QUANTITATIVE) {
            continue;
        }
        let primary_field = record.get(primary_idx).unwrap_or("").trim();
        let loinc_field = record.get(loinc_idx).unwrap_or("").trim();
        if primary_field.is_empty() || loinc_field.is_empty() {
            continue;
        }
        let primary = LoincCode::new(primary_field).map_err(|e| data_load(path, &e))?;
        let code = LoincCode::new(loinc_field).map_err(|e| data_load(path, &e))?;

        groups
            .entry(primary.clone())
            .or_insert_with(|| ReferenceSet::new("interpolar", primary))
            .insert(code);
    }

    info!(path = %path.display(), groups = groups.len(), "loaded interpolar reference");
    Ok(groups)
}

/// The Interpolar reference set for one primary code.
///
/// A primary with no mapped rows still gets a singleton set containing
/// itself, mirroring how the curated groups are defined.
pub fn interpolar_reference(
    groups: &BTreeMap<LoincCode, ReferenceSet>,
    primary: &LoincCode,
) -> ReferenceSet {
    groups
        .get(primary)
        .cloned()
        .unwrap_or_else(|| ReferenceSet::new("interpolar", primary.clone()))
}

/// Load the Top 300 list: the union of its primary and secondary columns.
pub fn load_top300(path: &Path) -> Result<BTreeSet<LoincCode>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| data_load(path, &e))?;

    let headers = reader
        .headers()
        .map_err(|e| data_load(path, &e))?
        .clone();
    let primary_idx = column_index(&headers, "primär")
        .or_else(|| column_index(&headers, "primary"))
        .ok_or_else(|| data_load(path, &"missing primary column"))?;
    let secondary_idx =
        column_index(&headers, "sekundär").or_else(|| column_index(&headers, "secondary"));

    let mut codes = BTreeSet::new();
    for record in reader.records() {
        let record = record.map_err(|e| data_load(path, &e))?;
        for idx in [Some(primary_idx), secondary_idx].into_iter().flatten() {
            let field = record.get(idx).unwrap_or("").trim();
            if !field.is_empty() {
                codes.insert(LoincCode::new(field).map_err(|e| data_load(path, &e))?);
            }
        }
    }

    info!(path = %path.display(), codes = codes.len(), "loaded top300 list");
    Ok(codes)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(name: &str, content: &str) -> std::path::PathBuf {
        let path =
            std::env::temp_dir().join(format!("ecl-reference-{}-{name}", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn groups_quantitative_rows_by_primary() {
        let path = write_fixture(
            "interpolar",
            "LOINC_PRIMARY,LOINC,COMPARABILITY_TO_LOINC_PRIMARY\n\
             718-7,59260-0,1 - quantitativ\n\
             718-7,20509-6,1 - quantitativ\n\
             718-7,30313-1,2 - semiquantitativ\n\
             26453-1,789-8,1 - quantitativ\n",
        );
        let groups = load_interpolar_groups(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let primary = LoincCode::new("718-7").unwrap();
        let set = interpolar_reference(&groups, &primary);
        // Primary itself plus the two quantitative secondaries.
        assert_eq!(set.len(), 3);
        assert!(set.contains(&primary));
        assert!(set.contains(&LoincCode::new("59260-0").unwrap()));
        assert!(!set.contains(&LoincCode::new("30313-1").unwrap()));
    }

    #[test]
    fn unknown_primary_yields_singleton() {
        let groups = BTreeMap::new();
        let primary = LoincCode::new("4548-4").unwrap();
        let set = interpolar_reference(&groups, &primary);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&primary));
    }

    #[test]
    fn top300_unions_both_columns() {
        let path = write_fixture(
            "top300",
            "primär,sekundär\n718-7,59260-0\n26453-1,\n",
        );
        let codes = load_top300(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(codes.len(), 3);
        assert!(codes.contains(&LoincCode::new("59260-0").unwrap()));
    }
}
