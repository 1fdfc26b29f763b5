//! FHIR ValueSet output for a named LOINC code set.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use ecl_model::LoincCode;

const LOINC_SYSTEM: &str = "http://loinc.org";

/// Write a draft ValueSet containing `codes`, with optional display texts.
///
/// Codes are emitted in sorted order; a missing display falls back to
/// "LOINC {code}" so downstream FHIR tooling always sees one.
pub fn write_valueset(
    path: &Path,
    name: &str,
    title: &str,
    codes: &BTreeMap<LoincCode, Option<String>>,
) -> Result<()> {
    let concepts: Vec<serde_json::Value> = codes
        .iter()
        .map(|(code, display)| {
            json!({
                "code": code.as_str(),
                "display": display
                    .clone()
                    .unwrap_or_else(|| format!("LOINC {}", code.as_str())),
            })
        })
        .collect();

    let valueset = json!({
        "resourceType": "ValueSet",
        "name": name,
        "title": title,
        "status": "draft",
        "experimental": true,
        "date": chrono::Utc::now().format("%Y-%m-%d").to_string(),
        "compose": {
            "include": [{
                "system": LOINC_SYSTEM,
                "concept": concepts,
            }]
        }
    });

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &valueset)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), concepts = codes.len(), "wrote ValueSet");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valueset_contains_sorted_concepts() {
        let mut codes = BTreeMap::new();
        codes.insert(
            LoincCode::new("718-7").unwrap(),
            Some("Hemoglobin [Mass/volume] in Blood".to_string()),
        );
        codes.insert(LoincCode::new("20509-6").unwrap(), None);

        let path = std::env::temp_dir().join(format!("ecl-valueset-{}.json", std::process::id()));
        write_valueset(&path, "HemoglobinEcl", "Hemoglobin codes", &codes).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["resourceType"], "ValueSet");
        let concepts = parsed["compose"]["include"][0]["concept"].as_array().unwrap();
        // BTreeMap order: "20509-6" < "718-7".
        assert_eq!(concepts[0]["code"], "20509-6");
        assert_eq!(concepts[0]["display"], "LOINC 20509-6");
        assert_eq!(concepts[1]["code"], "718-7");
        assert_eq!(parsed["compose"]["include"][0]["system"], "http://loinc.org");
    }
}
