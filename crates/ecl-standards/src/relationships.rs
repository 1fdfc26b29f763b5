//! Attribute discovery from the RF2 relationship snapshot.
//!
//! Scans `sct2_Relationship_Snapshot_*.txt` for active rows whose source is
//! the concept of interest and whose type is one of the defining attributes
//! (Component, Property, Direct site). This is the local-file counterpart of
//! the server-side lookup operation and is the preferred source because it
//! costs no network calls.

use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use ecl_model::{Attribute, DiscoveredAttributes, Result, SnomedId};

use crate::identifier::data_load;

// RF2 relationship snapshot column positions.
const COL_ACTIVE: usize = 2;
const COL_SOURCE: usize = 4;
const COL_DESTINATION: usize = 5;
const COL_TYPE: usize = 7;

/// Extract the defining attribute bindings for one concept.
///
/// Missing attributes are simply absent in the result; pre-coordinated
/// concepts have none and fall back to descendant queries.
pub fn discover_attributes(path: &Path, concept: &SnomedId) -> Result<DiscoveredAttributes> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .from_path(path)
        .map_err(|e| data_load(path, &e))?;

    let mut attributes = DiscoveredAttributes::default();
    for record in reader.records() {
        let record = record.map_err(|e| data_load(path, &e))?;
        if record.get(COL_ACTIVE) != Some("1") {
            continue;
        }
        if record.get(COL_SOURCE) != Some(concept.as_str()) {
            continue;
        }
        let Some(type_id) = record.get(COL_TYPE) else {
            continue;
        };
        let Some(destination) = record.get(COL_DESTINATION) else {
            continue;
        };
        let target = SnomedId::new(destination).map_err(|e| data_load(path, &e))?;
        match Attribute::from_concept_id(type_id) {
            Some(Attribute::Component) => attributes.component = Some(target),
            Some(Attribute::Property) => attributes.property = Some(target),
            Some(Attribute::DirectSite) => attributes.direct_site = Some(target),
            _ => {}
        }
    }

    debug!(
        concept = %concept,
        component = ?attributes.component,
        property = ?attributes.property,
        direct_site = ?attributes.direct_site,
        "discovered attributes"
    );
    Ok(attributes)
}
