//! The LOINC/SNOMED identifier table.
//!
//! Loaded once from the RF2 identifier snapshot distributed with the
//! LOINCSNOMED extension (`sct2_Identifier_Snapshot_*.txt`), where each
//! active row couples an alternate identifier (the LOINC code) to a SNOMED
//! concept. The mapping is many-to-many in general; a concept with no LOINC
//! row simply never contributes a code.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use csv::ReaderBuilder;
use tracing::info;

use ecl_model::{LoincCode, Result, SnomedId, TermError};

/// Immutable after load; shared by reference across the whole run.
#[derive(Debug, Clone, Default)]
pub struct IdentifierTable {
    snomed_to_loinc: BTreeMap<SnomedId, Vec<LoincCode>>,
    loinc_to_snomed: BTreeMap<LoincCode, SnomedId>,
}

impl IdentifierTable {
    /// Load the table from an RF2 identifier snapshot TSV.
    ///
    /// # Errors
    ///
    /// Any missing file or malformed row is a [`TermError::DataLoad`]: no
    /// meaningful downstream computation is possible without the table.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .quoting(false)
            .from_path(path)
            .map_err(|e| data_load(path, &e))?;

        let mut table = Self::default();
        for record in reader.records() {
            let record = record.map_err(|e| data_load(path, &e))?;
            let active = record.get(2).unwrap_or("");
            if active != "1" {
                continue;
            }
            let loinc_field = record.get(0).unwrap_or("");
            let concept_field = record.get(5).ok_or_else(|| {
                data_load(path, &"identifier row has no referencedComponentId column")
            })?;

            let loinc = LoincCode::new(loinc_field).map_err(|e| data_load(path, &e))?;
            let concept = SnomedId::new(concept_field).map_err(|e| data_load(path, &e))?;

            table
                .snomed_to_loinc
                .entry(concept.clone())
                .or_default()
                .push(loinc.clone());
            table.loinc_to_snomed.entry(loinc).or_insert(concept);
        }

        info!(
            path = %path.display(),
            concepts = table.snomed_to_loinc.len(),
            "loaded identifier table"
        );
        Ok(table)
    }

    /// Number of SNOMED concepts with at least one LOINC mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snomed_to_loinc.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snomed_to_loinc.is_empty()
    }

    /// LOINC codes mapped to one concept, if any.
    #[must_use]
    pub fn loinc_for(&self, concept: &SnomedId) -> &[LoincCode] {
        self.snomed_to_loinc
            .get(concept)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The SNOMED concept behind a LOINC code.
    #[must_use]
    pub fn snomed_for(&self, code: &LoincCode) -> Option<&SnomedId> {
        self.loinc_to_snomed.get(code)
    }

    /// Map a set of matched concepts to the deduplicated set of LOINC codes.
    ///
    /// Concepts without a mapping are silently dropped; that is expected,
    /// since not every SNOMED concept has a LOINC counterpart.
    pub fn map_concepts<'a, I>(&self, concepts: I) -> BTreeSet<LoincCode>
    where
        I: IntoIterator<Item = &'a SnomedId>,
    {
        let mut codes = BTreeSet::new();
        for concept in concepts {
            codes.extend(self.loinc_for(concept).iter().cloned());
        }
        codes
    }

    /// Build a table directly from pairs; used by tests and tooling.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (SnomedId, LoincCode)>,
    {
        let mut table = Self::default();
        for (concept, loinc) in pairs {
            table
                .snomed_to_loinc
                .entry(concept.clone())
                .or_default()
                .push(loinc.clone());
            table.loinc_to_snomed.entry(loinc).or_insert(concept);
        }
        table
    }
}

pub(crate) fn data_load(path: &Path, message: &dyn std::fmt::Display) -> TermError {
    TermError::DataLoad {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}
