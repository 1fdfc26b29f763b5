use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::LoincCode;

/// An expert-curated set of comparable LOINC codes for one primary code.
///
/// Loaded once per run from a static input file and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSet {
    /// Source name, e.g. "interpolar" or "top300".
    pub name: String,
    pub primary: LoincCode,
    pub codes: BTreeSet<LoincCode>,
}

impl ReferenceSet {
    pub fn new(name: impl Into<String>, primary: LoincCode) -> Self {
        let mut codes = BTreeSet::new();
        // The primary code belongs to its own comparable group.
        codes.insert(primary.clone());
        Self {
            name: name.into(),
            primary,
            codes,
        }
    }

    pub fn insert(&mut self, code: LoincCode) {
        self.codes.insert(code);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, code: &LoincCode) -> bool {
        self.codes.contains(code)
    }
}
