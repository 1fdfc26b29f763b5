use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::{LoincCode, SnomedId};

/// One matched concept as returned by a terminology server, converted to a
/// typed record at the client boundary. Internal components never see the
/// raw JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub id: SnomedId,
    /// Fully specified name.
    pub fsn: Option<String>,
    /// Preferred term.
    pub pt: Option<String>,
}

impl Concept {
    /// Best available display text.
    #[must_use]
    pub fn display(&self) -> &str {
        self.pt
            .as_deref()
            .or(self.fsn.as_deref())
            .unwrap_or_else(|| self.id.as_str())
    }
}

/// Raw outcome of one expand call: the matched concepts and the server-side
/// total (which can exceed the returned page when the result-size cap bites).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Expansion {
    pub total: usize,
    pub concepts: Vec<Concept>,
}

/// The outcome of executing one query specification: the matched SNOMED
/// concepts plus the LOINC codes obtained by reverse lookup. Created fresh
/// per execution and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    /// Experiment variant name (e.g. "fixed_component_property").
    pub experiment: String,
    /// The rendered ECL that produced this result.
    pub ecl: String,
    /// Server-side match count.
    pub snomed_concept_count: usize,
    pub concepts: Vec<Concept>,
    pub loinc_codes: BTreeSet<LoincCode>,
    /// Wall-clock execution time of the expand call, in milliseconds.
    pub execution_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefers_pt_over_fsn() {
        let concept = Concept {
            id: SnomedId::new("38082009").unwrap(),
            fsn: Some("Hemoglobin (substance)".to_string()),
            pt: Some("Hemoglobin".to_string()),
        };
        assert_eq!(concept.display(), "Hemoglobin");

        let bare = Concept {
            id: SnomedId::new("38082009").unwrap(),
            fsn: None,
            pt: None,
        };
        assert_eq!(bare.display(), "38082009");
    }
}
