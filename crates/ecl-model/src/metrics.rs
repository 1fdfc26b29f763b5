use serde::{Deserialize, Serialize};

use crate::error::TermError;
use crate::ids::LoincCode;

/// Set-overlap metrics between a query result and a reference set.
///
/// Precision, recall and F1 are `None` when their denominator is zero.
/// An undefined metric is semantically different from a metric of zero and
/// is serialized as JSON null, never coerced to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub overlap_count: usize,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
    /// Codes in the result set but not the reference, sorted.
    pub result_only_codes: Vec<LoincCode>,
    /// Codes in the reference set but not the result, sorted.
    pub reference_only_codes: Vec<LoincCode>,
}

/// Where in the pipeline a per-query failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    QueryBuilder,
    Client,
    Mapper,
    Comparator,
}

impl Component {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Component::QueryBuilder => "query-builder",
            Component::Client => "client",
            Component::Mapper => "mapper",
            Component::Comparator => "comparator",
        }
    }
}

/// A per-query failure, attributable without inspecting internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryFailure {
    pub component: Component,
    pub kind: String,
    pub message: String,
}

impl QueryFailure {
    pub fn new(component: Component, error: &TermError) -> Self {
        Self {
            component,
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// The comparison outcome for one experiment on one primary LOINC code.
///
/// Immutable once computed; this is the sole artifact written to reports.
/// A failed query yields a record with `failure` set and no metrics, and the
/// batch run continues with the remaining codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub primary_loinc: LoincCode,
    pub experiment: String,
    pub ecl: String,
    pub result_count: usize,
    pub reference_count: usize,
    pub reference_name: String,
    pub metrics: Option<Metrics>,
    pub failure: Option<QueryFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_metrics_serialize_as_null() {
        let metrics = Metrics {
            overlap_count: 0,
            precision: None,
            recall: Some(0.0),
            f1_score: None,
            result_only_codes: vec![],
            reference_only_codes: vec![],
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json["precision"].is_null());
        assert_eq!(json["recall"], 0.0);
        assert!(json["f1_score"].is_null());
    }

    #[test]
    fn failure_captures_component_and_kind() {
        let error = TermError::TransientNetwork("connection refused".to_string());
        let failure = QueryFailure::new(Component::Client, &error);
        assert_eq!(failure.component, Component::Client);
        assert_eq!(failure.kind, "transient-network");
        assert!(failure.message.contains("connection refused"));
    }
}
