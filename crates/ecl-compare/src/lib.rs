//! Set comparison between a query's LOINC result set and an expert-curated
//! reference set.
//!
//! The metric definitions are the technical contract of the whole project:
//! `precision = overlap / |result|`, `recall = overlap / |reference|`,
//! `f1 = 2pr / (p + r)`. A zero denominator makes the metric undefined
//! (`None`), which is distinct from a metric of zero and must stay visible in
//! reports. Code equality is exact string equality; no unit or
//! terminology-version normalization happens here.

use std::collections::BTreeSet;

use ecl_model::{ComparisonRecord, LoincCode, Metrics, ReferenceSet, ResultSet};

/// Compute overlap metrics for one result/reference pair.
///
/// Pure function of its inputs: identical inputs yield identical output.
#[must_use]
pub fn compare(result: &BTreeSet<LoincCode>, reference: &BTreeSet<LoincCode>) -> Metrics {
    let overlap = result.intersection(reference).count();

    let precision = ratio(overlap, result.len());
    let recall = ratio(overlap, reference.len());
    let f1_score = match (precision, recall) {
        (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
        _ => None,
    };

    let result_only_codes: Vec<LoincCode> = result.difference(reference).cloned().collect();
    let reference_only_codes: Vec<LoincCode> = reference.difference(result).cloned().collect();

    Metrics {
        overlap_count: overlap,
        precision,
        recall,
        f1_score,
        // BTreeSet iteration is already lexicographic on the code string.
        result_only_codes,
        reference_only_codes,
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

/// Assemble the report record for one executed experiment.
#[must_use]
pub fn build_record(result: &ResultSet, reference: &ReferenceSet) -> ComparisonRecord {
    let metrics = compare(&result.loinc_codes, &reference.codes);
    ComparisonRecord {
        primary_loinc: reference.primary.clone(),
        experiment: result.experiment.clone(),
        ecl: result.ecl.clone(),
        result_count: result.loinc_codes.len(),
        reference_count: reference.codes.len(),
        reference_name: reference.name.clone(),
        metrics: Some(metrics),
        failure: None,
    }
}

/// Mean of the defined metric values across many records.
///
/// Undefined metrics are skipped, not counted as zero, so a run with many
/// empty result sets does not drag the average down artificially.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanMetrics {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
}

#[must_use]
pub fn mean_metrics<'a, I>(records: I) -> MeanMetrics
where
    I: IntoIterator<Item = &'a ComparisonRecord>,
{
    let mut precision = (0.0, 0usize);
    let mut recall = (0.0, 0usize);
    let mut f1 = (0.0, 0usize);

    for record in records {
        let Some(metrics) = &record.metrics else {
            continue;
        };
        if let Some(p) = metrics.precision {
            precision = (precision.0 + p, precision.1 + 1);
        }
        if let Some(r) = metrics.recall {
            recall = (recall.0 + r, recall.1 + 1);
        }
        if let Some(f) = metrics.f1_score {
            f1 = (f1.0 + f, f1.1 + 1);
        }
    }

    let mean = |(sum, n): (f64, usize)| if n == 0 { None } else { Some(sum / n as f64) };
    MeanMetrics {
        precision: mean(precision),
        recall: mean(recall),
        f1_score: mean(f1),
    }
}
