//! Report writers.
//!
//! Four artifacts per analysis: the per-primary JSON report, the summary
//! CSV, the comparison matrix CSV and a FHIR ValueSet for the consensus
//! code set, plus a static HTML rendering of the summary. Each file is
//! written by exactly one call site; nothing here appends.

mod html;
mod json;
mod matrix;
mod summary;
mod valueset;

pub use html::{render_summary_html, write_summary_html};
pub use json::{AnalysisReport, ExperimentOutcome};
pub use matrix::write_comparison_matrix;
pub use summary::write_summary_csv;
pub use valueset::write_valueset;
