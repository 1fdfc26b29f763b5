//! Terminology server access.
//!
//! Two interchangeable backends implement [`TerminologyServer`]: the public
//! LOINCSNOMED Snowstorm instance and a FHIR OntoServer. The pipeline only
//! ever sees the trait plus the typed [`Expansion`] / [`Concept`] records;
//! all wire formats stay inside this crate.

use ecl_model::{Concept, Expansion, Result, SnomedId};

pub mod ontoserver;
pub mod retry;
pub mod snowstorm;
mod transport;

pub use ontoserver::{OntoServer, OntoServerConfig};
pub use retry::{Pacer, RetryPolicy};
pub use snowstorm::SnowstormServer;

/// A server that can execute ECL queries and look up concept details.
pub trait TerminologyServer {
    /// Short backend label used in logs and reports.
    fn name(&self) -> &'static str;

    /// Execute an ECL expression, returning up to `limit` matches plus the
    /// server-side total.
    fn expand(&self, ecl: &str, limit: usize) -> Result<Expansion>;

    /// Fetch FSN and preferred term for one concept.
    fn lookup(&self, concept_id: &SnomedId) -> Result<Concept>;
}
