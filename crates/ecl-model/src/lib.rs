pub mod attribute;
pub mod concept;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod query;
pub mod reference;

pub use attribute::{Attribute, DiscoveredAttributes, MEASUREMENT_PROPERTY, OBSERVABLE_ENTITY};
pub use concept::{Concept, Expansion, ResultSet};
pub use error::{Result, TermError};
pub use ids::{LoincCode, SnomedId};
pub use metrics::{ComparisonRecord, Component, Metrics, QueryFailure};
pub use query::{AttributeBinding, Exclusion, PropertyAlternatives, QuerySpec, Target};
pub use reference::ReferenceSet;
