//! Static terminology inputs.
//!
//! Everything here is loaded from local files before any network traffic:
//! the LOINC/SNOMED identifier table, the RF2 relationship snapshot used for
//! attribute discovery, and the curated reference sets the query results are
//! scored against.

pub mod identifier;
pub mod reference;
pub mod relationships;

pub use identifier::IdentifierTable;
pub use reference::{interpolar_reference, load_interpolar_groups, load_top300};
pub use relationships::discover_attributes;
