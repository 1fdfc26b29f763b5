use std::fmt;

use serde::{Deserialize, Serialize};

/// SNOMED concept for the Observable entity base class.
pub const OBSERVABLE_ENTITY: &str = "363787002";

/// Universal quantitative measurement property (parent of all mass/molar
/// concentration qualifier values in the LOINC extension).
pub const MEASUREMENT_PROPERTY: &str = "685451010000100";

/// Attributes an observable-entity query can constrain on.
///
/// The declaration order here is also the canonical rendering order, so that
/// semantically identical specifications always serialize to the same ECL
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Component,
    Property,
    DirectSite,
    ScaleType,
    TimeAspect,
}

impl Attribute {
    /// All attributes in canonical rendering order.
    pub const ALL: [Attribute; 5] = [
        Attribute::Component,
        Attribute::Property,
        Attribute::DirectSite,
        Attribute::ScaleType,
        Attribute::TimeAspect,
    ];

    /// The SNOMED concept id of the attribute itself.
    #[must_use]
    pub fn concept_id(self) -> &'static str {
        match self {
            Attribute::Component => "246093002",
            Attribute::Property => "370130000",
            Attribute::DirectSite => "704327008",
            Attribute::ScaleType => "370134009",
            Attribute::TimeAspect => "370132008",
        }
    }

    /// Human-readable term used inside rendered ECL.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Attribute::Component => "Component",
            Attribute::Property => "Property",
            Attribute::DirectSite => "Direct site",
            Attribute::ScaleType => "Scale type",
            Attribute::TimeAspect => "Time aspect",
        }
    }

    /// Reverse lookup from a relationship type id.
    #[must_use]
    pub fn from_concept_id(id: &str) -> Option<Attribute> {
        Attribute::ALL.into_iter().find(|a| a.concept_id() == id)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The defining attributes discovered for one observable-entity concept.
///
/// Pre-coordinated concepts (calculated indices like MCV) often have none of
/// these; the experiment catalog falls back to plain descendant queries for
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredAttributes {
    pub component: Option<crate::ids::SnomedId>,
    pub property: Option<crate::ids::SnomedId>,
    pub direct_site: Option<crate::ids::SnomedId>,
}

impl DiscoveredAttributes {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.component.is_none() && self.property.is_none() && self.direct_site.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_ids_round_trip() {
        for attribute in Attribute::ALL {
            assert_eq!(
                Attribute::from_concept_id(attribute.concept_id()),
                Some(attribute)
            );
        }
        assert_eq!(Attribute::from_concept_id("999"), None);
    }

    #[test]
    fn canonical_order_starts_with_component() {
        assert_eq!(Attribute::ALL[0], Attribute::Component);
        assert_eq!(Attribute::ALL[1], Attribute::Property);
        assert_eq!(Attribute::ALL[2], Attribute::DirectSite);
    }
}
