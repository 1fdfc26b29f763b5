use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, OBSERVABLE_ENTITY};
use crate::error::TermError;
use crate::ids::SnomedId;

/// A concept reference inside a query: the identifier, whether the match is
/// descendant-inclusive, and an optional display label carried into the
/// rendered ECL for readability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: SnomedId,
    pub descendants: bool,
    pub label: Option<String>,
}

impl Target {
    /// Exact match on a single concept.
    pub fn exact(id: SnomedId) -> Self {
        Self {
            id,
            descendants: false,
            label: None,
        }
    }

    /// Descendant-or-self match.
    pub fn descendants_of(id: SnomedId) -> Self {
        Self {
            id,
            descendants: true,
            label: None,
        }
    }

    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// One attribute constraint. Multiple bindings on a query are conjunctive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeBinding {
    pub attribute: Attribute,
    pub target: Target,
}

/// The disjunctive Property form used by the refined query variant:
/// `Property = (first OR second)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyAlternatives {
    pub first: Target,
    pub second: Target,
}

/// A negated conjunct (`attribute != << target`), appended after the main
/// constraint list. Used for specimen exclusions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub attribute: Attribute,
    pub target: Target,
}

/// An immutable specification of one ECL query.
///
/// Constructed once per experiment, then rendered to the wire-format ECL
/// string at execution time. Binding order in the rendered string is the
/// canonical [`Attribute`] order regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub base: Target,
    pub bindings: Vec<AttributeBinding>,
    pub property_alternatives: Option<PropertyAlternatives>,
    pub exclusions: Vec<Exclusion>,
}

impl QuerySpec {
    /// A query rooted at `<< 363787002 |Observable entity|`.
    pub fn observable_entity() -> Result<Self, TermError> {
        let base = Target::descendants_of(SnomedId::new(OBSERVABLE_ENTITY)?)
            .labeled("Observable entity");
        Ok(Self {
            base,
            bindings: Vec::new(),
            property_alternatives: None,
            exclusions: Vec::new(),
        })
    }

    /// A bare query on a concrete concept, e.g. the pre-coordinated
    /// descendants fallback `<< {concept}`.
    pub fn concept(base: Target) -> Self {
        Self {
            base,
            bindings: Vec::new(),
            property_alternatives: None,
            exclusions: Vec::new(),
        }
    }

    #[must_use]
    pub fn bind(mut self, attribute: Attribute, target: Target) -> Self {
        self.bindings.push(AttributeBinding { attribute, target });
        self
    }

    #[must_use]
    pub fn property_or(mut self, first: Target, second: Target) -> Self {
        self.property_alternatives = Some(PropertyAlternatives { first, second });
        self
    }

    #[must_use]
    pub fn exclude(mut self, attribute: Attribute, target: Target) -> Self {
        self.exclusions.push(Exclusion { attribute, target });
        self
    }

    /// Structural validation applied before rendering.
    ///
    /// A plain Property binding and the OR form are mutually exclusive, and
    /// each non-Property attribute may be bound at most once.
    pub fn validate(&self) -> Result<(), TermError> {
        if self.property_alternatives.is_some()
            && self
                .bindings
                .iter()
                .any(|b| b.attribute == Attribute::Property)
        {
            return Err(TermError::Configuration(
                "Property is bound both directly and as an OR alternative".to_string(),
            ));
        }
        for attribute in Attribute::ALL {
            let count = self
                .bindings
                .iter()
                .filter(|b| b.attribute == attribute)
                .count();
            if count > 1 {
                return Err(TermError::Configuration(format!(
                    "attribute {attribute} bound {count} times"
                )));
            }
        }
        Ok(())
    }
}
