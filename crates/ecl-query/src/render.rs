//! Rendering of a [`QuerySpec`] into the wire-level ECL string.
//!
//! Rendering is a pure function: the same specification always yields the
//! same string. Bindings appear in the canonical attribute order (Component,
//! Property, Direct site, Scale type, Time aspect) so that semantically
//! identical specifications cannot produce textually distinct ECL.

use ecl_model::{Attribute, QuerySpec, Result, Target};

/// Render a query specification to ECL.
///
/// # Errors
///
/// Returns [`ecl_model::TermError::Configuration`] when the specification is
/// structurally invalid (duplicate bindings, conflicting Property forms).
pub fn render(spec: &QuerySpec) -> Result<String> {
    spec.validate()?;

    let mut out = render_target(&spec.base);

    let mut conjuncts: Vec<String> = Vec::new();
    for attribute in Attribute::ALL {
        if attribute == Attribute::Property {
            if let Some(alternatives) = &spec.property_alternatives {
                conjuncts.push(format!(
                    "{} = ({} OR {})",
                    render_attribute(attribute),
                    render_target(&alternatives.first),
                    render_target(&alternatives.second),
                ));
                continue;
            }
        }
        if let Some(binding) = spec.bindings.iter().find(|b| b.attribute == attribute) {
            conjuncts.push(format!(
                "{} = {}",
                render_attribute(attribute),
                render_target(&binding.target),
            ));
        }
    }

    // Exclusions are negated conjuncts after the main constraint list.
    for exclusion in &spec.exclusions {
        conjuncts.push(format!(
            "{} != {}",
            render_attribute(exclusion.attribute),
            render_target(&exclusion.target),
        ));
    }

    if !conjuncts.is_empty() {
        out.push_str(" : ");
        out.push_str(&conjuncts.join(", "));
    }

    Ok(out)
}

fn render_attribute(attribute: Attribute) -> String {
    format!("{} |{}|", attribute.concept_id(), attribute.label())
}

fn render_target(target: &Target) -> String {
    let prefix = if target.descendants { "<< " } else { "" };
    match &target.label {
        Some(label) => format!("{prefix}{} |{label}|", target.id),
        None => format!("{prefix}{}", target.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecl_model::SnomedId;

    fn id(value: &str) -> SnomedId {
        SnomedId::new(value).unwrap()
    }

    #[test]
    fn renders_bare_descendant_query() {
        let spec = QuerySpec::concept(Target::descendants_of(id("38082009")));
        assert_eq!(render(&spec).unwrap(), "<< 38082009");
    }

    #[test]
    fn renders_fixed_component_query() {
        let spec = QuerySpec::observable_entity()
            .unwrap()
            .bind(
                Attribute::Component,
                Target::exact(id("38082009")).labeled("Hemoglobin"),
            );
        assert_eq!(
            render(&spec).unwrap(),
            "<< 363787002 |Observable entity| : 246093002 |Component| = 38082009 |Hemoglobin|"
        );
    }

    #[test]
    fn bindings_render_in_canonical_order() {
        // Insert in reverse order; output order must not change.
        let spec = QuerySpec::observable_entity()
            .unwrap()
            .bind(
                Attribute::DirectSite,
                Target::descendants_of(id("119297000")),
            )
            .bind(Attribute::Component, Target::exact(id("38082009")));
        let ecl = render(&spec).unwrap();
        assert_eq!(
            ecl,
            "<< 363787002 |Observable entity| : \
             246093002 |Component| = 38082009, \
             704327008 |Direct site| = << 119297000"
        );
    }

    #[test]
    fn exclusions_follow_the_constraint_list() {
        let spec = QuerySpec::observable_entity()
            .unwrap()
            .bind(Attribute::Component, Target::exact(id("41898006")))
            .exclude(
                Attribute::DirectSite,
                Target::descendants_of(id("122556008")).labeled("Cord blood specimen"),
            );
        let ecl = render(&spec).unwrap();
        assert!(ecl.ends_with(
            "704327008 |Direct site| != << 122556008 |Cord blood specimen|"
        ));
        let component_pos = ecl.find("246093002").unwrap();
        let exclusion_pos = ecl.find("!=").unwrap();
        assert!(component_pos < exclusion_pos);
    }

    #[test]
    fn property_alternatives_render_parenthesized() {
        let spec = QuerySpec::observable_entity()
            .unwrap()
            .bind(
                Attribute::Component,
                Target::descendants_of(id("27840003")),
            )
            .property_or(
                Target::descendants_of(id("685451010000100")),
                Target::exact(id("118586006")),
            );
        assert_eq!(
            render(&spec).unwrap(),
            "<< 363787002 |Observable entity| : \
             246093002 |Component| = << 27840003, \
             370130000 |Property| = (<< 685451010000100 OR 118586006)"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let spec = QuerySpec::observable_entity()
            .unwrap()
            .bind(Attribute::Component, Target::exact(id("38082009")))
            .bind(Attribute::Property, Target::exact(id("118556004")));
        let first = render(&spec).unwrap();
        let second = render(&spec).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_spec_fails_configuration() {
        let spec = QuerySpec::observable_entity()
            .unwrap()
            .bind(Attribute::Component, Target::exact(id("1")))
            .bind(Attribute::Component, Target::exact(id("2")));
        assert!(render(&spec).is_err());
    }
}
