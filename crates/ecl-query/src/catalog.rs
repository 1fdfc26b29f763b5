//! The experiment catalog: the fixed family of ECL query variants executed
//! for one primary concept.
//!
//! Each variant needs a subset of the concept's discovered attributes; a
//! variant whose attributes are absent is skipped, not errored, since
//! pre-coordinated concepts legitimately lack them.

use ecl_model::{
    Attribute, DiscoveredAttributes, MEASUREMENT_PROPERTY, QuerySpec, Result, SnomedId, Target,
};

/// A named query variant ready for rendering and execution.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub name: &'static str,
    pub spec: QuerySpec,
}

/// Build the full catalog of experiments for one primary concept.
///
/// `exclude_specimens` adds a `refined_with_exclusions` variant next to
/// `refined_base`; when no Component attribute was discovered the catalog
/// degenerates to the single `precoordinated_descendants` fallback.
pub fn experiment_catalog(
    primary_concept: &SnomedId,
    attributes: &DiscoveredAttributes,
    exclude_specimens: &[SnomedId],
) -> Result<Vec<Experiment>> {
    let mut experiments = Vec::new();

    let Some(component) = &attributes.component else {
        experiments.push(Experiment {
            name: "precoordinated_descendants",
            spec: QuerySpec::concept(Target::descendants_of(primary_concept.clone())),
        });
        return Ok(experiments);
    };

    experiments.push(Experiment {
        name: "descendants_baseline",
        spec: QuerySpec::concept(Target::descendants_of(component.clone())),
    });

    experiments.push(Experiment {
        name: "fixed_component",
        spec: QuerySpec::observable_entity()?
            .bind(Attribute::Component, Target::exact(component.clone())),
    });

    experiments.push(Experiment {
        name: "component_descendants",
        spec: QuerySpec::observable_entity()?
            .bind(Attribute::Component, Target::descendants_of(component.clone())),
    });

    if let Some(property) = &attributes.property {
        experiments.push(Experiment {
            name: "fixed_component_property",
            spec: QuerySpec::observable_entity()?
                .bind(Attribute::Component, Target::exact(component.clone()))
                .bind(Attribute::Property, Target::exact(property.clone())),
        });

        // Disjunctive form: the concept's own property OR anything under the
        // universal measurement property.
        if property.as_str() != MEASUREMENT_PROPERTY {
            experiments.push(Experiment {
                name: "refined_property_or",
                spec: QuerySpec::observable_entity()?
                    .bind(Attribute::Component, Target::descendants_of(component.clone()))
                    .property_or(
                        measurement_property()?,
                        Target::exact(property.clone()),
                    ),
            });
        }
    }

    if let Some(direct_site) = &attributes.direct_site {
        experiments.push(Experiment {
            name: "fixed_component_system",
            spec: QuerySpec::observable_entity()?
                .bind(Attribute::Component, Target::exact(component.clone()))
                .bind(Attribute::DirectSite, Target::descendants_of(direct_site.clone())),
        });
    }

    // The refined variants need all three defining attributes.
    if attributes.property.is_some() {
        if let Some(direct_site) = &attributes.direct_site {
            experiments.push(Experiment {
                name: "refined_base",
                spec: refined_spec(component, direct_site, &[])?,
            });

            if !exclude_specimens.is_empty() {
                experiments.push(Experiment {
                    name: "refined_with_exclusions",
                    spec: refined_spec(component, direct_site, exclude_specimens)?,
                });
            }
        }
    }

    Ok(experiments)
}

/// Component fixed, Property widened to the universal measurement property,
/// Direct site descendant-inclusive, with optional specimen exclusions.
fn refined_spec(
    component: &SnomedId,
    direct_site: &SnomedId,
    exclude_specimens: &[SnomedId],
) -> Result<QuerySpec> {
    let mut spec = QuerySpec::observable_entity()?
        .bind(Attribute::Component, Target::exact(component.clone()))
        .bind(Attribute::Property, measurement_property()?)
        .bind(Attribute::DirectSite, Target::descendants_of(direct_site.clone()));
    for specimen in exclude_specimens {
        spec = spec.exclude(Attribute::DirectSite, Target::descendants_of(specimen.clone()));
    }
    Ok(spec)
}

fn measurement_property() -> Result<Target> {
    Ok(Target::descendants_of(SnomedId::new(MEASUREMENT_PROPERTY)?)
        .labeled("Measurement property"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;

    fn id(value: &str) -> SnomedId {
        SnomedId::new(value).unwrap()
    }

    fn hemoglobin_attributes() -> DiscoveredAttributes {
        DiscoveredAttributes {
            component: Some(id("38082009")),
            property: Some(id("118556004")),
            direct_site: Some(id("119297000")),
        }
    }

    fn names(experiments: &[Experiment]) -> Vec<&'static str> {
        experiments.iter().map(|e| e.name).collect()
    }

    #[test]
    fn full_attributes_yield_full_catalog() {
        let catalog =
            experiment_catalog(&id("168331010000106"), &hemoglobin_attributes(), &[]).unwrap();
        assert_eq!(
            names(&catalog),
            vec![
                "descendants_baseline",
                "fixed_component",
                "component_descendants",
                "fixed_component_property",
                "refined_property_or",
                "fixed_component_system",
                "refined_base",
            ]
        );
    }

    #[test]
    fn exclusions_add_the_exclusion_variant() {
        let catalog = experiment_catalog(
            &id("168331010000106"),
            &hemoglobin_attributes(),
            &[id("122556008")],
        )
        .unwrap();
        assert!(names(&catalog).contains(&"refined_with_exclusions"));

        let refined = catalog
            .iter()
            .find(|e| e.name == "refined_with_exclusions")
            .unwrap();
        let ecl = render(&refined.spec).unwrap();
        assert!(ecl.contains("704327008 |Direct site| != << 122556008"));
    }

    #[test]
    fn missing_component_falls_back_to_precoordinated() {
        let attributes = DiscoveredAttributes::default();
        let catalog = experiment_catalog(&id("723525010000109"), &attributes, &[]).unwrap();
        assert_eq!(names(&catalog), vec!["precoordinated_descendants"]);
        assert_eq!(
            render(&catalog[0].spec).unwrap(),
            "<< 723525010000109"
        );
    }

    #[test]
    fn component_only_skips_property_and_site_variants() {
        let attributes = DiscoveredAttributes {
            component: Some(id("38082009")),
            property: None,
            direct_site: None,
        };
        let catalog = experiment_catalog(&id("168331010000106"), &attributes, &[]).unwrap();
        assert_eq!(
            names(&catalog),
            vec![
                "descendants_baseline",
                "fixed_component",
                "component_descendants",
            ]
        );
    }

    #[test]
    fn refined_base_renders_expected_ecl() {
        let catalog =
            experiment_catalog(&id("168331010000106"), &hemoglobin_attributes(), &[]).unwrap();
        let refined = catalog.iter().find(|e| e.name == "refined_base").unwrap();
        assert_eq!(
            render(&refined.spec).unwrap(),
            "<< 363787002 |Observable entity| : \
             246093002 |Component| = 38082009, \
             370130000 |Property| = << 685451010000100 |Measurement property|, \
             704327008 |Direct site| = << 119297000"
        );
    }
}
