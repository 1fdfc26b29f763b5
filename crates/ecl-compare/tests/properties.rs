//! Property tests for the comparator's set algebra.

use std::collections::BTreeSet;

use ecl_compare::compare;
use ecl_model::LoincCode;
use proptest::prelude::*;

fn code_set() -> impl Strategy<Value = BTreeSet<LoincCode>> {
    proptest::collection::btree_set("[0-9]{1,5}-[0-9]", 0..32).prop_map(|codes| {
        codes
            .into_iter()
            .map(|c| LoincCode::new(c).unwrap())
            .collect()
    })
}

proptest! {
    #[test]
    fn result_only_partitions_the_result_set(
        result in code_set(),
        reference in code_set(),
    ) {
        let metrics = compare(&result, &reference);

        let result_only: BTreeSet<LoincCode> =
            metrics.result_only_codes.iter().cloned().collect();
        let overlap: BTreeSet<LoincCode> =
            result.intersection(&reference).cloned().collect();

        // result_only is disjoint from the reference.
        prop_assert!(result_only.is_disjoint(&reference));
        // result_only plus the overlap reconstructs the result set exactly.
        let reunion: BTreeSet<LoincCode> = result_only.union(&overlap).cloned().collect();
        prop_assert_eq!(reunion, result);
    }

    #[test]
    fn overlap_is_symmetric_and_ratios_swap(
        a in code_set(),
        b in code_set(),
    ) {
        let forward = compare(&a, &b);
        let backward = compare(&b, &a);

        prop_assert_eq!(forward.overlap_count, backward.overlap_count);
        prop_assert_eq!(forward.precision, backward.recall);
        prop_assert_eq!(forward.recall, backward.precision);
    }

    #[test]
    fn precision_matches_definition(
        result in code_set(),
        reference in code_set(),
    ) {
        let metrics = compare(&result, &reference);
        let overlap = result.intersection(&reference).count();

        match metrics.precision {
            Some(p) => prop_assert_eq!(p, overlap as f64 / result.len() as f64),
            None => prop_assert!(result.is_empty()),
        }
        match metrics.recall {
            Some(r) => prop_assert_eq!(r, overlap as f64 / reference.len() as f64),
            None => prop_assert!(reference.is_empty()),
        }
    }
}
