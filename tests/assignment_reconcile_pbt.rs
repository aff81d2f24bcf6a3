//! Property-based tests for lesson assignment reconciliation.
//!
//! Invariants:
//! - Applying the diff to the current set yields exactly the target set
//! - Ids in the intersection never appear in either half of the diff

use std::collections::HashSet;

use proptest::prelude::*;

use classroom_backend_rust::services::lessons::assignment_diff;

fn arb_id_set() -> impl Strategy<Value = HashSet<String>> {
    proptest::collection::hash_set("[a-f][0-9]{1,3}", 0..12)
}

proptest! {
    #[test]
    fn reconciled_set_equals_target(current in arb_id_set(), target in arb_id_set()) {
        let diff = assignment_diff(&current, &target);

        let mut reconciled = current.clone();
        for id in &diff.to_create {
            reconciled.insert(id.clone());
        }
        for id in &diff.to_remove {
            reconciled.remove(id);
        }

        prop_assert_eq!(reconciled, target);
    }

    #[test]
    fn intersection_is_never_touched(current in arb_id_set(), target in arb_id_set()) {
        let diff = assignment_diff(&current, &target);

        for id in current.intersection(&target) {
            prop_assert!(!diff.to_create.contains(id));
            prop_assert!(!diff.to_remove.contains(id));
        }
    }

    #[test]
    fn diff_halves_are_disjoint(current in arb_id_set(), target in arb_id_set()) {
        let diff = assignment_diff(&current, &target);

        let create: HashSet<_> = diff.to_create.iter().collect();
        let remove: HashSet<_> = diff.to_remove.iter().collect();
        prop_assert!(create.is_disjoint(&remove));
    }
}
