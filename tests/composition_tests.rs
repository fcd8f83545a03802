//! Composition and required-field validation tests

use proptest::prelude::*;
use std::collections::BTreeMap;
use tcm::core::validation::{
    validate_composition, CompositionError, MissingField, RequiredFields,
};
use tcm::entities::{Component, FibreEntry};

fn entries(percentages: &[i32]) -> Vec<FibreEntry> {
    percentages
        .iter()
        .enumerate()
        .map(|(i, p)| FibreEntry::new(format!("fibre-{}", i), *p))
        .collect()
}

#[test]
fn test_totals_off_by_one_fail() {
    assert_eq!(
        validate_composition(&entries(&[50, 49])),
        Err(CompositionError::InvalidTotal { total: 99 })
    );
    assert_eq!(
        validate_composition(&entries(&[50, 51])),
        Err(CompositionError::InvalidTotal { total: 101 })
    );
    assert_eq!(
        validate_composition(&[]),
        Err(CompositionError::InvalidTotal { total: 0 })
    );
}

#[test]
fn test_duplicate_fibres_are_not_merged() {
    let blend = vec![
        FibreEntry::new("cotton", 50),
        FibreEntry::new("cotton", 50),
    ];
    assert!(validate_composition(&blend).is_ok());
}

#[test]
fn test_negative_entry_rejected_even_when_sum_is_100() {
    let blend = entries(&[110, -10]);
    assert!(matches!(
        validate_composition(&blend),
        Err(CompositionError::OutOfRange { index: 0, percentage: 110, .. })
    ));
}

#[test]
fn test_zero_percent_entry_allowed() {
    assert!(validate_composition(&entries(&[100, 0])).is_ok());
}

#[test]
fn test_fabric_and_trim_declarations() {
    let required = RequiredFields::default();

    let fabric = Component::fabric("CMP-1", "Poplin");
    assert_eq!(
        required.missing("fabric", &fabric),
        vec!["construction", "dye_method"]
    );

    let trim = Component::trim("CMP-2", "Zip");
    assert_eq!(
        required.validate("trim", &trim),
        Err(MissingField {
            record_type: "trim".to_string(),
            field: "trim_type".to_string(),
        })
    );
}

#[test]
fn test_map_draft_blank_counts_as_missing() {
    let required = RequiredFields::default();
    let mut draft = BTreeMap::new();
    draft.insert("construction".to_string(), "plain weave".to_string());
    draft.insert("dye_method".to_string(), "   ".to_string());

    assert_eq!(required.missing("fabric", &draft), vec!["dye_method"]);
}

fn composition_summing_to_100() -> impl Strategy<Value = Vec<i32>> {
    // Cut points in 0..=100 give parts that always sum to 100
    prop::collection::vec(0i32..=100, 0..6).prop_map(|mut cuts| {
        cuts.sort_unstable();
        let mut parts = Vec::with_capacity(cuts.len() + 1);
        let mut last = 0;
        for cut in cuts {
            parts.push(cut - last);
            last = cut;
        }
        parts.push(100 - last);
        parts
    })
}

proptest! {
    #[test]
    fn prop_sum_100_passes_in_any_order(
        parts in composition_summing_to_100(),
        rotate in 0usize..8,
    ) {
        let blend = entries(&parts);
        prop_assert!(validate_composition(&blend).is_ok());

        let mut shuffled = blend.clone();
        let len = shuffled.len();
        shuffled.rotate_left(rotate % len);
        shuffled.reverse();
        prop_assert_eq!(validate_composition(&shuffled), validate_composition(&blend));
    }

    #[test]
    fn prop_wrong_total_fails(parts in prop::collection::vec(0i32..=100, 0..6)) {
        let total: i64 = parts.iter().map(|p| i64::from(*p)).sum();
        prop_assume!(total != 100);
        prop_assert_eq!(
            validate_composition(&entries(&parts)),
            Err(CompositionError::InvalidTotal { total })
        );
    }
}
