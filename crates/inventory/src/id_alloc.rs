//! Id allocation for newly inserted items.
//!
//! Ids are decimal sequence numbers continuing after the largest numeric id in
//! the collection. Unique under a single writer only: two writers allocating
//! from the same snapshot will hand out the same ids.

use larder_core::{DomainError, DomainResult, ItemId};

use crate::item::InventoryItem;

/// Allocate `count` new ids following the largest numeric id in `existing`.
///
/// Ids that are not plain decimal integers count as `0`; they never fail the
/// allocation and never shadow the numeric ids around them. Fails with
/// `DomainError::InvariantViolation` when the batch would run past `u64::MAX`.
pub fn next_ids(existing: &[InventoryItem], count: usize) -> DomainResult<Vec<ItemId>> {
    let max_id = existing
        .iter()
        .map(|item| item.id.as_sequence().unwrap_or(0))
        .max()
        .unwrap_or(0);

    (1..=count as u64)
        .map(|offset| {
            max_id.checked_add(offset).map(ItemId::from_sequence).ok_or_else(|| {
                DomainError::invariant(format!("item id sequence exhausted after {max_id}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use larder_core::FridgeId;
    use proptest::prelude::*;

    use crate::item::ItemDraft;

    fn item_with_id(id: &str) -> InventoryItem {
        InventoryItem::from_draft(
            ItemId::new(id),
            FridgeId::new("F1"),
            ItemDraft::default(),
            Utc::now(),
        )
    }

    #[test]
    fn empty_collection_starts_at_one() {
        let ids = next_ids(&[], 3).unwrap();
        assert_eq!(ids, vec![ItemId::new("1"), ItemId::new("2"), ItemId::new("3")]);
    }

    #[test]
    fn continues_after_the_largest_id_not_the_last() {
        let existing = vec![item_with_id("7"), item_with_id("2")];
        assert_eq!(next_ids(&existing, 1).unwrap(), vec![ItemId::new("8")]);
    }

    #[test]
    fn non_numeric_ids_count_as_zero() {
        let existing = vec![item_with_id("abc"), item_with_id("4"), item_with_id("")];
        assert_eq!(next_ids(&existing, 2).unwrap(), vec![ItemId::new("5"), ItemId::new("6")]);

        let only_garbage = vec![item_with_id("x-1")];
        assert_eq!(next_ids(&only_garbage, 1).unwrap(), vec![ItemId::new("1")]);
    }

    #[test]
    fn zero_count_allocates_nothing() {
        assert!(next_ids(&[item_with_id("3")], 0).unwrap().is_empty());
    }

    #[test]
    fn exhausted_sequence_is_an_error_not_a_wrap() {
        let existing = vec![item_with_id(&u64::MAX.to_string())];
        assert!(matches!(
            next_ids(&existing, 1),
            Err(DomainError::InvariantViolation(_))
        ));

        let near_end = vec![item_with_id(&(u64::MAX - 1).to_string())];
        assert_eq!(
            next_ids(&near_end, 1).unwrap(),
            vec![ItemId::new(u64::MAX.to_string())]
        );
        assert!(next_ids(&near_end, 2).is_err());
        assert!(next_ids(&existing, 0).unwrap().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: allocated ids are contiguous, strictly increasing and
        /// disjoint from every existing id.
        #[test]
        fn allocation_is_contiguous_and_fresh(
            existing in prop::collection::vec(prop_oneof![
                (0u64..10_000).prop_map(|n| n.to_string()),
                "[a-z]{1,6}",
            ], 0..20),
            count in 0usize..20
        ) {
            let items: Vec<_> = existing.iter().map(|id| item_with_id(id)).collect();
            let ids = next_ids(&items, count).unwrap();

            prop_assert_eq!(ids.len(), count);
            let seqs: Vec<u64> = ids.iter().map(|id| id.as_sequence().unwrap()).collect();
            for pair in seqs.windows(2) {
                prop_assert_eq!(pair[1], pair[0] + 1);
            }
            for id in &ids {
                prop_assert!(items.iter().all(|item| &item.id != id));
            }
        }
    }
}
