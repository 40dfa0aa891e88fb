//! Tests for the cycle guard

use std::collections::HashMap;

use chrono::Utc;
use rstest::rstest;

use notetree::domain::{check_reparent, Category, DomainError, ParentIndex, ParentLookup};

fn cat(id: i64, parent_id: Option<i64>) -> Category {
    Category {
        id,
        name: format!("cat-{id}"),
        description: None,
        parent_id,
        order_index: 0,
        created_at: Utc::now(),
    }
}

const A: i64 = 1;
const B: i64 = 2;
const C: i64 = 3;

/// A -> B -> C: C's parent is B, B's parent is A.
fn chain() -> ParentIndex<i64> {
    ParentIndex::from_nodes(&[cat(A, None), cat(B, Some(A)), cat(C, Some(B))])
}

#[test]
fn given_chain_when_moving_root_under_its_leaf_then_circular_reference() {
    let err = check_reparent(A, Some(C), &chain()).unwrap_err();

    assert_eq!(
        err,
        DomainError::CircularReference {
            node: "1".into(),
            parent: "3".into()
        }
    );
}

#[test]
fn given_chain_when_moving_node_under_itself_then_self_parent() {
    let err = check_reparent(A, Some(A), &chain()).unwrap_err();

    assert_eq!(err, DomainError::SelfParent { node: "1".into() });
}

#[rstest]
#[case(C, Some(A))]
#[case(C, None)]
#[case(A, None)]
#[case(B, Some(A))]
fn given_chain_when_move_is_safe_then_accepted(#[case] node: i64, #[case] parent: Option<i64>) {
    assert!(check_reparent(node, parent, &chain()).is_ok());
}

#[test]
fn given_chain_when_moving_node_under_its_child_then_circular_reference() {
    let result = check_reparent(B, Some(C), &chain());

    assert!(matches!(result, Err(DomainError::CircularReference { .. })));
}

#[test]
fn given_unknown_target_when_checking_then_treated_as_root() {
    assert!(check_reparent(A, Some(99), &chain()).is_ok());
}

#[test]
fn given_existing_cycle_elsewhere_when_checking_then_terminates_with_rejection() {
    // Arrange: 10 <-> 11 already corrupt, 12 is a clean root
    let index = ParentIndex::from_nodes(&[cat(10, Some(11)), cat(11, Some(10)), cat(12, None)]);

    // Act: the walk from 10 never reaches 12 nor a root
    let result = check_reparent(12, Some(10), &index);

    // Assert
    assert!(matches!(result, Err(DomainError::CircularReference { .. })));
}

/// Lookup over a plain map, to show the guard only needs the trait.
struct MapLookup(HashMap<i64, i64>);

impl ParentLookup<i64> for MapLookup {
    fn parent_of(&self, id: i64) -> Option<i64> {
        self.0.get(&id).copied()
    }

    fn node_count(&self) -> usize {
        self.0.len() + 1
    }
}

#[test]
fn given_custom_lookup_when_checking_then_same_decisions() {
    let lookup = MapLookup(HashMap::from([(B, A), (C, B)]));

    assert!(check_reparent(A, Some(C), &lookup).is_err());
    assert!(check_reparent(C, Some(A), &lookup).is_ok());
}

#[test]
fn given_index_when_simulating_move_then_guard_sees_new_state() {
    let mut index = chain();

    assert!(index.set_parent(C, None));
    assert!(!index.set_parent(99, None));

    // C no longer below A, so A may now go under C
    assert!(check_reparent(A, Some(C), &index).is_ok());
    assert_eq!(index.parent_of(C), None);
}
