//! Tests for CategoryService

use std::sync::Arc;

use chrono::Utc;
use rstest::{fixture, rstest};
use uuid::Uuid;

use notetree::application::services::{CategoryService, CategoryUpdate, ReorderItem, Reparent};
use notetree::application::{ApplicationError, Viewer};
use notetree::config::Settings;
use notetree::domain::{
    ApprovalStatus, Category, DomainError, IntegrityIssue, NewCategory, OrphanPolicy, Role,
};
use notetree::infrastructure::traits::CategoryStore;
use notetree::infrastructure::{Snapshot, SnapshotStore};
use notetree::util::testing;

fn cat(id: i64, parent_id: Option<i64>, order_index: i32) -> Category {
    Category {
        id,
        name: format!("cat-{id}"),
        description: None,
        parent_id,
        order_index,
        created_at: Utc::now(),
    }
}

fn admin() -> Viewer {
    Viewer {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
        approval: ApprovalStatus::Approved,
    }
}

fn student() -> Viewer {
    Viewer {
        user_id: Uuid::new_v4(),
        role: Role::Student,
        approval: ApprovalStatus::Approved,
    }
}

struct Harness {
    store: Arc<SnapshotStore>,
    service: CategoryService,
}

impl Harness {
    fn new(categories: Vec<Category>) -> Self {
        Self::with_settings(categories, Settings::default())
    }

    fn with_settings(categories: Vec<Category>, settings: Settings) -> Self {
        testing::init_test_setup();
        let store = Arc::new(SnapshotStore::in_memory(Snapshot {
            categories,
            ..Default::default()
        }));
        let service = CategoryService::new(store.clone(), Arc::new(settings));
        Self { store, service }
    }

    fn parent_of(&self, id: i64) -> Option<i64> {
        self.store
            .load_categories()
            .unwrap()
            .into_iter()
            .find(|c| c.id == id)
            .and_then(|c| c.parent_id)
    }
}

/// A(1) -> B(2) -> C(3), plus a second root D(4)
#[fixture]
fn chain() -> Harness {
    Harness::new(vec![
        cat(1, None, 0),
        cat(2, Some(1), 0),
        cat(3, Some(2), 0),
        cat(4, None, 1),
    ])
}

// ============================================================
// reads
// ============================================================

#[rstest]
fn given_chain_when_tree_then_nested_by_parent(chain: Harness) {
    let trees = chain.service.tree().unwrap();

    assert_eq!(trees.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 4]);
    assert_eq!(trees[0].children[0].id, 2);
    assert_eq!(trees[0].children[0].children[0].id, 3);
}

#[test]
fn given_orphan_when_tree_with_reject_policy_then_dangling_parent() {
    let settings = Settings {
        orphans: OrphanPolicy::Reject,
        ..Default::default()
    };
    let h = Harness::with_settings(vec![cat(1, None, 0), cat(2, Some(9), 0)], settings);

    let err = h.service.tree().unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::DanglingParent { .. })
    ));
}

#[test]
fn given_categories_when_list_then_ordered_by_order_index_then_id() {
    let h = Harness::new(vec![cat(3, None, 1), cat(1, None, 2), cat(2, Some(3), 1)]);

    let ids: Vec<i64> = h.service.list().unwrap().iter().map(|c| c.id).collect();

    assert_eq!(ids, vec![2, 3, 1]);
}

#[rstest]
fn given_unknown_id_when_get_then_not_found(chain: Harness) {
    assert!(matches!(
        chain.service.get(42),
        Err(ApplicationError::NotFound { .. })
    ));
}

// ============================================================
// create
// ============================================================

#[rstest]
fn given_zero_order_when_create_then_appended_after_siblings(chain: Harness) {
    let created = chain
        .service
        .create(
            &admin(),
            NewCategory {
                name: "third root".into(),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(created.id, 5);
    assert_eq!(created.order_index, 2);
}

#[rstest]
fn given_sibling_with_same_name_when_create_then_duplicate_name(chain: Harness) {
    let err = chain
        .service
        .create(
            &admin(),
            NewCategory {
                name: "cat-2".into(),
                parent_id: Some(1),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(matches!(err, ApplicationError::DuplicateName { .. }));
}

#[rstest]
fn given_same_name_under_other_parent_when_create_then_accepted(chain: Harness) {
    let created = chain.service.create(
        &admin(),
        NewCategory {
            name: "cat-2".into(),
            parent_id: Some(4),
            ..Default::default()
        },
    );

    assert!(created.is_ok());
}

#[rstest]
fn given_missing_parent_when_create_then_not_found(chain: Harness) {
    let err = chain
        .service
        .create(
            &admin(),
            NewCategory {
                name: "x".into(),
                parent_id: Some(99),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(matches!(err, ApplicationError::NotFound { .. }));
}

#[rstest]
fn given_student_when_create_then_forbidden(chain: Harness) {
    let err = chain
        .service
        .create(
            &student(),
            NewCategory {
                name: "x".into(),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Forbidden(_)));
}

// ============================================================
// update / move
// ============================================================

#[rstest]
fn given_chain_when_moving_root_under_leaf_then_rejected_and_unchanged(chain: Harness) {
    let err = chain
        .service
        .update(
            &admin(),
            1,
            CategoryUpdate {
                parent: Reparent::Under(3),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::CircularReference { .. })
    ));
    assert_eq!(chain.parent_of(1), None);
}

#[rstest]
fn given_chain_when_moving_under_self_then_self_parent(chain: Harness) {
    let err = chain
        .service
        .update(
            &admin(),
            2,
            CategoryUpdate {
                parent: Reparent::Under(2),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::SelfParent { .. })
    ));
}

#[rstest]
#[case(Reparent::Under(1), Some(1))]
#[case(Reparent::Under(4), Some(4))]
#[case(Reparent::Root, None)]
fn given_chain_when_moving_leaf_then_accepted(
    chain: Harness,
    #[case] target: Reparent,
    #[case] expected: Option<i64>,
) {
    chain
        .service
        .update(
            &admin(),
            3,
            CategoryUpdate {
                parent: target,
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(chain.parent_of(3), expected);
}

#[rstest]
fn given_rename_only_when_update_then_parent_kept(chain: Harness) {
    let updated = chain
        .service
        .update(
            &admin(),
            3,
            CategoryUpdate {
                name: Some("renamed".into()),
                description: Some("about".into()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.description.as_deref(), Some("about"));
    assert_eq!(chain.parent_of(3), Some(2));
}

// ============================================================
// delete
// ============================================================

#[rstest]
fn given_category_with_children_when_delete_then_has_children(chain: Harness) {
    let err = chain.service.delete(&admin(), 2).unwrap_err();

    assert!(matches!(err, ApplicationError::HasChildren(2)));
}

#[rstest]
fn given_leaf_when_delete_then_removed(chain: Harness) {
    chain.service.delete(&admin(), 3).unwrap();

    assert!(chain.service.get(3).is_err());
}

// ============================================================
// reorder
// ============================================================

#[rstest]
fn given_batch_introducing_cycle_when_reorder_then_nothing_written(chain: Harness) {
    // Arrange: first entry is harmless, second closes a loop 1 -> 3 -> 2 -> 1
    let items = vec![
        ReorderItem {
            id: 4,
            parent_id: Some(1),
            order_index: 5,
        },
        ReorderItem {
            id: 1,
            parent_id: Some(3),
            order_index: 0,
        },
    ];

    // Act
    let err = chain.service.reorder(&admin(), items).unwrap_err();

    // Assert
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::CircularReference { .. })
    ));
    assert_eq!(chain.parent_of(4), None);
    assert_eq!(chain.parent_of(1), None);
}

#[rstest]
fn given_batch_valid_only_as_a_whole_when_reorder_then_applied(chain: Harness) {
    // Lift B to the root, then hang A under C: fine in the final state
    let items = vec![
        ReorderItem {
            id: 1,
            parent_id: Some(3),
            order_index: 0,
        },
        ReorderItem {
            id: 2,
            parent_id: None,
            order_index: 0,
        },
    ];

    let updated = chain.service.reorder(&admin(), items).unwrap();

    assert_eq!(updated.len(), 2);
    assert_eq!(chain.parent_of(1), Some(3));
    assert_eq!(chain.parent_of(2), None);
}

#[rstest]
fn given_unknown_ids_when_reorder_then_skipped(chain: Harness) {
    let items = vec![
        ReorderItem {
            id: 99,
            parent_id: None,
            order_index: 0,
        },
        ReorderItem {
            id: 4,
            parent_id: None,
            order_index: 7,
        },
    ];

    let updated = chain.service.reorder(&admin(), items).unwrap();

    assert_eq!(updated.len(), 1);
    assert_eq!(chain.service.get(4).unwrap().order_index, 7);
}

#[test]
fn given_move_into_sibling_with_same_name_when_reorder_then_duplicate_name_and_nothing_written() {
    // Arrange: 2 "X" under 1, 3 "X" at the root
    let mut a = cat(1, None, 0);
    a.name = "A".into();
    let mut x_child = cat(2, Some(1), 0);
    x_child.name = "X".into();
    let mut x_root = cat(3, None, 1);
    x_root.name = "X".into();
    let h = Harness::new(vec![a, x_child, x_root]);

    // Act
    let err = h
        .service
        .reorder(
            &admin(),
            vec![ReorderItem {
                id: 3,
                parent_id: Some(1),
                order_index: 1,
            }],
        )
        .unwrap_err();

    // Assert
    assert!(matches!(err, ApplicationError::DuplicateName { .. }));
    assert_eq!(h.parent_of(3), None);
}

#[test]
fn given_two_same_named_swapping_parents_when_reorder_then_accepted() {
    // "X" under 1 and "X" under 4 trade places; no clash in the final state
    let mut a = cat(1, None, 0);
    a.name = "A".into();
    let mut b = cat(4, None, 1);
    b.name = "B".into();
    let mut x1 = cat(2, Some(1), 0);
    x1.name = "X".into();
    let mut x2 = cat(3, Some(4), 0);
    x2.name = "X".into();
    let h = Harness::new(vec![a, b, x1, x2]);

    let items = vec![
        ReorderItem {
            id: 2,
            parent_id: Some(4),
            order_index: 0,
        },
        ReorderItem {
            id: 3,
            parent_id: Some(1),
            order_index: 0,
        },
    ];

    h.service.reorder(&admin(), items).unwrap();

    assert_eq!(h.parent_of(2), Some(4));
    assert_eq!(h.parent_of(3), Some(1));
}

#[test]
fn given_corrupt_store_when_audit_then_findings_reported() {
    let h = Harness::new(vec![cat(1, None, 0), cat(2, Some(3), 0), cat(3, Some(2), 0)]);

    let issues = h.service.audit().unwrap();

    assert_eq!(
        issues,
        vec![
            IntegrityIssue::Cycle { node: "2".into() },
            IntegrityIssue::Cycle { node: "3".into() },
        ]
    );
}
