//! Cycle guard for re-parenting.
//!
//! Pure read-then-decide: callers write the new parent only after
//! [`check_reparent`] returns `Ok`.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::{instrument, trace};

use crate::domain::error::DomainError;
use crate::domain::node::HierarchyNode;

/// Read access to the parent pointers of a hierarchy.
pub trait ParentLookup<Id> {
    /// Parent of `id`; `None` for roots and for unknown ids.
    fn parent_of(&self, id: Id) -> Option<Id>;

    /// Number of nodes; bounds the ancestor walk.
    fn node_count(&self) -> usize;
}

/// Parent pointers captured from a flat record list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentIndex<Id: Eq + Hash> {
    parents: HashMap<Id, Option<Id>>,
}

impl<Id: Copy + Eq + Hash> ParentIndex<Id> {
    pub fn from_nodes<T>(nodes: &[T]) -> Self
    where
        T: HierarchyNode<Id = Id>,
    {
        Self {
            parents: nodes.iter().map(|n| (n.id(), n.parent_id())).collect(),
        }
    }

    pub fn contains(&self, id: Id) -> bool {
        self.parents.contains_key(&id)
    }

    /// Overwrite the parent of a known id. Returns false for unknown ids.
    pub fn set_parent(&mut self, id: Id, parent: Option<Id>) -> bool {
        match self.parents.get_mut(&id) {
            Some(slot) => {
                *slot = parent;
                true
            }
            None => false,
        }
    }
}

impl<Id: Copy + Eq + Hash> ParentLookup<Id> for ParentIndex<Id> {
    fn parent_of(&self, id: Id) -> Option<Id> {
        self.parents.get(&id).copied().flatten()
    }

    fn node_count(&self) -> usize {
        self.parents.len()
    }
}

/// Decide whether `node` may be moved under `new_parent`.
///
/// Rejects self-parenting, and any move where `node` appears in the ancestor
/// chain of `new_parent`. The walk is capped at the collection size so an
/// already-corrupt chain terminates; hitting the cap rejects the move as
/// circular. Moving to the root level is always accepted.
#[instrument(level = "debug", skip(lookup))]
pub fn check_reparent<Id, L>(node: Id, new_parent: Option<Id>, lookup: &L) -> Result<(), DomainError>
where
    Id: Copy + Eq + std::fmt::Debug + std::fmt::Display,
    L: ParentLookup<Id> + ?Sized,
{
    let Some(target) = new_parent else {
        return Ok(());
    };
    if target == node {
        return Err(DomainError::SelfParent {
            node: node.to_string(),
        });
    }

    let circular = || DomainError::CircularReference {
        node: node.to_string(),
        parent: target.to_string(),
    };

    let bound = lookup.node_count();
    let mut current = target;
    for _ in 0..=bound {
        if current == node {
            return Err(circular());
        }
        match lookup.parent_of(current) {
            Some(parent) => {
                trace!(%current, %parent, "ancestor step");
                current = parent;
            }
            None => return Ok(()),
        }
    }

    Err(circular())
}
