//! The parent/child contract shared by categories and comments.

use std::fmt;
use std::hash::Hash;

/// A record that takes part in a single-parent hierarchy.
///
/// Siblings are ordered by `(ordering_key, id)`, ascending. Types that want
/// newest-first ordering wrap their key in [`std::cmp::Reverse`].
pub trait HierarchyNode {
    type Id: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display;
    type Key: Ord;

    fn id(&self) -> Self::Id;

    /// `None` for roots.
    fn parent_id(&self) -> Option<Self::Id>;

    fn ordering_key(&self) -> Self::Key;
}
