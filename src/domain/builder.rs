//! Tree builder for turning flat parent-referencing records into ordered forests.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::domain::arena::Forest;
use crate::domain::error::DomainError;
use crate::domain::node::HierarchyNode;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;

/// What to do with records that cannot be reached from any root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Leave them out of the forest and log a warning.
    #[default]
    Drop,
    /// Fail the build with a data-integrity error.
    Reject,
}

/// A data-integrity finding on a flat record collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    DuplicateId { node: String },
    DanglingParent { node: String, parent: String },
    Cycle { node: String },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::DuplicateId { node } => write!(f, "duplicate id {node}"),
            IntegrityIssue::DanglingParent { node, parent } => {
                write!(f, "{node} references missing parent {parent}")
            }
            IntegrityIssue::Cycle { node } => write!(f, "{node} is not reachable from any root (cycle)"),
        }
    }
}

/// Constructs ordered forests from flat record lists.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    policy: OrphanPolicy,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: OrphanPolicy) -> Self {
        Self { policy }
    }

    /// Build the forest for `nodes`.
    ///
    /// One grouping pass maps each parent id to its sorted children, then an
    /// explicit stack descends from the roots. Siblings are ordered by
    /// `(ordering_key, id)`. Records whose parent chain never reaches a root
    /// are handled according to the configured [`OrphanPolicy`].
    #[instrument(level = "debug", skip_all, fields(nodes = nodes.len(), policy = ?self.policy))]
    pub fn build<T: HierarchyNode>(&self, nodes: Vec<T>) -> TreeResult<Forest<T>> {
        let mut seen = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !seen.insert(node.id()) {
                return Err(DomainError::DuplicateNode(node.id().to_string()));
            }
        }

        let mut children_of: HashMap<Option<T::Id>, Vec<T>> =
            nodes.into_iter().into_group_map_by(|n| n.parent_id());
        for siblings in children_of.values_mut() {
            sort_siblings(siblings);
        }

        let mut forest = Forest::new();
        let mut stack: Vec<(T, Option<_>)> = children_of
            .remove(&None)
            .unwrap_or_default()
            .into_iter()
            .rev()
            .map(|root| (root, None))
            .collect();

        while let Some((node, parent_idx)) = stack.pop() {
            let id = node.id();
            let current_idx = forest.insert_node(node, parent_idx);
            if let Some(children) = children_of.remove(&Some(id)) {
                stack.extend(children.into_iter().rev().map(|c| (c, Some(current_idx))));
            }
        }

        // Whatever is left was never reached from a root
        let unreachable: Vec<T> = children_of.into_values().flatten().collect();
        if !unreachable.is_empty() {
            self.handle_unreachable(&unreachable, &seen)?;
        }

        Ok(forest)
    }

    fn handle_unreachable<T: HierarchyNode>(
        &self,
        unreachable: &[T],
        known: &HashSet<T::Id>,
    ) -> TreeResult<()> {
        match self.policy {
            OrphanPolicy::Drop => {
                for node in unreachable.iter().sorted_by_key(|n| n.id()) {
                    warn!(
                        node = %node.id(),
                        parent = ?node.parent_id(),
                        "dropping node unreachable from any root"
                    );
                }
                Ok(())
            }
            OrphanPolicy::Reject => {
                let dangling = unreachable
                    .iter()
                    .filter(|n| n.parent_id().is_some_and(|p| !known.contains(&p)))
                    .min_by_key(|n| n.id());
                if let Some(node) = dangling {
                    return Err(DomainError::DanglingParent {
                        node: node.id().to_string(),
                        parent: node
                            .parent_id()
                            .map(|p| p.to_string())
                            .unwrap_or_default(),
                    });
                }
                let first = unreachable.iter().map(|n| n.id()).min();
                match first {
                    Some(id) => Err(DomainError::CycleDetected(id.to_string())),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Sort siblings by `(ordering_key, id)`.
pub fn sort_siblings<T: HierarchyNode>(siblings: &mut [T]) {
    siblings.sort_by(|a, b| {
        a.ordering_key()
            .cmp(&b.ordering_key())
            .then_with(|| a.id().cmp(&b.id()))
    });
}

/// Report every integrity problem in `nodes` without building a forest.
///
/// Findings are sorted by node id so the report is stable.
pub fn audit<T: HierarchyNode>(nodes: &[T]) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    let counts = nodes.iter().map(|n| n.id()).counts();
    for id in counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(id, _)| *id)
        .sorted()
    {
        issues.push(IntegrityIssue::DuplicateId {
            node: id.to_string(),
        });
    }

    let children_of: HashMap<Option<T::Id>, Vec<T::Id>> = nodes
        .iter()
        .map(|n| (n.parent_id(), n.id()))
        .into_group_map();

    let mut reachable = HashSet::new();
    let mut stack: Vec<T::Id> = children_of.get(&None).cloned().unwrap_or_default();
    while let Some(id) = stack.pop() {
        if reachable.insert(id) {
            if let Some(children) = children_of.get(&Some(id)) {
                stack.extend(children.iter().copied());
            }
        }
    }

    for node in nodes
        .iter()
        .filter(|n| !reachable.contains(&n.id()))
        .sorted_by_key(|n| n.id())
        .dedup_by(|a, b| a.id() == b.id())
    {
        match node.parent_id() {
            Some(parent) if !counts.contains_key(&parent) => {
                issues.push(IntegrityIssue::DanglingParent {
                    node: node.id().to_string(),
                    parent: parent.to_string(),
                })
            }
            _ => issues.push(IntegrityIssue::Cycle {
                node: node.id().to_string(),
            }),
        }
    }

    issues
}
