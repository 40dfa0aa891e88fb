use std::collections::HashMap;

use generational_arena::{Arena, Index};

use crate::domain::node::HierarchyNode;

/// Tree node in the arena-based forest.
#[derive(Debug)]
pub struct ForestNode<T> {
    /// Record carried by this node
    pub data: T,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in sibling order
    pub children: Vec<Index>,
}

/// Arena-based forest of ordered trees.
///
/// Nodes reference each other by generational index instead of live
/// pointers, so parent links never form ownership cycles. Lookups by
/// record id go through a side index.
#[derive(Debug)]
pub struct Forest<T: HierarchyNode> {
    arena: Arena<ForestNode<T>>,
    roots: Vec<Index>,
    by_id: HashMap<T::Id, Index>,
}

impl<T: HierarchyNode> Default for Forest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: HierarchyNode> Forest<T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Appends `data` as the last child of `parent`, or as the last root.
    pub fn insert_node(&mut self, data: T, parent: Option<Index>) -> Index {
        let id = data.id();
        let node = ForestNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => parent.children.push(node_idx),
            None => self.roots.push(node_idx),
        }
        self.by_id.insert(id, node_idx);

        node_idx
    }

    fn get_node(&self, idx: Index) -> Option<&ForestNode<T>> {
        self.arena.get(idx)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal of the tree rooted at `id`, starting with `id`.
    /// Empty when `id` is not in the forest.
    fn subtree(&self, id: T::Id) -> ForestIterator<'_, T> {
        let stack = self.by_id.get(&id).copied().into_iter().collect();
        ForestIterator {
            forest: self,
            stack,
        }
    }

    /// Ids of the tree rooted at `id` in pre-order, `id` first.
    pub fn subtree_ids(&self, id: T::Id) -> Vec<T::Id> {
        self.subtree(id).map(|(_, node)| node.data.id()).collect()
    }

    /// Bottom-up projection: `f` receives each record together with the
    /// already projected children and returns the projected node.
    pub fn fold<U, F>(&self, f: &mut F) -> Vec<U>
    where
        F: FnMut(&T, Vec<U>) -> U,
    {
        self.roots
            .iter()
            .filter_map(|&root| self.fold_node(root, f))
            .collect()
    }

    fn fold_node<U, F>(&self, idx: Index, f: &mut F) -> Option<U>
    where
        F: FnMut(&T, Vec<U>) -> U,
    {
        let node = self.get_node(idx)?;
        let children = node
            .children
            .iter()
            .filter_map(|&child| self.fold_node(child, f))
            .collect();
        Some(f(&node.data, children))
    }
}

/// Pre-order iterator over arena nodes.
struct ForestIterator<'a, T: HierarchyNode> {
    forest: &'a Forest<T>,
    stack: Vec<Index>,
}

impl<'a, T: HierarchyNode> Iterator for ForestIterator<'a, T> {
    type Item = (Index, &'a ForestNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev().copied());
                return Some((current_idx, node));
            }
        }
        None
    }
}
